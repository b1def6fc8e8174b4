// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! QoS value objects.
//!
//! The bridge treats QoS as a plain value: getters deep-copy out of the
//! native entity and setters deep-copy in. Native QoS storage is never
//! aliased across the interpreter boundary, so neither side can observe
//! the other mutating a shared buffer, and neither lifetime constrains the
//! other.
//!
//! QoS *enforcement* (reliability protocol, durability caches, deadline
//! monitoring) lives in the wrapped native engine; only the value model is
//! here.

use std::time::Duration;

/// Reliability QoS policy kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reliability {
    /// Samples may be dropped (UDP semantics).
    #[default]
    BestEffort,
    /// Samples are retransmitted until acknowledged.
    Reliable,
}

/// Durability QoS policy kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Durability {
    /// No samples kept for late joiners.
    #[default]
    Volatile,
    /// Writer keeps history for late-joining readers.
    TransientLocal,
}

/// History QoS policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum History {
    /// Keep only the most recent `depth` samples per instance.
    KeepLast(u32),
    /// Keep every sample until taken.
    KeepAll,
}

impl Default for History {
    fn default() -> Self {
        History::KeepLast(1)
    }
}

/// Quality of Service policies for a bridged entity.
///
/// # Example
///
/// ```
/// use dds_bridge::QoS;
///
/// let qos = QoS::reliable().transient_local().keep_last(10);
/// assert_eq!(qos, qos.clone());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QoS {
    /// Reliability policy.
    pub reliability: Reliability,
    /// Durability policy.
    pub durability: Durability,
    /// History policy.
    pub history: History,
    /// Deadline period, if a deadline is requested/offered.
    pub deadline: Option<Duration>,
    /// Partition names (empty = default partition).
    pub partition: Vec<String>,
}

impl QoS {
    /// Reliable delivery profile.
    #[must_use]
    pub fn reliable() -> Self {
        Self {
            reliability: Reliability::Reliable,
            ..Self::default()
        }
    }

    /// Best-effort delivery profile (the default).
    #[must_use]
    pub fn best_effort() -> Self {
        Self::default()
    }

    /// Keep history for late-joining readers.
    #[must_use]
    pub fn transient_local(mut self) -> Self {
        self.durability = Durability::TransientLocal;
        self
    }

    /// Keep only the last `depth` samples per instance.
    #[must_use]
    pub fn keep_last(mut self, depth: u32) -> Self {
        self.history = History::KeepLast(depth);
        self
    }

    /// Keep every sample until taken.
    #[must_use]
    pub fn keep_all(mut self) -> Self {
        self.history = History::KeepAll;
        self
    }

    /// Request/offer a deadline period.
    #[must_use]
    pub fn deadline(mut self, period: Duration) -> Self {
        self.deadline = Some(period);
        self
    }

    /// Set a single partition name.
    #[must_use]
    pub fn partition_single(mut self, name: &str) -> Self {
        self.partition = vec![name.to_string()];
        self
    }
}
