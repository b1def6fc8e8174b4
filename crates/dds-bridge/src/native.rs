// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Native engine boundary contracts.
//!
//! The protocol engine (discovery, RTPS, QoS enforcement, reliability) is
//! an external collaborator consumed through these traits. The bridge only
//! requires the small capability surface below; everything else the engine
//! does is opaque to this layer.
//!
//! [`crate::inproc`] provides an in-process reference implementation used
//! by the tests and by intra-process deployments.

use crate::qos::QoS;
use crate::status::{EntityEvent, StatusMask};
use crate::Result;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

/// Kind of a native entity - a closed tag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Entry point to a domain, factory for all other entities.
    Participant,
    /// Grouping entity for DataWriters.
    Publisher,
    /// Grouping entity for DataReaders.
    Subscriber,
    /// Named, typed data channel.
    Topic,
    /// Receiving endpoint.
    Reader,
    /// Sending endpoint.
    Writer,
}

impl EntityKind {
    /// True for the kinds that carry a listener registry.
    #[must_use]
    pub const fn supports_listener(self) -> bool {
        matches!(self, EntityKind::Topic | EntityKind::Reader | EntityKind::Writer)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Participant => "participant",
            EntityKind::Publisher => "publisher",
            EntityKind::Subscriber => "subscriber",
            EntityKind::Topic => "topic",
            EntityKind::Reader => "reader",
            EntityKind::Writer => "writer",
        };
        f.write_str(name)
    }
}

/// Opaque identity of a native entity within its engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle(u64);

impl InstanceHandle {
    /// Wrap a raw engine-assigned identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw engine-assigned identifier.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for InstanceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Outcome of a blocking wait. Timeout is a status, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The awaited condition was met within the timeout.
    Completed,
    /// The timeout elapsed first.
    TimedOut,
}

/// The per-event native virtual dispatch point.
///
/// The engine invokes this from its own threads, holding the entity's
/// [`native_lock`](NativeEntity::native_lock). Implementations (the
/// dispatch trampolines in this crate) must never unwind across this
/// boundary: callback failures are reported via the returned `Err`, which
/// the engine logs or converts to its own failure code.
pub trait NativeListener: Send + Sync {
    /// Deliver one event for `entity`.
    fn on_event(&self, entity: &Arc<dyn NativeEntity>, event: &EntityEvent) -> Result<()>;
}

/// Capability surface of one native, reference-counted entity.
///
/// Shared ownership is expressed as `Arc<dyn NativeEntity>`; the use count
/// seen by the lifecycle controller is the `Arc` strong count.
pub trait NativeEntity: Send + Sync {
    /// Concrete kind of this entity.
    fn kind(&self) -> EntityKind;

    /// Engine-assigned identity.
    fn instance_handle(&self) -> InstanceHandle;

    /// Topic name for readers/writers/topics, `None` for grouping entities.
    fn topic_name(&self) -> Option<&str>;

    /// Type name for readers/writers/topics, `None` for grouping entities.
    fn type_name(&self) -> Option<&str>;

    /// Enable the entity (idempotent).
    fn enable(&self) -> Result<()>;

    /// Release native resources (idempotent at the engine level).
    fn close(&self) -> Result<()>;

    /// True once [`close`](NativeEntity::close) has completed.
    fn closed(&self) -> bool;

    /// Deep copy of the entity's QoS.
    fn qos(&self) -> Result<QoS>;

    /// Replace the entity's QoS (deep copy in).
    fn set_qos(&self, qos: &QoS) -> Result<()>;

    /// Install or clear the native listener registration.
    ///
    /// The engine stores `listener` in its registration slot and consults
    /// `mask` before each dispatch. The registration holds no strong
    /// reference to the script-side callback; keeping that object alive is
    /// the listener registry's job.
    fn set_listener(
        &self,
        listener: Option<Arc<dyn NativeListener>>,
        mask: StatusMask,
    ) -> Result<()>;

    /// True if a native listener registration is present.
    fn has_listener(&self) -> bool;

    /// Statuses that have fired since creation (diagnostic snapshot).
    fn active_status(&self) -> StatusMask;

    /// The entity's own lock.
    ///
    /// Serializes the whole bind/clear sequence against in-flight event
    /// delivery. Global lock order: this lock OUTSIDE, interpreter lock
    /// INSIDE - never the reverse.
    fn native_lock(&self) -> &Mutex<()>;

    /// Block until every written sample is acknowledged, or `timeout`.
    /// Writers only.
    fn wait_for_acknowledgments(&self, timeout: Duration) -> Result<WaitOutcome>;

    /// Block until historical data has been received, or `timeout`.
    /// Readers only.
    fn wait_for_historical_data(&self, timeout: Duration) -> Result<WaitOutcome>;

    /// Downcast support for engine-specific extensions.
    fn as_any(&self) -> &dyn Any;
}

/// Entity factories consumed from the native engine.
pub trait NativeEngine: Send + Sync {
    /// Create a domain participant.
    fn create_participant(&self, name: &str, qos: &QoS) -> Result<Arc<dyn NativeEntity>>;

    /// Create a publisher under `participant`.
    fn create_publisher(
        &self,
        participant: &Arc<dyn NativeEntity>,
        qos: &QoS,
    ) -> Result<Arc<dyn NativeEntity>>;

    /// Create a subscriber under `participant`.
    fn create_subscriber(
        &self,
        participant: &Arc<dyn NativeEntity>,
        qos: &QoS,
    ) -> Result<Arc<dyn NativeEntity>>;

    /// Create a topic under `participant`.
    fn create_topic(
        &self,
        participant: &Arc<dyn NativeEntity>,
        topic_name: &str,
        type_name: &str,
        qos: &QoS,
    ) -> Result<Arc<dyn NativeEntity>>;

    /// Create a reader under `subscriber` bound to `topic`.
    fn create_reader(
        &self,
        subscriber: &Arc<dyn NativeEntity>,
        topic: &Arc<dyn NativeEntity>,
        qos: &QoS,
    ) -> Result<Arc<dyn NativeEntity>>;

    /// Create a writer under `publisher` bound to `topic`.
    fn create_writer(
        &self,
        publisher: &Arc<dyn NativeEntity>,
        topic: &Arc<dyn NativeEntity>,
        qos: &QoS,
    ) -> Result<Arc<dyn NativeEntity>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_support_by_kind() {
        assert!(EntityKind::Reader.supports_listener());
        assert!(EntityKind::Writer.supports_listener());
        assert!(EntityKind::Topic.supports_listener());
        assert!(!EntityKind::Participant.supports_listener());
        assert!(!EntityKind::Publisher.supports_listener());
        assert!(!EntityKind::Subscriber.supports_listener());
    }

    #[test]
    fn test_instance_handle_display() {
        let handle = InstanceHandle::new(0x2a);
        assert_eq!(handle.raw(), 42);
        assert_eq!(handle.to_string(), "0x2a");
    }
}
