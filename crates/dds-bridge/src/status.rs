// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Communication status - event masks and status payloads.
//!
//! Per DDS v1.4 section 2.2.4.1, every entity carries a set of
//! communication statuses. The bridge uses [`StatusMask`] to describe which
//! listener callbacks are active and [`EntityEvent`] to carry one fired
//! event (status payload included) from the native engine to the dispatch
//! trampoline.

/// Bit set of communication statuses.
///
/// Serves two roles: the mask a listener is bound with selects which
/// callbacks fire, and an entity's active mask reports which statuses
/// have been raised since creation. Bit positions follow DDS v1.4
/// section 2.2.4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMask(u32);

impl StatusMask {
    /// Empty mask; a listener bound with it receives nothing.
    pub const NONE: StatusMask = StatusMask(0);

    /// Every status bit set.
    pub const ALL: StatusMask = StatusMask(0xFFFF_FFFF);

    /// New samples are ready on a reader (`on_data_available`).
    pub const DATA_AVAILABLE: StatusMask = StatusMask(1 << 0);

    /// A sample was lost before it reached a reader (`on_sample_lost`).
    pub const SAMPLE_LOST: StatusMask = StatusMask(1 << 1);

    /// A reader refused a sample (`on_sample_rejected`).
    pub const SAMPLE_REJECTED: StatusMask = StatusMask(1 << 2);

    /// A matched writer became alive or stopped being alive
    /// (`on_liveliness_changed`).
    pub const LIVELINESS_CHANGED: StatusMask = StatusMask(1 << 3);

    /// A reader's requested deadline elapsed without data
    /// (`on_requested_deadline_missed`).
    pub const REQUESTED_DEADLINE_MISSED: StatusMask = StatusMask(1 << 4);

    /// A discovered writer offers QoS the reader cannot accept
    /// (`on_requested_incompatible_qos`).
    pub const REQUESTED_INCOMPATIBLE_QOS: StatusMask = StatusMask(1 << 5);

    /// A reader gained or lost a matched writer
    /// (`on_subscription_matched`).
    pub const SUBSCRIPTION_MATCHED: StatusMask = StatusMask(1 << 6);

    /// A writer failed to assert its liveliness in time
    /// (`on_liveliness_lost`).
    pub const LIVELINESS_LOST: StatusMask = StatusMask(1 << 7);

    /// A writer missed its offered deadline
    /// (`on_offered_deadline_missed`).
    pub const OFFERED_DEADLINE_MISSED: StatusMask = StatusMask(1 << 8);

    /// A discovered reader requests QoS the writer does not offer
    /// (`on_offered_incompatible_qos`).
    pub const OFFERED_INCOMPATIBLE_QOS: StatusMask = StatusMask(1 << 9);

    /// A writer gained or lost a matched reader
    /// (`on_publication_matched`).
    pub const PUBLICATION_MATCHED: StatusMask = StatusMask(1 << 10);

    /// Two definitions of the same topic disagree
    /// (`on_inconsistent_topic`).
    pub const INCONSISTENT_TOPIC: StatusMask = StatusMask(1 << 11);

    /// Mask from a raw bit pattern.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        StatusMask(bits)
    }

    /// Raw bit pattern.
    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// True if every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(&self, other: StatusMask) -> bool {
        (self.0 & other.0) == other.0
    }

    /// True when the mask is empty.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// Union of the two masks.
    #[must_use]
    pub const fn or(self, other: StatusMask) -> Self {
        StatusMask(self.0 | other.0)
    }

    /// Intersection of the two masks.
    #[must_use]
    pub const fn and(self, other: StatusMask) -> Self {
        StatusMask(self.0 & other.0)
    }
}

impl std::ops::BitOr for StatusMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

impl std::ops::BitAnd for StatusMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        self.and(rhs)
    }
}

/// Status information for subscription matching events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionMatchedStatus {
    /// Total cumulative count of matched publications.
    pub total_count: u32,
    /// Change in total_count since last callback.
    pub total_count_change: i32,
    /// Current number of matched publications.
    pub current_count: u32,
    /// Change in current_count since last callback.
    pub current_count_change: i32,
}

/// Status information for publication matching events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicationMatchedStatus {
    /// Total cumulative count of matched subscriptions.
    pub total_count: u32,
    /// Change in total_count since last callback.
    pub total_count_change: i32,
    /// Current number of matched subscriptions.
    pub current_count: u32,
    /// Change in current_count since last callback.
    pub current_count_change: i32,
}

/// Status information for liveliness changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivelinessChangedStatus {
    /// Number of publications currently asserting liveliness.
    pub alive_count: u32,
    /// Change in alive_count since last callback.
    pub alive_count_change: i32,
    /// Number of publications that have lost liveliness.
    pub not_alive_count: u32,
    /// Change in not_alive_count since last callback.
    pub not_alive_count_change: i32,
}

/// Status information for liveliness lost events (writer side).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivelinessLostStatus {
    /// Total cumulative count of liveliness losses.
    pub total_count: u32,
    /// Change in total_count since last callback.
    pub total_count_change: i32,
}

/// Status information for sample lost events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleLostStatus {
    /// Total cumulative count of lost samples.
    pub total_count: u32,
    /// Change in total_count since last callback.
    pub total_count_change: i32,
}

/// Reason why a sample was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleRejectedReason {
    /// Sample was not rejected.
    #[default]
    NotRejected,
    /// Sample rejected due to resource limits (max_samples).
    ResourceLimit,
    /// Sample rejected due to instance limits (max_instances).
    InstanceLimit,
    /// Sample rejected due to samples-per-instance limit.
    SamplesPerInstanceLimit,
}

/// Status information for sample rejected events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRejectedStatus {
    /// Total cumulative count of rejected samples.
    pub total_count: u32,
    /// Change in total_count since last callback.
    pub total_count_change: i32,
    /// Reason for rejection.
    pub last_reason: SampleRejectedReason,
}

impl Default for SampleRejectedStatus {
    fn default() -> Self {
        Self {
            total_count: 0,
            total_count_change: 0,
            last_reason: SampleRejectedReason::NotRejected,
        }
    }
}

/// Status information for deadline missed events (either side).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeadlineMissedStatus {
    /// Total cumulative count of missed deadlines.
    pub total_count: u32,
    /// Change in total_count since last callback.
    pub total_count_change: i32,
    /// Handle of the instance that missed the deadline.
    pub last_instance_handle: Option<u64>,
}

/// Status information for incompatible QoS events (either side).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncompatibleQosStatus {
    /// Total cumulative count of incompatible QoS offers/requests.
    pub total_count: u32,
    /// Change in total_count since last callback.
    pub total_count_change: i32,
    /// ID of the last incompatible QoS policy.
    pub last_policy_id: u32,
}

/// Status information for inconsistent topic events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InconsistentTopicStatus {
    /// Total cumulative count of inconsistent topic discoveries.
    pub total_count: u32,
    /// Change in total_count since last callback.
    pub total_count_change: i32,
}

/// One fired event, status payload included.
///
/// Emitted by the native engine, consumed by the dispatch trampoline.
/// Events for a single entity are delivered in native emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityEvent {
    /// New data is available to read (DataReader).
    DataAvailable,
    /// The reader matched or unmatched with a writer.
    SubscriptionMatched(SubscriptionMatchedStatus),
    /// Liveliness of a matched writer changed.
    LivelinessChanged(LivelinessChangedStatus),
    /// Samples were lost (gap in sequence numbers).
    SampleLost(SampleLostStatus),
    /// Samples were rejected due to resource limits.
    SampleRejected(SampleRejectedStatus),
    /// The requested deadline was missed (reader side).
    RequestedDeadlineMissed(DeadlineMissedStatus),
    /// QoS is incompatible with a matched writer.
    RequestedIncompatibleQos(IncompatibleQosStatus),
    /// The writer matched or unmatched with a reader.
    PublicationMatched(PublicationMatchedStatus),
    /// An offered deadline was missed (writer side).
    OfferedDeadlineMissed(DeadlineMissedStatus),
    /// QoS is incompatible with a matched reader.
    OfferedIncompatibleQos(IncompatibleQosStatus),
    /// Liveliness was lost (MANUAL_BY_* only).
    LivelinessLost(LivelinessLostStatus),
    /// A remote topic with the same name but a different type was seen.
    InconsistentTopic(InconsistentTopicStatus),
}

impl EntityEvent {
    /// The mask bit corresponding to this event.
    #[must_use]
    pub const fn status_bit(&self) -> StatusMask {
        match self {
            EntityEvent::DataAvailable => StatusMask::DATA_AVAILABLE,
            EntityEvent::SubscriptionMatched(_) => StatusMask::SUBSCRIPTION_MATCHED,
            EntityEvent::LivelinessChanged(_) => StatusMask::LIVELINESS_CHANGED,
            EntityEvent::SampleLost(_) => StatusMask::SAMPLE_LOST,
            EntityEvent::SampleRejected(_) => StatusMask::SAMPLE_REJECTED,
            EntityEvent::RequestedDeadlineMissed(_) => StatusMask::REQUESTED_DEADLINE_MISSED,
            EntityEvent::RequestedIncompatibleQos(_) => StatusMask::REQUESTED_INCOMPATIBLE_QOS,
            EntityEvent::PublicationMatched(_) => StatusMask::PUBLICATION_MATCHED,
            EntityEvent::OfferedDeadlineMissed(_) => StatusMask::OFFERED_DEADLINE_MISSED,
            EntityEvent::OfferedIncompatibleQos(_) => StatusMask::OFFERED_INCOMPATIBLE_QOS,
            EntityEvent::LivelinessLost(_) => StatusMask::LIVELINESS_LOST,
            EntityEvent::InconsistentTopic(_) => StatusMask::INCONSISTENT_TOPIC,
        }
    }

    /// Name of the listener callback this event maps to.
    #[must_use]
    pub const fn callback_name(&self) -> &'static str {
        match self {
            EntityEvent::DataAvailable => "on_data_available",
            EntityEvent::SubscriptionMatched(_) => "on_subscription_matched",
            EntityEvent::LivelinessChanged(_) => "on_liveliness_changed",
            EntityEvent::SampleLost(_) => "on_sample_lost",
            EntityEvent::SampleRejected(_) => "on_sample_rejected",
            EntityEvent::RequestedDeadlineMissed(_) => "on_requested_deadline_missed",
            EntityEvent::RequestedIncompatibleQos(_) => "on_requested_incompatible_qos",
            EntityEvent::PublicationMatched(_) => "on_publication_matched",
            EntityEvent::OfferedDeadlineMissed(_) => "on_offered_deadline_missed",
            EntityEvent::OfferedIncompatibleQos(_) => "on_offered_incompatible_qos",
            EntityEvent::LivelinessLost(_) => "on_liveliness_lost",
            EntityEvent::InconsistentTopic(_) => "on_inconsistent_topic",
        }
    }
}
