// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Listener traits - the callback surface exposed to script-side code.
//!
//! One trait per listener-bearing entity kind, one overridable method per
//! event. Every method has a provided default returning
//! [`Dispatched::Unhandled`]; implementations override the events they
//! care about and return [`Dispatched::Handled`].
//!
//! Whether an unhandled event is a silent no-op or a
//! [`NotImplemented`](crate::Error::NotImplemented) failure is decided by
//! the [`DispatchPolicy`] the listener was registered with - two trampoline
//! variants layered on the same trait.
//!
//! # Thread Safety
//!
//! Callbacks are invoked from native engine threads, under the interpreter
//! lock. They must be `Send + Sync` and should not block.
//!
//! # Ownership
//!
//! While registered, the listener registry holds exactly one strong
//! reference to the callback object. A listener that stores an owning
//! handle to its *own* entity forms a reference cycle; use the handle
//! passed to each callback instead.
//!
//! # Example
//!
//! ```ignore
//! use dds_bridge::{DataReader, Dispatched, ReaderListener, StatusMask};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl ReaderListener for Printer {
//!     fn on_data_available(&self, reader: &DataReader) -> Dispatched {
//!         println!("data on {}", reader.topic_name());
//!         Dispatched::Handled
//!     }
//! }
//!
//! reader.set_listener(Arc::new(Printer), StatusMask::DATA_AVAILABLE)?;
//! ```

use crate::entity::{DataReader, DataWriter, Topic};
use crate::status::{
    DeadlineMissedStatus, IncompatibleQosStatus, InconsistentTopicStatus, LivelinessChangedStatus,
    LivelinessLostStatus, PublicationMatchedStatus, SampleLostStatus, SampleRejectedStatus,
    SubscriptionMatchedStatus,
};

/// Result of one virtual dispatch into a listener method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// The implementation handled the event.
    Handled,
    /// The implementation did not override this event (default body).
    Unhandled,
}

/// Trampoline variant selected at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Unhandled events are silent no-ops (convenience base class).
    Lenient,
    /// Every masked event is contractually mandatory; an unhandled event
    /// is reported to the engine as [`crate::Error::NotImplemented`].
    Strict,
}

/// Listener for DataReader events.
///
/// Override the events you care about and return [`Dispatched::Handled`];
/// leave the rest on their defaults.
pub trait ReaderListener: Send + Sync {
    /// Called when new data is available to read.
    ///
    /// The most commonly used callback. The `reader` handle is valid only
    /// for the duration of the call unless widened/cloned out.
    fn on_data_available(&self, reader: &DataReader) -> Dispatched {
        let _ = reader;
        Dispatched::Unhandled
    }

    /// Called when the reader matches or unmatches with a writer.
    fn on_subscription_matched(
        &self,
        reader: &DataReader,
        status: SubscriptionMatchedStatus,
    ) -> Dispatched {
        let _ = (reader, status);
        Dispatched::Unhandled
    }

    /// Called when liveliness of a matched writer changes.
    fn on_liveliness_changed(
        &self,
        reader: &DataReader,
        status: LivelinessChangedStatus,
    ) -> Dispatched {
        let _ = (reader, status);
        Dispatched::Unhandled
    }

    /// Called when samples are lost (gap in sequence numbers).
    fn on_sample_lost(&self, reader: &DataReader, status: SampleLostStatus) -> Dispatched {
        let _ = (reader, status);
        Dispatched::Unhandled
    }

    /// Called when samples are rejected due to resource limits.
    fn on_sample_rejected(&self, reader: &DataReader, status: SampleRejectedStatus) -> Dispatched {
        let _ = (reader, status);
        Dispatched::Unhandled
    }

    /// Called when the requested deadline is missed.
    fn on_requested_deadline_missed(
        &self,
        reader: &DataReader,
        status: DeadlineMissedStatus,
    ) -> Dispatched {
        let _ = (reader, status);
        Dispatched::Unhandled
    }

    /// Called when QoS is incompatible with a matched writer.
    fn on_requested_incompatible_qos(
        &self,
        reader: &DataReader,
        status: IncompatibleQosStatus,
    ) -> Dispatched {
        let _ = (reader, status);
        Dispatched::Unhandled
    }
}

/// Listener for DataWriter events.
pub trait WriterListener: Send + Sync {
    /// Called when the writer matches or unmatches with a reader.
    fn on_publication_matched(
        &self,
        writer: &DataWriter,
        status: PublicationMatchedStatus,
    ) -> Dispatched {
        let _ = (writer, status);
        Dispatched::Unhandled
    }

    /// Called when an offered deadline is missed.
    fn on_offered_deadline_missed(
        &self,
        writer: &DataWriter,
        status: DeadlineMissedStatus,
    ) -> Dispatched {
        let _ = (writer, status);
        Dispatched::Unhandled
    }

    /// Called when QoS is incompatible with a matched reader.
    fn on_offered_incompatible_qos(
        &self,
        writer: &DataWriter,
        status: IncompatibleQosStatus,
    ) -> Dispatched {
        let _ = (writer, status);
        Dispatched::Unhandled
    }

    /// Called when liveliness is lost (MANUAL_BY_* only).
    fn on_liveliness_lost(&self, writer: &DataWriter, status: LivelinessLostStatus) -> Dispatched {
        let _ = (writer, status);
        Dispatched::Unhandled
    }
}

/// Listener for Topic events.
pub trait TopicListener: Send + Sync {
    /// Called when a remote topic with the same name but a different type
    /// is discovered.
    fn on_inconsistent_topic(&self, topic: &Topic, status: InconsistentTopicStatus) -> Dispatched {
        let _ = (topic, status);
        Dispatched::Unhandled
    }
}
