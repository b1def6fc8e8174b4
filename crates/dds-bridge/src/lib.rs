// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # DDS Bridge - typed entity handles over a native DDS engine
//!
//! Ownership and dispatch plumbing between a native, reference-counted
//! DDS engine and application-supplied listener callbacks that have a
//! life of their own: the classic two-resource-manager problem of a
//! language binding, solved once, in one place.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dds_bridge::{Bridge, Dispatched, QoS, ReaderListener, Result, StatusMask};
//! use dds_bridge::inproc::InprocEngine;
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl ReaderListener for Printer {
//!     fn on_data_available(&self, reader: &dds_bridge::DataReader) -> Dispatched {
//!         println!("data on {}", reader.topic_name());
//!         Dispatched::Handled
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let bridge = Bridge::new(Arc::new(InprocEngine::new()));
//!     let participant = bridge.create_participant("my_app", &QoS::default())?;
//!     let topic = participant.create_topic("sensors/temperature", "Temperature", &QoS::default())?;
//!     let subscriber = participant.create_subscriber(&QoS::default())?;
//!     let reader = subscriber.create_reader(&topic, &QoS::reliable())?;
//!     reader.set_listener(Arc::new(Printer), StatusMask::DATA_AVAILABLE)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------------+
//! |                        Application Layer                           |
//! |  Participant -> Publisher/Subscriber -> DataWriter/DataReader      |
//! |            set_listener(Arc<dyn ReaderListener>, mask)             |
//! +--------------------------------------------------------------------+
//! |                         Bridge Layer                               |
//! |  EntityHandle | ListenerRegistry (0-or-1 strong ref) | Lifecycle   |
//! |  Trampoline: weak refs only, interpreter-lock bracket, no unwind   |
//! +--------------------------------------------------------------------+
//! |                       Native Engine (trait)                        |
//! |  create_* factories | set_listener slot | per-entity native lock   |
//! +--------------------------------------------------------------------+
//! ```
//!
//! ## Ownership protocol
//!
//! - The listener registry holds exactly zero or one strong reference per
//!   entity to the registered callback; the engine-facing trampoline
//!   holds only weak references.
//! - Binding takes the strong reference *before* the native registration
//!   call; a failed call leaves the previous listener fully in place.
//! - Teardown is unregister-before-unreference: the registration is
//!   cleared, the callback reference released, and only then are native
//!   resources closed.
//! - Lock order is native entity lock OUTSIDE, interpreter lock INSIDE,
//!   everywhere.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Bridge`] | Factory tying an engine, interpreter lock, and config together |
//! | [`Participant`] | Entry point to a domain, factory for all entities |
//! | [`DataReader`] / [`DataWriter`] / [`Topic`] | Typed entity handles with listener support |
//! | [`EntityHandle`] | Untyped handle; typed views recover from it by kind |
//! | [`ReaderListener`] / [`WriterListener`] / [`TopicListener`] | Callback traits with `Unhandled` defaults |
//! | [`StatusMask`] | Which statuses a listener subscribes to |
//!
//! ## See Also
//!
//! - [DDS Specification](https://www.omg.org/spec/DDS/1.4/)

/// Bridge entry point (engine + interpreter lock + configuration).
pub mod bridge;
/// Runtime configuration (environment-driven tunables).
pub mod config;
/// Typed entity handles (Participant, Publisher, Subscriber, Topic,
/// DataReader, DataWriter) and shared handle machinery.
pub mod entity;
/// In-process reference engine (no network, event injection for tests).
pub mod inproc;
/// Interpreter lock (callback serialization with holder tracking).
pub mod interp;
/// Listener callback traits and dispatch policies.
pub mod listener;
/// Native engine boundary traits.
pub mod native;
/// `QoS` (Quality of Service) policies for DDS entities.
pub mod qos;
/// Status masks, status payloads, and entity events.
pub mod status;

/// Lifecycle controller (teardown ordering).
mod lifecycle;
/// Per-entity listener registry (the single strong reference).
mod registry;
/// Engine-facing dispatch trampolines.
mod trampoline;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use entity::{
    DataReader, DataWriter, Entity, EntityHandle, Participant, Publisher, Scoped, Subscriber,
    Topic,
};
pub use interp::{InterpreterGuard, InterpreterLock};
pub use listener::{DispatchPolicy, Dispatched, ReaderListener, TopicListener, WriterListener};
pub use native::{
    EntityKind, InstanceHandle, NativeEngine, NativeEntity, NativeListener, WaitOutcome,
};
pub use qos::{Durability, History, QoS, Reliability};
pub use status::{
    DeadlineMissedStatus, EntityEvent, IncompatibleQosStatus, InconsistentTopicStatus,
    LivelinessChangedStatus, LivelinessLostStatus, PublicationMatchedStatus,
    SampleLostStatus, SampleRejectedReason, SampleRejectedStatus, StatusMask,
    SubscriptionMatchedStatus,
};

/// Errors surfaced by the bridge API.
#[derive(Debug)]
pub enum Error {
    /// An untyped handle references an entity of a different kind than
    /// the requested typed view.
    InvalidDowncast {
        /// Kind the typed view requires.
        expected: EntityKind,
        /// Kind the handle actually references.
        actual: EntityKind,
    },
    /// The entity is not in a state that permits the operation (closed,
    /// missing registry, unmet dependency).
    PreconditionNotMet(String),
    /// The operation is never valid for this entity or engine.
    IllegalOperation(String),
    /// The native engine reported a failure the bridge cannot classify.
    Native(String),
    /// Strict dispatch hit a callback the listener does not override.
    NotImplemented(&'static str),
    /// A listener callback panicked; the panic was contained at the
    /// dispatch boundary.
    CallbackPanicked {
        /// Callback that panicked.
        callback: &'static str,
        /// Extracted panic payload, if it was a string.
        message: String,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidDowncast { expected, actual } => {
                write!(f, "Invalid downcast: expected a {}, handle is a {}", expected, actual)
            }
            Error::PreconditionNotMet(msg) => write!(f, "Precondition not met: {}", msg),
            Error::IllegalOperation(msg) => write!(f, "Illegal operation: {}", msg),
            Error::Native(msg) => write!(f, "Native engine error: {}", msg),
            Error::NotImplemented(callback) => {
                write!(f, "Listener does not implement {}", callback)
            }
            Error::CallbackPanicked { callback, message } => {
                write!(f, "Listener callback {} panicked: {}", callback, message)
            }
        }
    }
}

impl std::error::Error for Error {}

/// Convenient alias for API results using the public `Error` type.
pub type Result<T> = core::result::Result<T, Error>;

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidDowncast {
            expected: EntityKind::Reader,
            actual: EntityKind::Topic,
        };
        assert_eq!(
            err.to_string(),
            "Invalid downcast: expected a reader, handle is a topic"
        );
        let err = Error::NotImplemented("on_data_available");
        assert_eq!(err.to_string(), "Listener does not implement on_data_available");
    }

    #[test]
    fn test_version_not_empty() {
        assert!(!VERSION.is_empty());
    }
}
