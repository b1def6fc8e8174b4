// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed handle for a receiving endpoint.

use crate::entity::{Entity, EntityHandle, ListenerSlot};
use crate::listener::{DispatchPolicy, ReaderListener};
use crate::native::{EntityKind, WaitOutcome};
use crate::registry::ListenerRegistry;
use crate::status::StatusMask;
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

/// Receiving endpoint for one topic.
///
/// Clones share the entity and its listener registry. The topic and type
/// names are cached at wrap time so they survive a round trip through the
/// untyped [`EntityHandle`] and back.
#[derive(Clone)]
pub struct DataReader {
    entity: EntityHandle,
    topic_name: String,
    type_name: String,
}

impl DataReader {
    /// Recover a typed reader from an untyped handle.
    ///
    /// Fails with [`Error::InvalidDowncast`] if the handle references an
    /// entity of a different kind.
    pub fn from_entity(entity: &EntityHandle) -> Result<Self> {
        Self::from_parts(entity.clone())
    }

    pub(crate) fn from_parts(entity: EntityHandle) -> Result<Self> {
        let actual = entity.native.kind();
        if actual != EntityKind::Reader {
            return Err(Error::InvalidDowncast {
                expected: EntityKind::Reader,
                actual,
            });
        }
        Ok(Self::wrap(entity))
    }

    pub(crate) fn wrap(entity: EntityHandle) -> Self {
        let topic_name = entity.native.topic_name().unwrap_or_default().to_string();
        let type_name = entity.native.type_name().unwrap_or_default().to_string();
        Self {
            entity,
            topic_name,
            type_name,
        }
    }

    /// Name of the topic this reader is bound to.
    #[must_use]
    pub fn topic_name(&self) -> &str {
        &self.topic_name
    }

    /// Registered type name of the topic.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The subscriber this reader was created under, if it came from
    /// [`Subscriber::create_reader`](crate::entity::Subscriber::create_reader).
    #[must_use]
    pub fn subscriber(&self) -> Option<crate::entity::Subscriber> {
        self.entity
            .parent()
            .and_then(|p| crate::entity::Subscriber::from_entity(p).ok())
    }

    /// Register `listener` for the statuses in `mask`, replacing any
    /// previous listener. Unimplemented callbacks are silently skipped.
    pub fn set_listener(&self, listener: Arc<dyn ReaderListener>, mask: StatusMask) -> Result<()> {
        self.bind(Some(listener), mask, DispatchPolicy::Lenient)
    }

    /// Like [`set_listener`](DataReader::set_listener), but an event whose
    /// callback the listener does not override is reported as
    /// [`Error::NotImplemented`] to the engine.
    pub fn set_strict_listener(
        &self,
        listener: Arc<dyn ReaderListener>,
        mask: StatusMask,
    ) -> Result<()> {
        self.bind(Some(listener), mask, DispatchPolicy::Strict)
    }

    /// Unregister the current listener, if any, and release its reference.
    pub fn clear_listener(&self) -> Result<()> {
        self.bind(None, StatusMask::NONE, DispatchPolicy::Lenient)
    }

    /// The currently registered listener.
    #[must_use]
    pub fn listener(&self) -> Option<Arc<dyn ReaderListener>> {
        self.registry().ok().and_then(|r| r.current())
    }

    /// The mask the current listener was registered with.
    #[must_use]
    pub fn listener_mask(&self) -> Option<StatusMask> {
        self.registry().ok().and_then(|r| r.mask())
    }

    /// Block until historical data has been received, or `timeout`.
    /// A timeout is an outcome, not an error.
    ///
    /// Must not be called while holding the interpreter lock: a callback
    /// blocking here would stall every other callback in the process.
    pub fn wait_for_historical_data(&self, timeout: Duration) -> Result<WaitOutcome> {
        debug_assert!(
            !self.entity.ctx.interp.held_by_current_thread(),
            "blocking wait while holding the interpreter lock"
        );
        self.entity.native.wait_for_historical_data(timeout)
    }

    fn bind(
        &self,
        listener: Option<Arc<dyn ReaderListener>>,
        mask: StatusMask,
        policy: DispatchPolicy,
    ) -> Result<()> {
        if self.entity.native.closed() {
            return Err(Error::PreconditionNotMet(format!(
                "reader {} is closed",
                self.entity.native.instance_handle()
            )));
        }
        self.registry()?
            .bind(&self.entity.native, listener, mask, policy, &self.entity.ctx)
    }

    fn registry(&self) -> Result<&Arc<ListenerRegistry<dyn ReaderListener>>> {
        match &self.entity.slot {
            ListenerSlot::Reader(r) => Ok(r),
            _ => Err(Error::PreconditionNotMet(
                "reader handle carries no listener registry".to_string(),
            )),
        }
    }
}

impl Entity for DataReader {
    fn entity(&self) -> &EntityHandle {
        &self.entity
    }
}

impl PartialEq for DataReader {
    fn eq(&self, other: &Self) -> bool {
        self.entity.same_entity(&other.entity)
    }
}

impl Eq for DataReader {}

impl std::fmt::Debug for DataReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataReader")
            .field("instance", &self.entity.native.instance_handle())
            .field("topic", &self.topic_name)
            .field("type", &self.type_name)
            .finish()
    }
}
