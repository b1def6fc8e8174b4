// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed handle for a sending endpoint.

use crate::entity::{Entity, EntityHandle, ListenerSlot};
use crate::listener::{DispatchPolicy, WriterListener};
use crate::native::{EntityKind, WaitOutcome};
use crate::registry::ListenerRegistry;
use crate::status::StatusMask;
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

/// Sending endpoint for one topic.
#[derive(Clone)]
pub struct DataWriter {
    entity: EntityHandle,
    topic_name: String,
    type_name: String,
}

impl DataWriter {
    /// Recover a typed writer from an untyped handle.
    pub fn from_entity(entity: &EntityHandle) -> Result<Self> {
        Self::from_parts(entity.clone())
    }

    pub(crate) fn from_parts(entity: EntityHandle) -> Result<Self> {
        let actual = entity.native.kind();
        if actual != EntityKind::Writer {
            return Err(Error::InvalidDowncast {
                expected: EntityKind::Writer,
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

    /// Name of the topic this writer is bound to.
    #[must_use]
    pub fn topic_name(&self) -> &str {
        &self.topic_name
    }

    /// Registered type name of the topic.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The publisher this writer was created under, if it came from
    /// [`Publisher::create_writer`](crate::entity::Publisher::create_writer).
    #[must_use]
    pub fn publisher(&self) -> Option<crate::entity::Publisher> {
        self.entity
            .parent()
            .and_then(|p| crate::entity::Publisher::from_entity(p).ok())
    }

    /// Register `listener` for the statuses in `mask`, replacing any
    /// previous listener.
    pub fn set_listener(&self, listener: Arc<dyn WriterListener>, mask: StatusMask) -> Result<()> {
        self.bind(Some(listener), mask, DispatchPolicy::Lenient)
    }

    /// Strict variant: unimplemented callbacks are reported as
    /// [`Error::NotImplemented`] instead of being skipped.
    pub fn set_strict_listener(
        &self,
        listener: Arc<dyn WriterListener>,
        mask: StatusMask,
    ) -> Result<()> {
        self.bind(Some(listener), mask, DispatchPolicy::Strict)
    }

    /// Unregister the current listener, if any.
    pub fn clear_listener(&self) -> Result<()> {
        self.bind(None, StatusMask::NONE, DispatchPolicy::Lenient)
    }

    /// The currently registered listener.
    #[must_use]
    pub fn listener(&self) -> Option<Arc<dyn WriterListener>> {
        self.registry().ok().and_then(|r| r.current())
    }

    /// The mask the current listener was registered with.
    #[must_use]
    pub fn listener_mask(&self) -> Option<StatusMask> {
        self.registry().ok().and_then(|r| r.mask())
    }

    /// Block until every written sample has been acknowledged by matched
    /// readers, or `timeout`. A timeout is an outcome, not an error.
    ///
    /// Must not be called while holding the interpreter lock: a callback
    /// blocking here would stall every other callback in the process.
    pub fn wait_for_acknowledgments(&self, timeout: Duration) -> Result<WaitOutcome> {
        debug_assert!(
            !self.entity.ctx.interp.held_by_current_thread(),
            "blocking wait while holding the interpreter lock"
        );
        self.entity.native.wait_for_acknowledgments(timeout)
    }

    fn bind(
        &self,
        listener: Option<Arc<dyn WriterListener>>,
        mask: StatusMask,
        policy: DispatchPolicy,
    ) -> Result<()> {
        if self.entity.native.closed() {
            return Err(Error::PreconditionNotMet(format!(
                "writer {} is closed",
                self.entity.native.instance_handle()
            )));
        }
        self.registry()?
            .bind(&self.entity.native, listener, mask, policy, &self.entity.ctx)
    }

    fn registry(&self) -> Result<&Arc<ListenerRegistry<dyn WriterListener>>> {
        match &self.entity.slot {
            ListenerSlot::Writer(r) => Ok(r),
            _ => Err(Error::PreconditionNotMet(
                "writer handle carries no listener registry".to_string(),
            )),
        }
    }
}

impl Entity for DataWriter {
    fn entity(&self) -> &EntityHandle {
        &self.entity
    }
}

impl PartialEq for DataWriter {
    fn eq(&self, other: &Self) -> bool {
        self.entity.same_entity(&other.entity)
    }
}

impl Eq for DataWriter {}

impl std::fmt::Debug for DataWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataWriter")
            .field("instance", &self.entity.native.instance_handle())
            .field("topic", &self.topic_name)
            .field("type", &self.type_name)
            .finish()
    }
}
