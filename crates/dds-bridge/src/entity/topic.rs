// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed handle for a named, typed data channel.

use crate::entity::{Entity, EntityHandle, ListenerSlot};
use crate::listener::{DispatchPolicy, TopicListener};
use crate::native::EntityKind;
use crate::registry::ListenerRegistry;
use crate::status::StatusMask;
use crate::{Error, Result};
use std::sync::Arc;

/// Named, typed data channel under a participant.
#[derive(Clone)]
pub struct Topic {
    entity: EntityHandle,
    topic_name: String,
    type_name: String,
}

impl Topic {
    /// Recover a typed topic from an untyped handle.
    pub fn from_entity(entity: &EntityHandle) -> Result<Self> {
        Self::from_parts(entity.clone())
    }

    pub(crate) fn from_parts(entity: EntityHandle) -> Result<Self> {
        let actual = entity.native.kind();
        if actual != EntityKind::Topic {
            return Err(Error::InvalidDowncast {
                expected: EntityKind::Topic,
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

    /// The topic's name within its domain.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.topic_name
    }

    /// Registered type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The participant this topic was created under.
    #[must_use]
    pub fn participant(&self) -> Option<crate::entity::Participant> {
        self.entity
            .parent()
            .and_then(|p| crate::entity::Participant::from_entity(p).ok())
    }

    /// Register `listener` for the statuses in `mask`, replacing any
    /// previous listener.
    pub fn set_listener(&self, listener: Arc<dyn TopicListener>, mask: StatusMask) -> Result<()> {
        self.bind(Some(listener), mask, DispatchPolicy::Lenient)
    }

    /// Strict variant: unimplemented callbacks are reported as
    /// [`Error::NotImplemented`] instead of being skipped.
    pub fn set_strict_listener(
        &self,
        listener: Arc<dyn TopicListener>,
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
    pub fn listener(&self) -> Option<Arc<dyn TopicListener>> {
        self.registry().ok().and_then(|r| r.current())
    }

    /// The mask the current listener was registered with.
    #[must_use]
    pub fn listener_mask(&self) -> Option<StatusMask> {
        self.registry().ok().and_then(|r| r.mask())
    }

    fn bind(
        &self,
        listener: Option<Arc<dyn TopicListener>>,
        mask: StatusMask,
        policy: DispatchPolicy,
    ) -> Result<()> {
        if self.entity.native.closed() {
            return Err(Error::PreconditionNotMet(format!(
                "topic {} is closed",
                self.entity.native.instance_handle()
            )));
        }
        self.registry()?
            .bind(&self.entity.native, listener, mask, policy, &self.entity.ctx)
    }

    fn registry(&self) -> Result<&Arc<ListenerRegistry<dyn TopicListener>>> {
        match &self.entity.slot {
            ListenerSlot::Topic(r) => Ok(r),
            _ => Err(Error::PreconditionNotMet(
                "topic handle carries no listener registry".to_string(),
            )),
        }
    }
}

impl Entity for Topic {
    fn entity(&self) -> &EntityHandle {
        &self.entity
    }
}

impl PartialEq for Topic {
    fn eq(&self, other: &Self) -> bool {
        self.entity.same_entity(&other.entity)
    }
}

impl Eq for Topic {}

impl std::fmt::Debug for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topic")
            .field("instance", &self.entity.native.instance_handle())
            .field("name", &self.topic_name)
            .field("type", &self.type_name)
            .finish()
    }
}
