// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Domain participant - factory root for one application's entities.

use crate::entity::{Entity, EntityHandle, Publisher, Subscriber, Topic};
use crate::listener::TopicListener;
use crate::native::EntityKind;
use crate::qos::QoS;
use crate::status::StatusMask;
use crate::{Error, Result};
use std::sync::Arc;

/// Entry point to a domain; creates publishers, subscribers, and topics.
///
/// Closing the participant does not cascade to children here; each child
/// handle tears its own entity down when dropped or closed.
#[derive(Clone)]
pub struct Participant {
    entity: EntityHandle,
}

impl Participant {
    /// Recover a typed participant from an untyped handle.
    pub fn from_entity(entity: &EntityHandle) -> Result<Self> {
        Self::from_parts(entity.clone())
    }

    pub(crate) fn from_parts(entity: EntityHandle) -> Result<Self> {
        let actual = entity.native.kind();
        if actual != EntityKind::Participant {
            return Err(Error::InvalidDowncast {
                expected: EntityKind::Participant,
                actual,
            });
        }
        Ok(Self { entity })
    }

    /// Create a publisher under this participant.
    pub fn create_publisher(&self, qos: &QoS) -> Result<Publisher> {
        let native = self
            .entity
            .ctx
            .engine
            .create_publisher(&self.entity.native, qos)?;
        Publisher::from_parts(self.entity.child(native))
    }

    /// Create a subscriber under this participant.
    pub fn create_subscriber(&self, qos: &QoS) -> Result<Subscriber> {
        let native = self
            .entity
            .ctx
            .engine
            .create_subscriber(&self.entity.native, qos)?;
        Subscriber::from_parts(self.entity.child(native))
    }

    /// Create a topic named `name` carrying `type_name` samples.
    pub fn create_topic(&self, name: &str, type_name: &str, qos: &QoS) -> Result<Topic> {
        let native = self
            .entity
            .ctx
            .engine
            .create_topic(&self.entity.native, name, type_name, qos)?;
        Topic::from_parts(self.entity.child(native))
    }

    /// Create a topic with a listener already registered. If registration
    /// fails the topic is closed before the error propagates, so no
    /// half-initialized entity escapes.
    pub fn create_topic_with_listener(
        &self,
        name: &str,
        type_name: &str,
        qos: &QoS,
        listener: Arc<dyn TopicListener>,
        mask: StatusMask,
    ) -> Result<Topic> {
        let topic = self.create_topic(name, type_name, qos)?;
        if let Err(e) = topic.set_listener(listener, mask) {
            let _ = topic.close();
            return Err(e);
        }
        Ok(topic)
    }
}

impl Entity for Participant {
    fn entity(&self) -> &EntityHandle {
        &self.entity
    }
}

impl PartialEq for Participant {
    fn eq(&self, other: &Self) -> bool {
        self.entity.same_entity(&other.entity)
    }
}

impl Eq for Participant {}

impl std::fmt::Debug for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Participant")
            .field("instance", &self.entity.native.instance_handle())
            .finish()
    }
}
