// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Grouping entity for readers.

use crate::entity::{DataReader, Entity, EntityHandle, Topic};
use crate::listener::ReaderListener;
use crate::native::EntityKind;
use crate::qos::QoS;
use crate::status::StatusMask;
use crate::{Error, Result};
use std::sync::Arc;

/// Factory and group for [`DataReader`]s.
#[derive(Clone)]
pub struct Subscriber {
    entity: EntityHandle,
}

impl Subscriber {
    /// Recover a typed subscriber from an untyped handle.
    pub fn from_entity(entity: &EntityHandle) -> Result<Self> {
        Self::from_parts(entity.clone())
    }

    pub(crate) fn from_parts(entity: EntityHandle) -> Result<Self> {
        let actual = entity.native.kind();
        if actual != EntityKind::Subscriber {
            return Err(Error::InvalidDowncast {
                expected: EntityKind::Subscriber,
                actual,
            });
        }
        Ok(Self { entity })
    }

    /// The participant this subscriber was created under.
    #[must_use]
    pub fn participant(&self) -> Option<crate::entity::Participant> {
        self.entity
            .parent()
            .and_then(|p| crate::entity::Participant::from_entity(p).ok())
    }

    /// Create a reader bound to `topic`.
    pub fn create_reader(&self, topic: &Topic, qos: &QoS) -> Result<DataReader> {
        let native = self.entity.ctx.engine.create_reader(
            &self.entity.native,
            &topic.entity().native,
            qos,
        )?;
        DataReader::from_parts(self.entity.child(native))
    }

    /// Create a reader with a listener already registered. If registration
    /// fails the reader is closed before the error propagates.
    pub fn create_reader_with_listener(
        &self,
        topic: &Topic,
        qos: &QoS,
        listener: Arc<dyn ReaderListener>,
        mask: StatusMask,
    ) -> Result<DataReader> {
        let reader = self.create_reader(topic, qos)?;
        if let Err(e) = reader.set_listener(listener, mask) {
            let _ = reader.close();
            return Err(e);
        }
        Ok(reader)
    }
}

impl Entity for Subscriber {
    fn entity(&self) -> &EntityHandle {
        &self.entity
    }
}

impl PartialEq for Subscriber {
    fn eq(&self, other: &Self) -> bool {
        self.entity.same_entity(&other.entity)
    }
}

impl Eq for Subscriber {}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("instance", &self.entity.native.instance_handle())
            .finish()
    }
}
