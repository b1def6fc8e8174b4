// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Grouping entity for writers.

use crate::entity::{DataWriter, Entity, EntityHandle, Topic};
use crate::listener::WriterListener;
use crate::native::EntityKind;
use crate::qos::QoS;
use crate::status::StatusMask;
use crate::{Error, Result};
use std::sync::Arc;

/// Factory and group for [`DataWriter`]s.
#[derive(Clone)]
pub struct Publisher {
    entity: EntityHandle,
}

impl Publisher {
    /// Recover a typed publisher from an untyped handle.
    pub fn from_entity(entity: &EntityHandle) -> Result<Self> {
        Self::from_parts(entity.clone())
    }

    pub(crate) fn from_parts(entity: EntityHandle) -> Result<Self> {
        let actual = entity.native.kind();
        if actual != EntityKind::Publisher {
            return Err(Error::InvalidDowncast {
                expected: EntityKind::Publisher,
                actual,
            });
        }
        Ok(Self { entity })
    }

    /// The participant this publisher was created under.
    #[must_use]
    pub fn participant(&self) -> Option<crate::entity::Participant> {
        self.entity
            .parent()
            .and_then(|p| crate::entity::Participant::from_entity(p).ok())
    }

    /// Create a writer bound to `topic`.
    pub fn create_writer(&self, topic: &Topic, qos: &QoS) -> Result<DataWriter> {
        let native = self.entity.ctx.engine.create_writer(
            &self.entity.native,
            &topic.entity().native,
            qos,
        )?;
        DataWriter::from_parts(self.entity.child(native))
    }

    /// Create a writer with a listener already registered. If registration
    /// fails the writer is closed before the error propagates.
    pub fn create_writer_with_listener(
        &self,
        topic: &Topic,
        qos: &QoS,
        listener: Arc<dyn WriterListener>,
        mask: StatusMask,
    ) -> Result<DataWriter> {
        let writer = self.create_writer(topic, qos)?;
        if let Err(e) = writer.set_listener(listener, mask) {
            let _ = writer.close();
            return Err(e);
        }
        Ok(writer)
    }
}

impl Entity for Publisher {
    fn entity(&self) -> &EntityHandle {
        &self.entity
    }
}

impl PartialEq for Publisher {
    fn eq(&self, other: &Self) -> bool {
        self.entity.same_entity(&other.entity)
    }
}

impl Eq for Publisher {}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("instance", &self.entity.native.instance_handle())
            .finish()
    }
}
