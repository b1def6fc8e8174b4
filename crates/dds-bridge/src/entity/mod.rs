// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed entity handles and shared handle machinery.
//!
//! An [`EntityHandle`] couples shared ownership of one native entity with
//! the entity's listener registry and the bridge context. Handles are
//! cheap to clone; every clone of the same entity shares one registry, so
//! listener state is per-entity, never per-handle.
//!
//! Dropping the last handle of an entity tears the entity down (listener
//! unregistered first, native resources released second). Handles the
//! bridge lends to callbacks are *borrowed*: they reference the same
//! entity but do not participate in teardown accounting, because they die
//! while the engine still holds the entity's lock.
//!
//! Handles created through the factory methods carry a back-reference to
//! their parent (reader to subscriber, subscriber to participant, and so
//! on), so a child keeps its ancestors alive and teardown cascades upward
//! from the last leaf.

mod participant;
mod publisher;
mod reader;
mod subscriber;
mod topic;
mod writer;

pub use participant::Participant;
pub use publisher::Publisher;
pub use reader::DataReader;
pub use subscriber::Subscriber;
pub use topic::Topic;
pub use writer::DataWriter;

use crate::bridge::BridgeCtx;
use crate::lifecycle;
use crate::listener::{ReaderListener, TopicListener, WriterListener};
use crate::native::{EntityKind, InstanceHandle, NativeEntity};
use crate::qos::QoS;
use crate::registry::ListenerRegistry;
use crate::status::StatusMask;
use crate::Result;
use std::ops::Deref;
use std::sync::Arc;

/// Per-entity listener registry, typed by the entity's kind.
#[derive(Clone)]
pub(crate) enum ListenerSlot {
    /// Grouping entities carry no listener.
    Absent,
    Reader(Arc<ListenerRegistry<dyn ReaderListener>>),
    Writer(Arc<ListenerRegistry<dyn WriterListener>>),
    Topic(Arc<ListenerRegistry<dyn TopicListener>>),
}

impl ListenerSlot {
    pub(crate) fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Reader => ListenerSlot::Reader(Arc::new(ListenerRegistry::new())),
            EntityKind::Writer => ListenerSlot::Writer(Arc::new(ListenerRegistry::new())),
            EntityKind::Topic => ListenerSlot::Topic(Arc::new(ListenerRegistry::new())),
            _ => ListenerSlot::Absent,
        }
    }

    pub(crate) fn has_callback(&self) -> bool {
        match self {
            ListenerSlot::Absent => false,
            ListenerSlot::Reader(r) => r.is_bound(),
            ListenerSlot::Writer(r) => r.is_bound(),
            ListenerSlot::Topic(r) => r.is_bound(),
        }
    }

    /// Unregister natively and release the callback reference, if any.
    pub(crate) fn clear(&self, native: &Arc<dyn NativeEntity>) -> Result<()> {
        match self {
            ListenerSlot::Absent => Ok(()),
            ListenerSlot::Reader(r) => r.clear(native),
            ListenerSlot::Writer(r) => r.clear(native),
            ListenerSlot::Topic(r) => r.clear(native),
        }
    }
}

/// Shared, counted reference to one native entity.
///
/// Untyped form of the handle; the typed views ([`DataReader`],
/// [`DataWriter`], ...) wrap one of these and add kind-specific surface.
pub struct EntityHandle {
    pub(crate) native: Arc<dyn NativeEntity>,
    pub(crate) slot: ListenerSlot,
    pub(crate) ctx: BridgeCtx,
    /// Back-reference to the entity this one was created under. `None`
    /// for participants, adopted entities, and borrowed handles. Counted:
    /// a child keeps its parent's entity alive.
    parent: Option<Arc<EntityHandle>>,
    /// False for handles lent to callbacks: those are dropped while the
    /// engine holds the entity's native lock, so they must never start
    /// teardown themselves.
    counted: bool,
}

impl EntityHandle {
    pub(crate) fn new(native: Arc<dyn NativeEntity>, slot: ListenerSlot, ctx: BridgeCtx) -> Self {
        Self {
            native,
            slot,
            ctx,
            parent: None,
            counted: true,
        }
    }

    pub(crate) fn borrowed(
        native: Arc<dyn NativeEntity>,
        slot: ListenerSlot,
        ctx: BridgeCtx,
    ) -> Self {
        Self {
            native,
            slot,
            ctx,
            parent: None,
            counted: false,
        }
    }

    /// Counted handle for a child entity created under this one, with this
    /// one recorded as the child's parent.
    pub(crate) fn child(&self, native: Arc<dyn NativeEntity>) -> EntityHandle {
        let slot = ListenerSlot::for_kind(native.kind());
        let mut handle = EntityHandle::new(native, slot, self.ctx.clone());
        handle.parent = Some(Arc::new(self.clone()));
        handle
    }

    /// Handle of the entity this one was created under.
    ///
    /// `None` for participants and for entities adopted from outside the
    /// factory hierarchy.
    #[must_use]
    pub fn parent(&self) -> Option<&EntityHandle> {
        self.parent.as_deref()
    }

    /// Number of live strong references to the native entity.
    ///
    /// Approximate while a dispatch is in flight: handles lent to the
    /// running callback are included.
    #[must_use]
    pub fn use_count(&self) -> usize {
        Arc::strong_count(&self.native)
    }

    /// True if both handles reference the same native entity.
    #[must_use]
    pub fn same_entity(&self, other: &EntityHandle) -> bool {
        Arc::ptr_eq(&self.native, &other.native)
    }
}

impl Clone for EntityHandle {
    /// Clones are always counted, including clones taken inside a callback
    /// from a borrowed handle: stashing one keeps the entity alive.
    fn clone(&self) -> Self {
        Self {
            native: Arc::clone(&self.native),
            slot: self.slot.clone(),
            ctx: self.ctx.clone(),
            parent: self.parent.clone(),
            counted: true,
        }
    }
}

impl Drop for EntityHandle {
    fn drop(&mut self) {
        if self.counted {
            lifecycle::on_handle_drop(self);
        }
    }
}

impl PartialEq for EntityHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_entity(other)
    }
}

impl Eq for EntityHandle {}

impl std::fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityHandle")
            .field("kind", &self.native.kind())
            .field("instance", &self.native.instance_handle())
            .field("counted", &self.counted)
            .finish()
    }
}

/// Operations common to every entity handle.
pub trait Entity {
    /// The untyped handle backing this entity.
    fn entity(&self) -> &EntityHandle;

    /// Widen to a fresh untyped handle. The typed view can be recovered
    /// with the matching `from_entity` constructor.
    fn as_entity(&self) -> EntityHandle {
        self.entity().clone()
    }

    /// Concrete kind of the entity.
    fn kind(&self) -> EntityKind {
        self.entity().native.kind()
    }

    /// Engine-assigned identity.
    fn instance_handle(&self) -> InstanceHandle {
        self.entity().native.instance_handle()
    }

    /// Enable the entity (idempotent).
    fn enable(&self) -> Result<()> {
        self.entity().native.enable()
    }

    /// Close the entity now: listener unregistered, then native resources
    /// released. Idempotent; outstanding handles become inert.
    fn close(&self) -> Result<()> {
        lifecycle::close_entity(self.entity())
    }

    /// True once the entity has been closed.
    fn closed(&self) -> bool {
        self.entity().native.closed()
    }

    /// Deep copy of the entity's QoS. Mutating it does not affect the
    /// entity; apply changes through [`set_qos`](Entity::set_qos).
    fn qos(&self) -> Result<QoS> {
        self.entity().native.qos()
    }

    /// Replace the entity's QoS.
    fn set_qos(&self, qos: &QoS) -> Result<()> {
        self.entity().native.set_qos(qos)
    }

    /// Statuses that have fired since creation.
    fn active_status(&self) -> StatusMask {
        self.entity().native.active_status()
    }

    /// True if a listener callback is currently registered.
    fn has_listener(&self) -> bool {
        self.entity().slot.has_callback()
    }
}

impl Entity for EntityHandle {
    fn entity(&self) -> &EntityHandle {
        self
    }
}

/// Close-on-drop guard for any entity.
///
/// Guarantees deterministic teardown at scope exit even while other
/// handles to the same entity are still alive.
pub struct Scoped<T: Entity> {
    inner: Option<T>,
}

impl<T: Entity> Scoped<T> {
    /// Take ownership of `inner`, closing it when the guard drops.
    #[must_use]
    pub fn new(inner: T) -> Self {
        Self { inner: Some(inner) }
    }

    /// Release the guard without closing the entity.
    #[must_use]
    pub fn into_inner(mut self) -> T {
        self.inner.take().expect("scoped entity already taken")
    }
}

impl<T: Entity> Deref for Scoped<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.inner.as_ref().expect("scoped entity already taken")
    }
}

impl<T: Entity> Drop for Scoped<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            if let Err(e) = inner.close() {
                log::warn!(
                    "[entity] scoped close of {} {} failed: {}",
                    inner.kind(),
                    inner.instance_handle(),
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_by_kind() {
        assert!(matches!(
            ListenerSlot::for_kind(EntityKind::Reader),
            ListenerSlot::Reader(_)
        ));
        assert!(matches!(
            ListenerSlot::for_kind(EntityKind::Writer),
            ListenerSlot::Writer(_)
        ));
        assert!(matches!(
            ListenerSlot::for_kind(EntityKind::Topic),
            ListenerSlot::Topic(_)
        ));
        assert!(matches!(
            ListenerSlot::for_kind(EntityKind::Participant),
            ListenerSlot::Absent
        ));
        assert!(!ListenerSlot::for_kind(EntityKind::Publisher).has_callback());
    }
}
