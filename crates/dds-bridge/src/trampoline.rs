// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dispatch trampoline - the engine-facing listener registration.
//!
//! One trampoline is installed per bound listener. It holds only weak
//! references, so a registration left behind in the engine can never keep
//! a callback or a registry alive. Delivery runs in two steps:
//!
//! - **Step A** (no lock): upgrade the weak references, confirm this
//!   trampoline's callback is still the registered one, and wrap the
//!   native entity in a typed handle. A dead weak or a registry that has
//!   moved on means the listener was unregistered; the event is dropped
//!   silently. The application may well hold its own `Arc` to the
//!   callback, so a live weak alone proves nothing about registration.
//! - **Step B** (interpreter lock held): invoke the callback inside
//!   `catch_unwind`. A panic never unwinds into the engine; it is logged
//!   and reported as [`Error::CallbackPanicked`].
//!
//! The engine calls [`NativeListener::on_event`] while holding the
//! entity's native lock, so the bracket in step B observes the global
//! order: native entity lock outside, interpreter lock inside.

use crate::bridge::BridgeCtx;
use crate::entity::{DataReader, DataWriter, EntityHandle, ListenerSlot, Topic};
use crate::listener::{
    Dispatched, DispatchPolicy, ReaderListener, TopicListener, WriterListener,
};
use crate::native::{EntityKind, NativeEntity, NativeListener};
use crate::registry::ListenerRegistry;
use crate::status::EntityEvent;
use crate::{Error, Result};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};

/// Glue between one user-facing listener trait and the untyped dispatch
/// path. Implemented on the trait objects themselves (`dyn ReaderListener`
/// and friends) so the registry and trampoline stay generic without a
/// blanket impl.
pub(crate) trait ListenerKind: Send + Sync + 'static {
    /// Typed handle passed to the callbacks of this kind.
    type Handle;

    /// Entity kind this listener attaches to.
    const KIND: EntityKind;

    /// Wrap the native entity for a callback invocation. `registry` is the
    /// slot shared with the originating handle, so a handle obtained inside
    /// a callback sees the same listener state.
    fn wrap(
        native: &Arc<dyn NativeEntity>,
        registry: Option<Arc<ListenerRegistry<Self>>>,
        ctx: &BridgeCtx,
    ) -> Self::Handle;

    /// Route `event` to the matching callback. `None` means the event does
    /// not apply to this listener kind at all.
    fn deliver(&self, handle: &Self::Handle, event: &EntityEvent) -> Option<Dispatched>;
}

impl ListenerKind for dyn ReaderListener {
    type Handle = DataReader;
    const KIND: EntityKind = EntityKind::Reader;

    fn wrap(
        native: &Arc<dyn NativeEntity>,
        registry: Option<Arc<ListenerRegistry<Self>>>,
        ctx: &BridgeCtx,
    ) -> DataReader {
        let slot = registry.map_or(ListenerSlot::Absent, ListenerSlot::Reader);
        DataReader::wrap(EntityHandle::borrowed(Arc::clone(native), slot, ctx.clone()))
    }

    fn deliver(&self, reader: &DataReader, event: &EntityEvent) -> Option<Dispatched> {
        match event {
            EntityEvent::DataAvailable => Some(self.on_data_available(reader)),
            EntityEvent::SubscriptionMatched(s) => {
                Some(self.on_subscription_matched(reader, s.clone()))
            }
            EntityEvent::LivelinessChanged(s) => {
                Some(self.on_liveliness_changed(reader, s.clone()))
            }
            EntityEvent::SampleLost(s) => Some(self.on_sample_lost(reader, s.clone())),
            EntityEvent::SampleRejected(s) => Some(self.on_sample_rejected(reader, s.clone())),
            EntityEvent::RequestedDeadlineMissed(s) => {
                Some(self.on_requested_deadline_missed(reader, s.clone()))
            }
            EntityEvent::RequestedIncompatibleQos(s) => {
                Some(self.on_requested_incompatible_qos(reader, s.clone()))
            }
            _ => None,
        }
    }
}

impl ListenerKind for dyn WriterListener {
    type Handle = DataWriter;
    const KIND: EntityKind = EntityKind::Writer;

    fn wrap(
        native: &Arc<dyn NativeEntity>,
        registry: Option<Arc<ListenerRegistry<Self>>>,
        ctx: &BridgeCtx,
    ) -> DataWriter {
        let slot = registry.map_or(ListenerSlot::Absent, ListenerSlot::Writer);
        DataWriter::wrap(EntityHandle::borrowed(Arc::clone(native), slot, ctx.clone()))
    }

    fn deliver(&self, writer: &DataWriter, event: &EntityEvent) -> Option<Dispatched> {
        match event {
            EntityEvent::PublicationMatched(s) => {
                Some(self.on_publication_matched(writer, s.clone()))
            }
            EntityEvent::OfferedDeadlineMissed(s) => {
                Some(self.on_offered_deadline_missed(writer, s.clone()))
            }
            EntityEvent::OfferedIncompatibleQos(s) => {
                Some(self.on_offered_incompatible_qos(writer, s.clone()))
            }
            EntityEvent::LivelinessLost(s) => Some(self.on_liveliness_lost(writer, s.clone())),
            _ => None,
        }
    }
}

impl ListenerKind for dyn TopicListener {
    type Handle = Topic;
    const KIND: EntityKind = EntityKind::Topic;

    fn wrap(
        native: &Arc<dyn NativeEntity>,
        registry: Option<Arc<ListenerRegistry<Self>>>,
        ctx: &BridgeCtx,
    ) -> Topic {
        let slot = registry.map_or(ListenerSlot::Absent, ListenerSlot::Topic);
        Topic::wrap(EntityHandle::borrowed(Arc::clone(native), slot, ctx.clone()))
    }

    fn deliver(&self, topic: &Topic, event: &EntityEvent) -> Option<Dispatched> {
        match event {
            EntityEvent::InconsistentTopic(s) => {
                Some(self.on_inconsistent_topic(topic, s.clone()))
            }
            _ => None,
        }
    }
}

/// The engine-facing registration installed by
/// [`ListenerRegistry::bind`](crate::registry::ListenerRegistry).
pub(crate) struct Trampoline<L: ListenerKind + ?Sized> {
    target: Weak<L>,
    registry: Weak<ListenerRegistry<L>>,
    policy: DispatchPolicy,
    ctx: BridgeCtx,
}

impl<L: ListenerKind + ?Sized> Trampoline<L> {
    pub(crate) fn new(
        target: Weak<L>,
        registry: Weak<ListenerRegistry<L>>,
        policy: DispatchPolicy,
        ctx: &BridgeCtx,
    ) -> Self {
        Self {
            target,
            registry,
            policy,
            ctx: ctx.clone(),
        }
    }
}

impl<L: ListenerKind + ?Sized> NativeListener for Trampoline<L> {
    fn on_event(&self, entity: &Arc<dyn NativeEntity>, event: &EntityEvent) -> Result<()> {
        // Step A: no lock of ours is held yet. The engine's registration
        // may outlive the bridge's (unregistration can lag), and the
        // application may keep its own reference to the callback, so both
        // checks are needed: the callback must still be alive *and* still
        // be the one the registry holds.
        let registry = self.registry.upgrade();
        let target = self.target.upgrade().filter(|target| {
            registry
                .as_ref()
                .and_then(|r| r.current())
                .is_some_and(|current| Arc::ptr_eq(&current, target))
        });
        let Some(target) = target else {
            log::trace!(
                "[trampoline] dropping {} for {}: listener unregistered",
                event.callback_name(),
                entity.instance_handle()
            );
            return Ok(());
        };
        let handle = L::wrap(entity, registry, &self.ctx);

        // Step B: interpreter lock bracket, panic contained.
        let _interp = self.ctx.interp.acquire();
        let outcome = catch_unwind(AssertUnwindSafe(|| target.deliver(&handle, event)));
        match outcome {
            Ok(Some(Dispatched::Handled)) => Ok(()),
            Ok(Some(Dispatched::Unhandled)) => match self.policy {
                DispatchPolicy::Lenient => Ok(()),
                DispatchPolicy::Strict => Err(Error::NotImplemented(event.callback_name())),
            },
            Ok(None) => {
                log::warn!(
                    "[trampoline] {} event on {} does not apply to a {} listener",
                    event.callback_name(),
                    entity.instance_handle(),
                    L::KIND
                );
                Ok(())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!(
                    "[trampoline] {} on {} panicked: {}",
                    event.callback_name(),
                    entity.instance_handle(),
                    message
                );
                Err(Error::CallbackPanicked {
                    callback: event.callback_name(),
                    message,
                })
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_extraction() {
        let boxed: Box<dyn Any + Send> = Box::new("static str panic");
        assert_eq!(panic_message(boxed.as_ref()), "static str panic");

        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned panic"));
        assert_eq!(panic_message(boxed.as_ref()), "owned panic");

        let boxed: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(boxed.as_ref()), "non-string panic payload");
    }
}
