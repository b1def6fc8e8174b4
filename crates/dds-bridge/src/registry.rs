// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Listener registry - the per-entity record of the registered callback.
//!
//! The registry's populated `Option` *is* the single strong reference the
//! bridge holds on a script-side callback: 0-or-1 by construction, never
//! an unbalanced manual count. While an object is the registered listener
//! the option is `Some`; the moment it stops being registered the option
//! is `None` and the reference is gone.
//!
//! # Bind protocol (ordering matters)
//!
//! 1. Take the native entity lock for the whole sequence.
//! 2. Clone the new callback `Arc` (strong reference taken) *before* any
//!    native call.
//! 3. Register a fresh trampoline - holding only weak references - with
//!    the engine via `set_listener`.
//! 4. Only on success, swap the slot; the old strong reference drops
//!    *after* the locks are released.
//! 5. On native failure the new clone drops by scope and the previous
//!    entry is untouched: no partial state.
//!
//! The brief window in step 3-4 where both the old and the new callback
//! are strongly referenced is intentional: if registration fails mid-call
//! the engine may still dispatch into the old callback.

use crate::bridge::BridgeCtx;
use crate::listener::DispatchPolicy;
use crate::native::NativeEntity;
use crate::status::StatusMask;
use crate::trampoline::{ListenerKind, Trampoline};
use crate::Result;
use parking_lot::Mutex;
use std::sync::Arc;

pub(crate) struct ListenerEntry<L: ?Sized> {
    pub(crate) callback: Arc<L>,
    pub(crate) mask: StatusMask,
    pub(crate) policy: DispatchPolicy,
}

/// Per-entity listener slot. One registry is shared by every handle that
/// references the same native entity.
pub(crate) struct ListenerRegistry<L: ?Sized> {
    slot: Mutex<Option<ListenerEntry<L>>>,
}

impl<L: ?Sized> ListenerRegistry<L> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// The currently registered callback, if any.
    pub(crate) fn current(&self) -> Option<Arc<L>> {
        self.slot.lock().as_ref().map(|e| Arc::clone(&e.callback))
    }

    /// The mask the current callback was registered with.
    pub(crate) fn mask(&self) -> Option<StatusMask> {
        self.slot.lock().as_ref().map(|e| e.mask)
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Unregister natively, then release the strong reference.
    ///
    /// The native registration is cleared *before* the callback `Arc` is
    /// dropped: the engine may hold a weak pointer to the callback, and an
    /// event racing this call must find either a live registration or
    /// none, never a registration over a dead object.
    pub(crate) fn clear(&self, native: &Arc<dyn NativeEntity>) -> Result<()> {
        let released = {
            let _entity = native.native_lock().lock();
            let mut slot = self.slot.lock();
            if slot.is_none() {
                return Ok(());
            }
            native.set_listener(None, StatusMask::NONE)?;
            slot.take()
        };
        // Dropped outside the locks: a callback that owns other handles
        // may re-enter teardown on its own drop path.
        drop(released);
        Ok(())
    }
}

impl<L: ListenerKind + ?Sized> ListenerRegistry<L> {
    /// Install, replace, or clear the registered callback.
    ///
    /// Must not be called while the calling thread holds the interpreter
    /// lock (global order: native entity lock outside, interpreter lock
    /// inside). In particular, rebinding from inside a callback of the
    /// same entity is illegal.
    pub(crate) fn bind(
        self: &Arc<Self>,
        native: &Arc<dyn NativeEntity>,
        callback: Option<Arc<L>>,
        mask: StatusMask,
        policy: DispatchPolicy,
        ctx: &BridgeCtx,
    ) -> Result<()> {
        debug_assert!(
            !ctx.interp.held_by_current_thread(),
            "lock order violation: bind() while holding the interpreter lock"
        );

        let replaced = {
            let _entity = native.native_lock().lock();
            match callback {
                Some(cb) => {
                    // Strong reference taken before the native call.
                    let strong = Arc::clone(&cb);
                    let trampoline: Arc<dyn crate::native::NativeListener> = Arc::new(
                        Trampoline::new(Arc::downgrade(&strong), Arc::downgrade(self), policy, ctx),
                    );
                    native.set_listener(Some(trampoline), mask)?;
                    log::debug!(
                        "[registry] bound {} listener on {} (mask={:#x})",
                        native.kind(),
                        native.instance_handle(),
                        mask.bits()
                    );
                    self.slot.lock().replace(ListenerEntry {
                        callback: strong,
                        mask,
                        policy,
                    })
                }
                None => {
                    native.set_listener(None, StatusMask::NONE)?;
                    log::debug!(
                        "[registry] cleared {} listener on {}",
                        native.kind(),
                        native.instance_handle()
                    );
                    self.slot.lock().take()
                }
            }
        };
        // Old strong reference released only after the native registration
        // switched over, and outside the locks.
        drop(replaced);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::ReaderListener;

    struct Quiet;
    impl ReaderListener for Quiet {}

    #[test]
    fn test_empty_registry() {
        let registry: ListenerRegistry<dyn ReaderListener> = ListenerRegistry::new();
        assert!(!registry.is_bound());
        assert!(registry.current().is_none());
        assert!(registry.mask().is_none());
    }

    #[test]
    fn test_entry_holds_one_strong_reference() {
        let registry: ListenerRegistry<dyn ReaderListener> = ListenerRegistry::new();
        let cb: Arc<dyn ReaderListener> = Arc::new(Quiet);
        assert_eq!(Arc::strong_count(&cb), 1);

        registry.slot.lock().replace(ListenerEntry {
            callback: Arc::clone(&cb),
            mask: StatusMask::ALL,
            policy: DispatchPolicy::Lenient,
        });
        assert_eq!(Arc::strong_count(&cb), 2);

        // current() clones transiently, the registry itself stays at one.
        drop(registry.current());
        assert_eq!(Arc::strong_count(&cb), 2);

        registry.slot.lock().take();
        assert_eq!(Arc::strong_count(&cb), 1);
    }

    #[test]
    fn test_mask_tracks_entry() {
        let registry: ListenerRegistry<dyn ReaderListener> = ListenerRegistry::new();
        registry.slot.lock().replace(ListenerEntry {
            callback: Arc::new(Quiet) as Arc<dyn ReaderListener>,
            mask: StatusMask::DATA_AVAILABLE,
            policy: DispatchPolicy::Strict,
        });
        assert_eq!(registry.mask(), Some(StatusMask::DATA_AVAILABLE));
        registry.slot.lock().take();
        assert_eq!(registry.mask(), None);
    }
}
