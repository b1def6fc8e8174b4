// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Lifecycle controller - teardown ordering for entity handles.
//!
//! Teardown is unregister-before-unreference: the listener registration is
//! cleared (and its callback reference released) before native resources
//! go away, so no event can be dispatched into a callback whose entity is
//! mid-destruction.
//!
//! Two triggers exist:
//!
//! - the last counted handle of an entity drops
//!   ([`on_handle_drop`], infallible: failures are logged), and
//! - an explicit `close()` ([`close_entity`], fallible, idempotent).

use crate::entity::EntityHandle;
use crate::Result;
use std::sync::Arc;

/// Last-owner threshold check, run from [`EntityHandle`]'s `Drop`.
///
/// At drop time the dying handle still contributes one strong reference,
/// so "no other owners" reads as `strong_count <= listener_use_count_min`.
/// The threshold is configurable for engines that retain internal strong
/// references of their own (see
/// [`BridgeConfig::listener_use_count_min`](crate::config::BridgeConfig)).
///
/// The count is a snapshot: two threads dropping the last two handles at
/// the same instant can each observe the other's reference and both
/// defer, in which case the native entity is released without the close
/// protocol running. Callers that need teardown to happen at a known
/// point use explicit `close()` or [`Scoped`](crate::entity::Scoped),
/// which ignore the count entirely.
pub(crate) fn on_handle_drop(handle: &EntityHandle) {
    if handle.native.closed() {
        return;
    }
    let count = Arc::strong_count(&handle.native);
    let threshold = handle.ctx.config.listener_use_count_min;
    if count > threshold {
        log::trace!(
            "[lifecycle] {} {} still has {} owners (threshold {})",
            handle.native.kind(),
            handle.native.instance_handle(),
            count - 1,
            threshold
        );
        return;
    }
    log::debug!(
        "[lifecycle] last handle of {} {} dropped, tearing down",
        handle.native.kind(),
        handle.native.instance_handle()
    );
    if let Err(e) = teardown(handle) {
        // Drop must not unwind; the entity may leak native resources.
        log::warn!(
            "[lifecycle] teardown of {} {} failed: {}",
            handle.native.kind(),
            handle.native.instance_handle(),
            e
        );
    }
}

/// Explicit close. Clears the listener registration regardless of the use
/// count, then releases native resources. Idempotent: closing a closed
/// entity is a no-op.
pub(crate) fn close_entity(handle: &EntityHandle) -> Result<()> {
    if handle.native.closed() {
        return Ok(());
    }
    log::debug!(
        "[lifecycle] closing {} {}",
        handle.native.kind(),
        handle.native.instance_handle()
    );
    teardown(handle)
}

/// Unregister first, unreference second, release native last.
fn teardown(handle: &EntityHandle) -> Result<()> {
    handle.slot.clear(&handle.native)?;
    handle.native.close()
}
