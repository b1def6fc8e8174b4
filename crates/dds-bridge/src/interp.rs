// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Interpreter lock - the scripting runtime's global lock, modeled.
//!
//! The wrapped scripting runtime executes at most one script-side callback
//! at a time across the whole process. This module models that lock as a
//! scoped acquisition: [`InterpreterLock::acquire`] returns a guard that
//! releases on every exit path, including unwinding.
//!
//! # Lock ordering
//!
//! The global order is **native entity lock outside, interpreter lock
//! inside**. Event delivery takes the native lock first, then acquires the
//! interpreter lock for the script-side portion of dispatch. Operations
//! that take the native lock (listener rebind, blocking waits) must
//! therefore never run while the calling thread holds the interpreter
//! lock; debug builds assert this via [`held_by_current_thread`].
//!
//! [`held_by_current_thread`]: InterpreterLock::held_by_current_thread

use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable per-thread token (thread IDs are not exposed as integers on
/// stable Rust).
fn thread_token() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    thread_local! {
        static TOKEN: u64 = NEXT.fetch_add(1, Ordering::Relaxed);
    }
    TOKEN.with(|t| *t)
}

/// Process-wide scripting interpreter lock.
///
/// Serializes every script-side critical section: two events on two
/// different entities, delivered from two different native threads, are
/// still mutually excluded for the duration of their callbacks. No
/// ordering between independent threads racing to acquire is implied.
pub struct InterpreterLock {
    inner: Mutex<()>,
    /// Token of the thread currently inside the lock (0 = unheld).
    holder: AtomicU64,
    /// Total successful acquisitions, for diagnostics and tests.
    acquisitions: AtomicU64,
}

impl InterpreterLock {
    /// Create a fresh, unheld interpreter lock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(()),
            holder: AtomicU64::new(0),
            acquisitions: AtomicU64::new(0),
        }
    }

    /// Block until the interpreter lock is held; release it by dropping
    /// the returned guard.
    pub fn acquire(&self) -> InterpreterGuard<'_> {
        let guard = self.inner.lock();
        self.holder.store(thread_token(), Ordering::Release);
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        InterpreterGuard {
            lock: self,
            _inner: guard,
        }
    }

    /// True if the calling thread currently holds the lock.
    ///
    /// Used to assert the native-outside/interpreter-inside lock order in
    /// debug builds.
    #[must_use]
    pub fn held_by_current_thread(&self) -> bool {
        self.holder.load(Ordering::Acquire) == thread_token()
    }

    /// True if any thread currently holds the lock.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Number of acquisitions since construction.
    #[must_use]
    pub fn acquisition_count(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }

    /// Run `f` under the interpreter lock.
    pub fn with<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.acquire();
        f()
    }
}

impl Default for InterpreterLock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InterpreterLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterpreterLock")
            .field("locked", &self.is_locked())
            .field("acquisitions", &self.acquisition_count())
            .finish()
    }
}

/// Scoped interpreter-lock ownership. Releases on drop, on all exit paths.
pub struct InterpreterGuard<'a> {
    lock: &'a InterpreterLock,
    _inner: MutexGuard<'a, ()>,
}

impl Drop for InterpreterGuard<'_> {
    fn drop(&mut self) {
        // Holder cleared while the mutex is still held: a racing reader can
        // only under-report ownership, never claim a lock it does not hold.
        self.lock.holder.store(0, Ordering::Release);
    }
}
