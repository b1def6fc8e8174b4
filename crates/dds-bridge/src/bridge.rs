// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bridge entry point - ties an engine, an interpreter lock, and the
//! runtime configuration together.

use crate::config::BridgeConfig;
use crate::entity::{EntityHandle, ListenerSlot, Participant};
use crate::interp::InterpreterLock;
use crate::native::{NativeEngine, NativeEntity};
use crate::qos::QoS;
use crate::Result;
use std::sync::Arc;

/// Shared context threaded through every handle created by one [`Bridge`].
pub(crate) struct BridgeCtx {
    pub(crate) engine: Arc<dyn NativeEngine>,
    pub(crate) interp: Arc<InterpreterLock>,
    pub(crate) config: BridgeConfig,
}

impl Clone for BridgeCtx {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            interp: Arc::clone(&self.interp),
            config: self.config,
        }
    }
}

/// Top-level factory for typed entity handles over one native engine.
///
/// ```no_run
/// use dds_bridge::{Bridge, QoS};
/// use std::sync::Arc;
///
/// let bridge = Bridge::new(Arc::new(dds_bridge::inproc::InprocEngine::new()));
/// let participant = bridge.create_participant("sensors", &QoS::default())?;
/// # Ok::<(), dds_bridge::Error>(())
/// ```
pub struct Bridge {
    ctx: BridgeCtx,
}

impl Bridge {
    /// Bridge over `engine` with configuration read from the environment.
    #[must_use]
    pub fn new(engine: Arc<dyn NativeEngine>) -> Self {
        Self::with_config(engine, BridgeConfig::from_env())
    }

    /// Bridge over `engine` with an explicit configuration.
    #[must_use]
    pub fn with_config(engine: Arc<dyn NativeEngine>, config: BridgeConfig) -> Self {
        log::info!(
            "[bridge] initialized (listener_use_count_min={})",
            config.listener_use_count_min
        );
        Self {
            ctx: BridgeCtx {
                engine,
                interp: Arc::new(InterpreterLock::new()),
                config,
            },
        }
    }

    /// The interpreter lock callbacks of this bridge run under.
    #[must_use]
    pub fn interpreter_lock(&self) -> Arc<InterpreterLock> {
        Arc::clone(&self.ctx.interp)
    }

    /// Active runtime configuration.
    #[must_use]
    pub fn config(&self) -> BridgeConfig {
        self.ctx.config
    }

    /// Create a domain participant named `name`.
    pub fn create_participant(&self, name: &str, qos: &QoS) -> Result<Participant> {
        let native = self.ctx.engine.create_participant(name, qos)?;
        Participant::from_parts(self.handle(native))
    }

    /// Wrap an externally created native entity in a typed-handle-ready
    /// [`EntityHandle`]. The entity gets a fresh listener registry if its
    /// kind supports one.
    #[must_use]
    pub fn adopt(&self, native: Arc<dyn NativeEntity>) -> EntityHandle {
        self.handle(native)
    }

    pub(crate) fn handle(&self, native: Arc<dyn NativeEntity>) -> EntityHandle {
        let slot = ListenerSlot::for_kind(native.kind());
        EntityHandle::new(native, slot, self.ctx.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LISTENER_USE_COUNT_MIN;
    use crate::entity::Entity;
    use crate::inproc::InprocEngine;

    #[test]
    fn test_default_config() {
        let bridge = Bridge::with_config(Arc::new(InprocEngine::new()), BridgeConfig::default());
        assert_eq!(bridge.config().listener_use_count_min, LISTENER_USE_COUNT_MIN);
    }

    #[test]
    fn test_participant_creation() {
        let bridge = Bridge::with_config(Arc::new(InprocEngine::new()), BridgeConfig::default());
        let participant = bridge
            .create_participant("test", &QoS::default())
            .expect("participant");
        assert!(!participant.closed());
    }
}
