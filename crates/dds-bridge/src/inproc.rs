// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process engine - a complete [`NativeEngine`] without a network.
//!
//! Serves two roles: the reference implementation the lifecycle and
//! listener machinery is exercised against, and a real engine for
//! intra-process deployments that want DDS structure without discovery.
//!
//! Events are injected with [`InprocEngine::fire`] (synchronous, caller
//! thread) or [`InprocEngine::fire_async`] (queued on the event pump
//! thread, preserving submission order). The engine holds only weak
//! references to its entities, so entity lifetime is governed entirely by
//! the handles above.

use crate::native::{
    EntityKind, InstanceHandle, NativeEngine, NativeEntity, NativeListener, WaitOutcome,
};
use crate::qos::QoS;
use crate::status::{EntityEvent, StatusMask};
use crate::{Error, Result};
use crossbeam::channel::{bounded, unbounded, Sender};
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

/// One in-process entity. Obtain via the [`NativeEngine`] factories or
/// [`InprocEngine::entity`].
pub struct InprocEntity {
    id: u64,
    kind: EntityKind,
    topic_name: Option<String>,
    type_name: Option<String>,
    enabled: AtomicBool,
    closed: AtomicBool,
    qos: Mutex<QoS>,
    /// The native registration slot: trampoline plus mask. Holds no strong
    /// reference to any script-side callback.
    registration: Mutex<Option<(Arc<dyn NativeListener>, StatusMask)>>,
    active: AtomicU32,
    /// The entity's native lock; held across every dispatch.
    op_lock: Mutex<()>,
    /// Outstanding acknowledgments (writers) or historical samples
    /// (readers) for the blocking waits.
    pending: Mutex<u32>,
    pending_cv: Condvar,
}

impl InprocEntity {
    fn new(id: u64, kind: EntityKind, topic: Option<(&str, &str)>, qos: &QoS) -> Self {
        Self {
            id,
            kind,
            topic_name: topic.map(|(name, _)| name.to_string()),
            type_name: topic.map(|(_, ty)| ty.to_string()),
            enabled: AtomicBool::new(true),
            closed: AtomicBool::new(false),
            qos: Mutex::new(qos.clone()),
            registration: Mutex::new(None),
            active: AtomicU32::new(0),
            op_lock: Mutex::new(()),
            pending: Mutex::new(0),
            pending_cv: Condvar::new(),
        }
    }

    /// Dispatch one event through the registration slot.
    ///
    /// Holds the entity's native lock for the whole dispatch, mirroring
    /// how a protocol engine delivers from its receive path. The status
    /// bit is recorded even when no listener consumes the event.
    fn deliver(self: &Arc<Self>, event: &EntityEvent) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            log::trace!("[inproc] dropping event for closed {} {}", self.kind, self.id);
            return Ok(());
        }
        let _op = self.op_lock.lock();
        self.active.fetch_or(event.status_bit().bits(), Ordering::SeqCst);
        if !self.enabled.load(Ordering::SeqCst) {
            return Ok(());
        }
        let registration = self.registration.lock().clone();
        let Some((listener, mask)) = registration else {
            return Ok(());
        };
        if !mask.contains(event.status_bit()) {
            return Ok(());
        }
        let entity: Arc<dyn NativeEntity> = Arc::clone(self) as Arc<dyn NativeEntity>;
        listener.on_event(&entity, event)
    }

    /// Test hook: set the number of outstanding items the blocking waits
    /// observe.
    pub fn set_outstanding(&self, n: u32) {
        *self.pending.lock() = n;
        self.pending_cv.notify_all();
    }

    /// Test hook: complete one outstanding item, waking waiters at zero.
    pub fn complete_outstanding(&self) {
        let mut pending = self.pending.lock();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.pending_cv.notify_all();
        }
    }

    fn wait_outstanding(&self, timeout: Duration) -> Result<WaitOutcome> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::PreconditionNotMet(format!(
                "{} {} is closed",
                self.kind, self.id
            )));
        }
        let deadline = Instant::now() + timeout;
        let mut pending = self.pending.lock();
        while *pending > 0 {
            if self.pending_cv.wait_until(&mut pending, deadline).timed_out() {
                return Ok(if *pending == 0 {
                    WaitOutcome::Completed
                } else {
                    WaitOutcome::TimedOut
                });
            }
        }
        Ok(WaitOutcome::Completed)
    }
}

impl NativeEntity for InprocEntity {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn instance_handle(&self) -> InstanceHandle {
        InstanceHandle::new(self.id)
    }

    fn topic_name(&self) -> Option<&str> {
        self.topic_name.as_deref()
    }

    fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    fn enable(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::PreconditionNotMet(format!(
                "{} {} is closed",
                self.kind, self.id
            )));
        }
        self.enabled.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        // Belt for direct native closes; the lifecycle controller has
        // normally cleared the registration already.
        *self.registration.lock() = None;
        self.pending_cv.notify_all();
        log::debug!("[inproc] closed {} {}", self.kind, self.id);
        Ok(())
    }

    fn closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn qos(&self) -> Result<QoS> {
        Ok(self.qos.lock().clone())
    }

    fn set_qos(&self, qos: &QoS) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::PreconditionNotMet(format!(
                "{} {} is closed",
                self.kind, self.id
            )));
        }
        *self.qos.lock() = qos.clone();
        Ok(())
    }

    fn set_listener(
        &self,
        listener: Option<Arc<dyn NativeListener>>,
        mask: StatusMask,
    ) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::PreconditionNotMet(format!(
                "{} {} is closed",
                self.kind, self.id
            )));
        }
        if listener.is_some() && !self.kind.supports_listener() {
            return Err(Error::IllegalOperation(format!(
                "a {} does not support listeners",
                self.kind
            )));
        }
        *self.registration.lock() = listener.map(|l| (l, mask));
        Ok(())
    }

    fn has_listener(&self) -> bool {
        self.registration.lock().is_some()
    }

    fn active_status(&self) -> StatusMask {
        StatusMask::from_bits(self.active.load(Ordering::SeqCst))
    }

    fn native_lock(&self) -> &Mutex<()> {
        &self.op_lock
    }

    fn wait_for_acknowledgments(&self, timeout: Duration) -> Result<WaitOutcome> {
        if self.kind != EntityKind::Writer {
            return Err(Error::IllegalOperation(format!(
                "wait_for_acknowledgments on a {}",
                self.kind
            )));
        }
        self.wait_outstanding(timeout)
    }

    fn wait_for_historical_data(&self, timeout: Duration) -> Result<WaitOutcome> {
        if self.kind != EntityKind::Reader {
            return Err(Error::IllegalOperation(format!(
                "wait_for_historical_data on a {}",
                self.kind
            )));
        }
        self.wait_outstanding(timeout)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

enum PumpCmd {
    Deliver(Arc<InprocEntity>, EntityEvent),
    Flush(Sender<()>),
    Shutdown,
}

/// Single delivery thread; preserves per-entity (in fact global)
/// submission order for [`InprocEngine::fire_async`].
struct EventPump {
    tx: Sender<PumpCmd>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl EventPump {
    fn start() -> Self {
        let (tx, rx) = unbounded::<PumpCmd>();
        let worker = thread::Builder::new()
            .name("dds-bridge-pump".to_string())
            .spawn(move || {
                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        PumpCmd::Deliver(entity, event) => {
                            if let Err(e) = entity.deliver(&event) {
                                log::warn!(
                                    "[inproc] async dispatch on {} {} failed: {}",
                                    entity.kind,
                                    entity.id,
                                    e
                                );
                            }
                        }
                        PumpCmd::Flush(done) => {
                            let _ = done.send(());
                        }
                        PumpCmd::Shutdown => break,
                    }
                }
            });
        match worker {
            Ok(handle) => Self {
                tx,
                worker: Mutex::new(Some(handle)),
            },
            Err(e) => {
                // No pump thread: fire_async degrades to an error, the
                // synchronous path still works.
                log::error!("[inproc] failed to spawn event pump: {}", e);
                Self {
                    tx,
                    worker: Mutex::new(None),
                }
            }
        }
    }
}

impl Drop for EventPump {
    fn drop(&mut self) {
        let _ = self.tx.send(PumpCmd::Shutdown);
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }
}

/// In-process [`NativeEngine`].
pub struct InprocEngine {
    entities: DashMap<u64, Weak<InprocEntity>>,
    next_id: AtomicU64,
    pump: EventPump,
}

impl InprocEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: DashMap::new(),
            next_id: AtomicU64::new(1),
            pump: EventPump::start(),
        }
    }

    /// Look up a live entity by its instance handle.
    #[must_use]
    pub fn entity(&self, handle: InstanceHandle) -> Option<Arc<InprocEntity>> {
        self.entities.get(&handle.raw()).and_then(|w| w.upgrade())
    }

    /// Deliver `event` to `target` on the calling thread, through the
    /// entity's registration slot and mask.
    pub fn fire(&self, target: InstanceHandle, event: EntityEvent) -> Result<()> {
        let entity = self.entity(target).ok_or_else(|| {
            Error::PreconditionNotMet(format!("no live entity {target}"))
        })?;
        entity.deliver(&event)
    }

    /// Queue `event` for delivery on the pump thread. Events queued from
    /// one thread are delivered in submission order.
    pub fn fire_async(&self, target: InstanceHandle, event: EntityEvent) -> Result<()> {
        let entity = self.entity(target).ok_or_else(|| {
            Error::PreconditionNotMet(format!("no live entity {target}"))
        })?;
        self.pump
            .tx
            .send(PumpCmd::Deliver(entity, event))
            .map_err(|_| Error::IllegalOperation("event pump stopped".to_string()))
    }

    /// Block until every event queued so far has been delivered.
    pub fn flush(&self) -> Result<()> {
        let (done_tx, done_rx) = bounded(1);
        self.pump
            .tx
            .send(PumpCmd::Flush(done_tx))
            .map_err(|_| Error::IllegalOperation("event pump stopped".to_string()))?;
        done_rx
            .recv()
            .map_err(|_| Error::IllegalOperation("event pump stopped".to_string()))
    }

    /// Number of live (not yet dropped) entities; prunes dead slots.
    #[must_use]
    pub fn live_entities(&self) -> usize {
        self.entities.retain(|_, weak| weak.upgrade().is_some());
        self.entities.len()
    }

    fn register(
        &self,
        kind: EntityKind,
        topic: Option<(&str, &str)>,
        qos: &QoS,
    ) -> Arc<dyn NativeEntity> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let entity = Arc::new(InprocEntity::new(id, kind, topic, qos));
        self.entities.insert(id, Arc::downgrade(&entity));
        log::debug!("[inproc] created {} {}", kind, id);
        entity
    }

    /// Validate that `entity` is one of ours, live, and of `expected` kind.
    fn own(
        &self,
        entity: &Arc<dyn NativeEntity>,
        expected: EntityKind,
    ) -> Result<Arc<InprocEntity>> {
        let inproc = entity
            .as_any()
            .downcast_ref::<InprocEntity>()
            .ok_or_else(|| {
                Error::IllegalOperation("entity does not belong to this engine".to_string())
            })?;
        if inproc.kind != expected {
            return Err(Error::PreconditionNotMet(format!(
                "expected a {expected}, got a {}",
                inproc.kind
            )));
        }
        if inproc.closed.load(Ordering::SeqCst) {
            return Err(Error::PreconditionNotMet(format!(
                "{} {} is closed",
                inproc.kind, inproc.id
            )));
        }
        self.entities
            .get(&inproc.id)
            .and_then(|w| w.upgrade())
            .ok_or_else(|| {
                Error::PreconditionNotMet(format!("{} {} is gone", inproc.kind, inproc.id))
            })
    }
}

impl Default for InprocEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeEngine for InprocEngine {
    fn create_participant(&self, name: &str, qos: &QoS) -> Result<Arc<dyn NativeEntity>> {
        log::info!("[inproc] creating participant '{}'", name);
        Ok(self.register(EntityKind::Participant, None, qos))
    }

    fn create_publisher(
        &self,
        participant: &Arc<dyn NativeEntity>,
        qos: &QoS,
    ) -> Result<Arc<dyn NativeEntity>> {
        self.own(participant, EntityKind::Participant)?;
        Ok(self.register(EntityKind::Publisher, None, qos))
    }

    fn create_subscriber(
        &self,
        participant: &Arc<dyn NativeEntity>,
        qos: &QoS,
    ) -> Result<Arc<dyn NativeEntity>> {
        self.own(participant, EntityKind::Participant)?;
        Ok(self.register(EntityKind::Subscriber, None, qos))
    }

    fn create_topic(
        &self,
        participant: &Arc<dyn NativeEntity>,
        topic_name: &str,
        type_name: &str,
        qos: &QoS,
    ) -> Result<Arc<dyn NativeEntity>> {
        self.own(participant, EntityKind::Participant)?;
        Ok(self.register(EntityKind::Topic, Some((topic_name, type_name)), qos))
    }

    fn create_reader(
        &self,
        subscriber: &Arc<dyn NativeEntity>,
        topic: &Arc<dyn NativeEntity>,
        qos: &QoS,
    ) -> Result<Arc<dyn NativeEntity>> {
        self.own(subscriber, EntityKind::Subscriber)?;
        let topic = self.own(topic, EntityKind::Topic)?;
        let names = (
            topic.topic_name().unwrap_or_default(),
            topic.type_name().unwrap_or_default(),
        );
        Ok(self.register(EntityKind::Reader, Some(names), qos))
    }

    fn create_writer(
        &self,
        publisher: &Arc<dyn NativeEntity>,
        topic: &Arc<dyn NativeEntity>,
        qos: &QoS,
    ) -> Result<Arc<dyn NativeEntity>> {
        self.own(publisher, EntityKind::Publisher)?;
        let topic = self.own(topic, EntityKind::Topic)?;
        let names = (
            topic.topic_name().unwrap_or_default(),
            topic.type_name().unwrap_or_default(),
        );
        Ok(self.register(EntityKind::Writer, Some(names), qos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_and_participant() -> (InprocEngine, Arc<dyn NativeEntity>) {
        let engine = InprocEngine::new();
        let participant = engine
            .create_participant("test", &QoS::default())
            .expect("participant");
        (engine, participant)
    }

    #[test]
    fn test_entity_lookup() {
        let (engine, participant) = engine_and_participant();
        let found = engine.entity(participant.instance_handle()).expect("live");
        assert_eq!(found.instance_handle(), participant.instance_handle());
        assert_eq!(engine.live_entities(), 1);
    }

    #[test]
    fn test_weak_registration_allows_drop() {
        let (engine, participant) = engine_and_participant();
        let handle = participant.instance_handle();
        drop(participant);
        assert!(engine.entity(handle).is_none());
        assert_eq!(engine.live_entities(), 0);
    }

    #[test]
    fn test_parent_kind_enforced() {
        let (engine, participant) = engine_and_participant();
        let publisher = engine
            .create_publisher(&participant, &QoS::default())
            .expect("publisher");
        // A publisher is not a valid parent for a subscriber.
        match engine.create_subscriber(&publisher, &QoS::default()) {
            Err(e) => assert!(matches!(e, Error::PreconditionNotMet(_))),
            Ok(_) => panic!("subscriber created under a publisher"),
        }
    }

    #[test]
    fn test_listener_rejected_on_grouping_entities() {
        let (_engine, participant) = engine_and_participant();
        struct Sink;
        impl NativeListener for Sink {
            fn on_event(
                &self,
                _entity: &Arc<dyn NativeEntity>,
                _event: &EntityEvent,
            ) -> Result<()> {
                Ok(())
            }
        }
        let err = participant
            .set_listener(Some(Arc::new(Sink)), StatusMask::ALL)
            .unwrap_err();
        assert!(matches!(err, Error::IllegalOperation(_)));
    }

    #[test]
    fn test_close_idempotent_and_ops_fail_after() {
        let (_engine, participant) = engine_and_participant();
        participant.close().expect("first close");
        participant.close().expect("second close");
        assert!(participant.closed());
        assert!(matches!(
            participant.enable(),
            Err(Error::PreconditionNotMet(_))
        ));
        assert!(matches!(
            participant.set_qos(&QoS::default()),
            Err(Error::PreconditionNotMet(_))
        ));
    }

    #[test]
    fn test_wait_kind_checks() {
        let (engine, participant) = engine_and_participant();
        let subscriber = engine
            .create_subscriber(&participant, &QoS::default())
            .expect("subscriber");
        let topic = engine
            .create_topic(&participant, "t", "T", &QoS::default())
            .expect("topic");
        let reader = engine
            .create_reader(&subscriber, &topic, &QoS::default())
            .expect("reader");
        assert!(matches!(
            reader.wait_for_acknowledgments(Duration::from_millis(1)),
            Err(Error::IllegalOperation(_))
        ));
        assert_eq!(
            reader
                .wait_for_historical_data(Duration::from_millis(1))
                .expect("wait"),
            WaitOutcome::Completed
        );
    }

    #[test]
    fn test_wait_timeout_is_a_status() {
        let (engine, participant) = engine_and_participant();
        let subscriber = engine
            .create_subscriber(&participant, &QoS::default())
            .expect("subscriber");
        let topic = engine
            .create_topic(&participant, "t", "T", &QoS::default())
            .expect("topic");
        let reader_dyn = engine
            .create_reader(&subscriber, &topic, &QoS::default())
            .expect("reader");
        let reader = engine.entity(reader_dyn.instance_handle()).expect("live");
        reader.set_outstanding(1);
        assert_eq!(
            reader_dyn
                .wait_for_historical_data(Duration::from_millis(5))
                .expect("wait"),
            WaitOutcome::TimedOut
        );
        reader.complete_outstanding();
        assert_eq!(
            reader_dyn
                .wait_for_historical_data(Duration::from_millis(5))
                .expect("wait"),
            WaitOutcome::Completed
        );
    }

    #[test]
    fn test_fire_records_active_status_without_listener() {
        let (engine, participant) = engine_and_participant();
        let subscriber = engine
            .create_subscriber(&participant, &QoS::default())
            .expect("subscriber");
        let topic = engine
            .create_topic(&participant, "t", "T", &QoS::default())
            .expect("topic");
        let reader = engine
            .create_reader(&subscriber, &topic, &QoS::default())
            .expect("reader");
        engine
            .fire(reader.instance_handle(), EntityEvent::DataAvailable)
            .expect("fire");
        assert!(reader.active_status().contains(StatusMask::DATA_AVAILABLE));
    }
}
