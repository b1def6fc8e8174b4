// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::items_after_statements)] // Test helpers
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure
#![allow(clippy::too_many_lines)] // Example/test code
#![allow(clippy::similar_names)] // Test variable naming

//! Typed handle surface tests
//!
//! Verifies downcast round trips through the untyped handle, QoS deep
//! copies, handle identity, and blocking waits with timeout-as-status.

use dds_bridge::inproc::InprocEngine;
use dds_bridge::{
    Bridge, DataReader, DataWriter, Entity, EntityKind, Error, NativeEngine, Participant,
    QoS, Reliability, Subscriber, Topic, WaitOutcome,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

struct Fixture {
    engine: Arc<InprocEngine>,
    participant: Participant,
}

fn fixture() -> Fixture {
    let engine = Arc::new(InprocEngine::new());
    let bridge = Bridge::new(Arc::clone(&engine) as Arc<dyn NativeEngine>);
    let participant = bridge
        .create_participant("handles", &QoS::default())
        .expect("participant");
    Fixture {
        engine,
        participant,
    }
}

#[test]
fn test_downcast_round_trip_preserves_identity() {
    let fx = fixture();
    let topic = fx
        .participant
        .create_topic("sensors/temperature", "Temperature", &QoS::default())
        .expect("topic");
    let subscriber = fx
        .participant
        .create_subscriber(&QoS::default())
        .expect("subscriber");
    let reader = subscriber
        .create_reader(&topic, &QoS::reliable())
        .expect("reader");

    let untyped = reader.entity().clone();
    let recovered = DataReader::from_entity(&untyped).expect("round trip");

    assert_eq!(recovered, reader, "same entity");
    assert_eq!(recovered.instance_handle(), reader.instance_handle());
    assert_eq!(recovered.topic_name(), "sensors/temperature");
    assert_eq!(recovered.type_name(), "Temperature");
}

#[test]
fn test_downcast_to_the_wrong_kind_fails() {
    let fx = fixture();
    let topic = fx
        .participant
        .create_topic("t", "T", &QoS::default())
        .expect("topic");

    let untyped = topic.entity().clone();
    let err = DataReader::from_entity(&untyped).unwrap_err();
    match err {
        Error::InvalidDowncast { expected, actual } => {
            assert_eq!(expected, EntityKind::Reader);
            assert_eq!(actual, EntityKind::Topic);
        }
        other => panic!("expected InvalidDowncast, got {other}"),
    }
    // The failed downcast consumed nothing: the typed view still works.
    assert_eq!(Topic::from_entity(&untyped).expect("topic view").name(), "t");
}

#[test]
fn test_every_kind_downcasts_to_itself_only() {
    let fx = fixture();
    let untyped = fx.participant.entity().clone();
    assert!(Participant::from_entity(&untyped).is_ok());
    assert!(Subscriber::from_entity(&untyped).is_err());
    assert!(DataWriter::from_entity(&untyped).is_err());
}

#[test]
fn test_parent_navigation() {
    let fx = fixture();
    let topic = fx
        .participant
        .create_topic("t", "T", &QoS::default())
        .expect("topic");
    let subscriber = fx
        .participant
        .create_subscriber(&QoS::default())
        .expect("subscriber");
    let publisher = fx
        .participant
        .create_publisher(&QoS::default())
        .expect("publisher");
    let reader = subscriber
        .create_reader(&topic, &QoS::default())
        .expect("reader");
    let writer = publisher
        .create_writer(&topic, &QoS::default())
        .expect("writer");

    assert_eq!(reader.subscriber().expect("parent"), subscriber);
    assert_eq!(writer.publisher().expect("parent"), publisher);
    assert_eq!(topic.participant().expect("parent"), fx.participant);
    assert_eq!(subscriber.participant().expect("parent"), fx.participant);
    assert_eq!(publisher.participant().expect("parent"), fx.participant);

    // Two levels up through the untyped handles.
    let grandparent = reader
        .entity()
        .parent()
        .and_then(|p| p.parent())
        .expect("grandparent");
    assert!(grandparent.same_entity(fx.participant.entity()));

    // The root of the hierarchy has no parent.
    assert!(fx.participant.entity().parent().is_none());
}

#[test]
fn test_parent_survives_the_untyped_round_trip() {
    let fx = fixture();
    let subscriber = fx
        .participant
        .create_subscriber(&QoS::default())
        .expect("subscriber");

    let untyped = subscriber.entity().clone();
    let recovered = Subscriber::from_entity(&untyped).expect("round trip");
    assert_eq!(recovered.participant().expect("parent"), fx.participant);
}

#[test]
fn test_child_keeps_its_parent_alive() {
    let fx = fixture();
    let reader = {
        let topic = fx
            .participant
            .create_topic("t", "T", &QoS::default())
            .expect("topic");
        let subscriber = fx
            .participant
            .create_subscriber(&QoS::default())
            .expect("subscriber");
        subscriber
            .create_reader(&topic, &QoS::default())
            .expect("reader")
        // The local subscriber handle drops here.
    };

    let subscriber = reader.subscriber().expect("parent outlives local handle");
    assert!(!subscriber.closed());
}

#[test]
fn test_qos_reads_are_deep_copies() {
    let fx = fixture();
    let topic = fx
        .participant
        .create_topic("t", "T", &QoS::default())
        .expect("topic");
    let subscriber = fx
        .participant
        .create_subscriber(&QoS::default())
        .expect("subscriber");
    let reader = subscriber
        .create_reader(&topic, &QoS::reliable())
        .expect("reader");

    let mut qos = reader.qos().expect("qos");
    assert_eq!(qos.reliability, Reliability::Reliable);

    // Mutating the returned copy must not leak into the entity.
    qos.reliability = Reliability::BestEffort;
    qos.partition.push("p".to_string());
    let fresh = reader.qos().expect("qos again");
    assert_eq!(fresh.reliability, Reliability::Reliable);
    assert!(fresh.partition.is_empty());

    // Round trip through set_qos applies the change.
    reader.set_qos(&qos).expect("set_qos");
    assert_eq!(
        reader.qos().expect("qos").reliability,
        Reliability::BestEffort
    );
}

#[test]
fn test_handle_equality_is_entity_identity() {
    let fx = fixture();
    let topic_a = fx
        .participant
        .create_topic("a", "T", &QoS::default())
        .expect("topic a");
    let topic_b = fx
        .participant
        .create_topic("b", "T", &QoS::default())
        .expect("topic b");

    assert_eq!(topic_a, topic_a.clone());
    assert_ne!(topic_a, topic_b);
    assert!(topic_a.entity().same_entity(topic_a.clone().entity()));
}

#[test]
fn test_wait_for_acknowledgments_timeout_is_a_status() {
    let fx = fixture();
    let topic = fx
        .participant
        .create_topic("t", "T", &QoS::default())
        .expect("topic");
    let publisher = fx
        .participant
        .create_publisher(&QoS::default())
        .expect("publisher");
    let writer = publisher
        .create_writer(&topic, &QoS::reliable())
        .expect("writer");

    let native = fx.engine.entity(writer.instance_handle()).expect("live");
    native.set_outstanding(1);

    let outcome = writer
        .wait_for_acknowledgments(Duration::from_millis(5))
        .expect("wait returns normally");
    assert_eq!(outcome, WaitOutcome::TimedOut);

    // Completion from another thread wakes the waiter.
    let acker = thread::spawn({
        let native = Arc::clone(&native);
        move || {
            thread::sleep(Duration::from_millis(20));
            native.complete_outstanding();
        }
    });
    let outcome = writer
        .wait_for_acknowledgments(Duration::from_secs(5))
        .expect("wait");
    assert_eq!(outcome, WaitOutcome::Completed);
    acker.join().expect("acker thread");

    // `native` pins the entity; release it before the handles drop.
    drop(native);
}

#[test]
fn test_enable_is_idempotent() {
    let fx = fixture();
    fx.participant.enable().expect("enable");
    fx.participant.enable().expect("enable again");
    assert!(!fx.participant.closed());
}

#[test]
fn test_active_status_accumulates() {
    use dds_bridge::{EntityEvent, StatusMask};
    let fx = fixture();
    let topic = fx
        .participant
        .create_topic("t", "T", &QoS::default())
        .expect("topic");
    let subscriber = fx
        .participant
        .create_subscriber(&QoS::default())
        .expect("subscriber");
    let reader = subscriber
        .create_reader(&topic, &QoS::default())
        .expect("reader");

    assert!(reader.active_status().is_none());
    fx.engine
        .fire(reader.instance_handle(), EntityEvent::DataAvailable)
        .expect("fire");
    assert!(reader.active_status().contains(StatusMask::DATA_AVAILABLE));
    assert!(!reader.active_status().contains(StatusMask::SAMPLE_LOST));
}
