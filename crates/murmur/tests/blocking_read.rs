// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests panic on failure

//! Blocking read integration tests
//!
//! Validates the ReadSlot rendezvous between transport writers and the
//! blocking read API.

use murmur::{SampleMeta, Subscriber, TopicInfo, TransportLayer};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn topic_info() -> TopicInfo<'static> {
    TopicInfo {
        topic_name: "telemetry",
        host_name: "h",
        process_id: 1,
        entity_id: 101,
    }
}

fn meta(send_clock: i64, payload_hash: u64) -> SampleMeta {
    SampleMeta {
        filter_id: 0,
        send_clock,
        send_time_us: send_clock * 1_000,
        payload_hash,
        layer: TransportLayer::Udp,
    }
}

#[test]
fn test_blocking_read_wakes_on_sample() {
    let subscriber = Arc::new(Subscriber::builder("telemetry").build());
    let handle = subscriber.ingress_handle();

    let writer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        handle.on_sample(topic_info(), b"x", &meta(1, 1));
    });

    let mut buf = Vec::new();
    let mut time_us = 0;
    let start = Instant::now();
    let got = subscriber
        .read(&mut buf, &mut time_us, 500)
        .expect("subscriber alive");

    assert!(got);
    assert_eq!(buf, b"x");
    assert_eq!(time_us, 1_000);
    assert!(start.elapsed() < Duration::from_millis(400));

    // No further sample: the next short read times out empty-handed.
    let got = subscriber
        .read(&mut buf, &mut time_us, 10)
        .expect("subscriber alive");
    assert!(!got);

    writer.join().expect("writer thread should not panic");
}

#[test]
fn test_poll_read_never_blocks() {
    let subscriber = Subscriber::builder("telemetry").build();

    let mut buf = Vec::new();
    let mut time_us = 0;
    let start = Instant::now();
    let got = subscriber
        .read(&mut buf, &mut time_us, 0)
        .expect("subscriber alive");

    assert!(!got);
    assert!(start.elapsed() < Duration::from_millis(5));
}

#[test]
fn test_poll_read_drains_buffered_sample() {
    let subscriber = Subscriber::builder("telemetry").build();
    subscriber.on_sample(topic_info(), b"buffered", &meta(1, 1));

    let mut buf = Vec::new();
    let mut time_us = 0;
    assert_eq!(subscriber.read(&mut buf, &mut time_us, 0), Ok(true));
    assert_eq!(buf, b"buffered");

    // Slot drained: an immediate second poll is empty.
    assert_eq!(subscriber.read(&mut buf, &mut time_us, 0), Ok(false));
}

#[test]
fn test_unread_sample_is_overwritten() {
    let subscriber = Subscriber::builder("telemetry").build();
    subscriber.on_sample(topic_info(), b"first", &meta(1, 1));
    subscriber.on_sample(topic_info(), b"second", &meta(2, 2));

    let mut buf = Vec::new();
    let mut time_us = 0;
    assert_eq!(subscriber.read(&mut buf, &mut time_us, 0), Ok(true));
    assert_eq!(buf, b"second", "writer overwrites undrained payload");
    assert_eq!(time_us, 2_000);
}

#[test]
fn test_installed_callback_starves_read_path() {
    let subscriber = Subscriber::builder("telemetry").build();
    subscriber
        .register_receive_callback(Box::new(|_info, _data_type, _data| {}))
        .expect("callback registered");

    subscriber.on_sample(topic_info(), b"x", &meta(1, 1));

    let mut buf = Vec::new();
    let mut time_us = 0;
    assert_eq!(subscriber.read(&mut buf, &mut time_us, 0), Ok(false));
}

#[test]
fn test_reader_sees_samples_across_threads() {
    let subscriber = Arc::new(Subscriber::builder("telemetry").build());
    let handle = subscriber.ingress_handle();

    let writer = thread::spawn(move || {
        for clock in 1..=20i64 {
            handle.on_sample(topic_info(), format!("m{clock}").as_bytes(), &meta(clock, clock as u64));
            thread::sleep(Duration::from_millis(5));
        }
    });

    // The slot holds one payload, so a slow reader loses intermediate
    // samples; every drained payload is still a well-formed message.
    let mut buf = Vec::new();
    let mut time_us = 0;
    let mut drained = 0;
    while subscriber
        .read(&mut buf, &mut time_us, 200)
        .expect("subscriber alive")
    {
        assert!(buf.starts_with(b"m"));
        drained += 1;
        if drained >= 20 {
            break;
        }
    }
    assert!(drained >= 1, "reader drained at least one sample");

    writer.join().expect("writer thread should not panic");
}

#[test]
fn test_read_after_stop_reports_not_created() {
    let subscriber = Subscriber::builder("telemetry").build();
    subscriber.on_sample(topic_info(), b"x", &meta(1, 1));
    subscriber.stop().expect("stop succeeds");

    let mut buf = Vec::new();
    let mut time_us = 0;
    assert_eq!(
        subscriber.read(&mut buf, &mut time_us, 0),
        Err(murmur::Error::NotCreated)
    );
}
