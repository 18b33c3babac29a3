// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Core identifier and metadata types shared across the subscriber data path.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// Process-unique entity identifier, minted from a monotonic clock reading.
pub type EntityId = i64;

/// Transport layers a sample can arrive on.
///
/// Each layer is an independent ingress source with its own loss and
/// duplication characteristics; the ingress pipeline branches only on this
/// enum and never on a concrete transport implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportLayer {
    Udp,
    Shm,
    Tcp,
}

impl TransportLayer {
    /// All layers, in registration-record order.
    pub const ALL: [TransportLayer; 3] = [TransportLayer::Udp, TransportLayer::Shm, TransportLayer::Tcp];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportLayer::Udp => "udp",
            TransportLayer::Shm => "shm",
            TransportLayer::Tcp => "tcp",
        }
    }
}

impl std::fmt::Display for TransportLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data type description carried by publishers and subscribers.
///
/// The descriptor is an opaque schema blob (e.g. a serialized message
/// descriptor); the core never interprets it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTypeInformation {
    pub encoding: String,
    pub type_name: String,
    pub descriptor: Vec<u8>,
}

impl DataTypeInformation {
    #[must_use]
    pub fn new(encoding: impl Into<String>, type_name: impl Into<String>, descriptor: Vec<u8>) -> Self {
        Self {
            encoding: encoding.into(),
            type_name: type_name.into(),
            descriptor,
        }
    }
}

/// Full identity of this subscriber endpoint. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicIdentity {
    pub host_name: String,
    pub host_group_name: String,
    pub process_id: i32,
    pub process_name: String,
    pub unit_name: String,
    pub topic_name: String,
    pub entity_id: EntityId,
}

/// Identity of a remote publisher as carried by registration updates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublicationKey {
    pub host_name: String,
    pub process_id: i32,
    pub entity_id: EntityId,
}

/// Publisher identity attached to every arriving sample.
///
/// Borrowed view: transports own the strings for the duration of the
/// ingress call, and receive callbacks observe the same borrow.
#[derive(Debug, Clone, Copy)]
pub struct TopicInfo<'a> {
    pub topic_name: &'a str,
    pub host_name: &'a str,
    pub process_id: i32,
    pub entity_id: EntityId,
}

impl TopicInfo<'_> {
    /// Publication key of the originating publisher.
    #[must_use]
    pub fn publication_key(&self) -> PublicationKey {
        PublicationKey {
            host_name: self.host_name.to_string(),
            process_id: self.process_id,
            entity_id: self.entity_id,
        }
    }
}

/// Per-sample metadata attached by the sending publisher and the transport.
#[derive(Debug, Clone, Copy)]
pub struct SampleMeta {
    /// Publisher-assigned filter id (0 if unused).
    pub filter_id: i64,
    /// Publisher send counter, incremented once per sent sample.
    pub send_clock: i64,
    /// Publisher send time in microseconds.
    pub send_time_us: i64,
    /// Payload fingerprint used for cross-layer duplicate suppression.
    pub payload_hash: u64,
    /// Layer this copy of the sample arrived on.
    pub layer: TransportLayer,
}

/// Read/write/active state of one transport layer, one direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerState {
    pub read_enabled: bool,
    pub write_enabled: bool,
    /// Latched true on first accepted sample; cleared only at subscriber stop.
    pub active: bool,
}

/// Layer states for all transports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerStates {
    pub udp: LayerState,
    pub shm: LayerState,
    pub tcp: LayerState,
}

impl LayerStates {
    #[must_use]
    pub fn get(&self, layer: TransportLayer) -> &LayerState {
        match layer {
            TransportLayer::Udp => &self.udp,
            TransportLayer::Shm => &self.shm,
            TransportLayer::Tcp => &self.tcp,
        }
    }

    pub fn get_mut(&mut self, layer: TransportLayer) -> &mut LayerState {
        match layer {
            TransportLayer::Udp => &mut self.udp,
            TransportLayer::Shm => &mut self.shm,
            TransportLayer::Tcp => &mut self.tcp,
        }
    }
}

static ENTITY_CLOCK_ORIGIN: OnceLock<Instant> = OnceLock::new();
static LAST_ENTITY_ID: AtomicI64 = AtomicI64::new(0);

/// Mint a process-unique entity id from a monotonic clock reading.
///
/// Two construction sites racing on the same nanosecond still receive
/// distinct ids: the returned value is forced strictly above every id
/// handed out before it.
#[must_use]
pub fn mint_entity_id() -> EntityId {
    let origin = ENTITY_CLOCK_ORIGIN.get_or_init(Instant::now);
    let reading = origin.elapsed().as_nanos() as i64 + 1;

    let mut last = LAST_ENTITY_ID.load(Ordering::Relaxed);
    loop {
        let next = reading.max(last + 1);
        match LAST_ENTITY_ID.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(observed) => last = observed,
        }
    }
}

/// Wall-clock microseconds since the Unix epoch, for event timestamps.
#[must_use]
pub(crate) fn wall_clock_us() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or(0)
}
