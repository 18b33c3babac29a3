// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registration snapshot records.
//!
//! A subscriber describes itself to the registration bus with one record
//! emitted at start, at stop and on demand. The bus transport and its
//! serialization are external; the record itself round-trips losslessly
//! through serde so any self-describing format can carry it.

use crate::types::{DataTypeInformation, EntityId, TransportLayer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version of the transport layer protocol carried in layer records.
pub const TRANSPORT_LAYER_VERSION: u32 = 1;

/// Registration command kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationCommand {
    RegisterSubscriber,
    UnregisterSubscriber,
}

/// Unique identifier of the emitting endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleIdentifier {
    pub process_id: i32,
    pub host_name: String,
    pub entity_id: EntityId,
}

/// Per-layer state as announced on the registration bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRecord {
    pub layer: TransportLayer,
    pub version: u32,
    pub enabled: bool,
    pub active: bool,
}

/// Snapshot of one subscriber's state for the registration bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationSample {
    pub cmd_type: RegistrationCommand,
    pub identifier: SampleIdentifier,
    pub host_group_name: String,
    pub topic_name: String,
    /// Populated per the `share_topic_type` / `share_topic_description`
    /// configuration flags; empty fields otherwise.
    pub data_type_info: DataTypeInformation,
    pub attributes: BTreeMap<String, String>,
    /// Size of the most recently accepted payload.
    pub topic_size: i32,
    pub layers: Vec<LayerRecord>,
    pub process_name: String,
    pub unit_name: String,
    /// Accepted-sample count.
    pub dclock: i64,
    /// Accepted-sample rate in millihertz.
    pub dfreq: i64,
    /// Total samples lost to send-clock gaps.
    pub message_drops: i64,
}

/// Sink for registration records.
///
/// Passed to the subscriber at construction; there is no process-global
/// provider, which keeps multiple independent subscriber instances (and
/// their tests) isolated.
pub trait RegistrationProvider: Send + Sync {
    /// A subscriber announced itself (construction, or on demand).
    fn register(&self, sample: &RegistrationSample);

    /// A subscriber withdrew (stop).
    fn unregister(&self, sample: &RegistrationSample);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_record_fields() {
        let record = LayerRecord {
            layer: TransportLayer::Tcp,
            version: TRANSPORT_LAYER_VERSION,
            enabled: true,
            active: false,
        };
        assert_eq!(record.layer, TransportLayer::Tcp);
        assert_eq!(record.version, 1);
    }

    #[test]
    fn test_sample_serde_round_trip() {
        let sample = RegistrationSample {
            cmd_type: RegistrationCommand::RegisterSubscriber,
            identifier: SampleIdentifier {
                process_id: 7,
                host_name: "node-a".to_string(),
                entity_id: 4711,
            },
            host_group_name: "rack-1".to_string(),
            topic_name: "telemetry".to_string(),
            data_type_info: DataTypeInformation::new("proto", "Telemetry", vec![1, 2, 3]),
            attributes: BTreeMap::from([("unit".to_string(), "celsius".to_string())]),
            topic_size: 128,
            layers: vec![LayerRecord {
                layer: TransportLayer::Udp,
                version: TRANSPORT_LAYER_VERSION,
                enabled: true,
                active: true,
            }],
            process_name: "sensor_node".to_string(),
            unit_name: "sensor".to_string(),
            dclock: 42,
            dfreq: 10_000,
            message_drops: 3,
        };

        let json = serde_json::to_string(&sample).expect("serialize");
        let restored: RegistrationSample = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, sample);
    }
}
