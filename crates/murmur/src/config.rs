// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscriber configuration and process identity.
//!
//! The core consumes exactly the options listed here; transport-specific
//! tuning (socket buffers, ring sizes, ports) lives with the layer binders
//! and never reaches the ingress pipeline.

use crate::types::TransportLayer;

/// Per-transport enable switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    pub enable: bool,
}

impl TransportConfig {
    #[must_use]
    pub fn enabled() -> Self {
        Self { enable: true }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self { enable: false }
    }
}

/// Configuration options consumed by the subscriber core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberConfig {
    pub udp: TransportConfig,
    pub shm: TransportConfig,
    pub tcp: TransportConfig,
    /// Reject samples whose send clock is behind the last accepted one.
    /// When false, late samples are delivered with a logged warning.
    pub drop_out_of_order_messages: bool,
    /// Share encoding/type name in registration snapshots.
    pub share_topic_type: bool,
    /// Share the descriptor blob in registration snapshots.
    pub share_topic_description: bool,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            udp: TransportConfig::enabled(),
            shm: TransportConfig::enabled(),
            tcp: TransportConfig::disabled(),
            drop_out_of_order_messages: false,
            share_topic_type: true,
            share_topic_description: true,
        }
    }
}

impl SubscriberConfig {
    /// Whether the given transport layer accepts samples.
    #[must_use]
    #[inline]
    pub fn layer_enabled(&self, layer: TransportLayer) -> bool {
        match layer {
            TransportLayer::Udp => self.udp.enable,
            TransportLayer::Shm => self.shm.enable,
            TransportLayer::Tcp => self.tcp.enable,
        }
    }
}

/// Identity of the hosting process, stamped into registration snapshots.
///
/// The surrounding runtime fills these in; the core never consults the OS
/// for host or process names itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub host_name: String,
    pub host_group_name: String,
    pub process_id: i32,
    pub process_name: String,
    pub unit_name: String,
}

impl Default for ProcessInfo {
    fn default() -> Self {
        Self {
            host_name: String::new(),
            host_group_name: String::new(),
            process_id: std::process::id() as i32,
            process_name: String::new(),
            unit_name: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_layers() {
        let config = SubscriberConfig::default();
        assert!(config.layer_enabled(TransportLayer::Udp));
        assert!(config.layer_enabled(TransportLayer::Shm));
        assert!(!config.layer_enabled(TransportLayer::Tcp));
    }

    #[test]
    fn test_default_config_policies() {
        let config = SubscriberConfig::default();
        assert!(!config.drop_out_of_order_messages);
        assert!(config.share_topic_type);
        assert!(config.share_topic_description);
    }

    #[test]
    fn test_layer_enabled_respects_switches() {
        let config = SubscriberConfig {
            udp: TransportConfig::disabled(),
            shm: TransportConfig::disabled(),
            tcp: TransportConfig::enabled(),
            ..SubscriberConfig::default()
        };
        assert!(!config.layer_enabled(TransportLayer::Udp));
        assert!(!config.layer_enabled(TransportLayer::Shm));
        assert!(config.layer_enabled(TransportLayer::Tcp));
    }

    #[test]
    fn test_process_info_default_pid() {
        let info = ProcessInfo::default();
        assert_eq!(info.process_id, std::process::id() as i32);
    }
}
