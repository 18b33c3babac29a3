// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pluggable transport layer binders.
//!
//! A binder owns the subscription lifecycle of one transport (udp, shm or
//! tcp): the subscriber announces interest in a topic at start, withdraws
//! it at stop, and forwards publisher connection parameters verbatim. The
//! ingress pipeline itself is transport-agnostic; binders feed it through
//! [`IngressHandle::on_sample`](crate::subscriber::IngressHandle::on_sample).

use crate::subscriber::IngressHandle;
use crate::types::{EntityId, TransportLayer};

/// Subscription key announced to a transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionSpec {
    pub host_name: String,
    pub topic_name: String,
    pub entity_id: EntityId,
}

/// Publisher connection parameters forwarded to a layer binder.
///
/// `parameter` is an opaque blob produced by the publisher's matching
/// layer (e.g. a shared-memory segment name or a TCP port); the core
/// never interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParameter {
    pub host_name: String,
    pub process_id: i32,
    pub topic_name: String,
    pub entity_id: EntityId,
    pub parameter: Vec<u8>,
}

/// One transport layer's subscription surface.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`: subscriptions are managed from
/// user threads while connection parameters arrive on the registration
/// thread.
pub trait LayerBinder: Send + Sync {
    /// The transport layer this binder serves.
    fn layer(&self) -> TransportLayer;

    /// Announce a subscription to this layer.
    ///
    /// `ingress` is the sink for samples matching `spec`; the binder keeps
    /// it for as long as the subscription stands. Feeding it after the
    /// subscriber stopped is harmless (samples are ignored).
    fn add_subscription(&self, spec: &SubscriptionSpec, ingress: IngressHandle);

    /// Withdraw a previously announced subscription.
    fn remove_subscription(&self, spec: &SubscriptionSpec);

    /// Apply publisher connection parameters.
    ///
    /// Layers without per-connection setup (e.g. multicast udp) keep the
    /// default no-op.
    fn apply_connection_parameter(&self, parameter: &ConnectionParameter) {
        let _ = parameter;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriber::Subscriber;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingBinder {
        added: Mutex<Vec<(SubscriptionSpec, IngressHandle)>>,
        parameters: Mutex<Vec<ConnectionParameter>>,
    }

    impl LayerBinder for RecordingBinder {
        fn layer(&self) -> TransportLayer {
            TransportLayer::Shm
        }

        fn add_subscription(&self, spec: &SubscriptionSpec, ingress: IngressHandle) {
            self.added.lock().push((spec.clone(), ingress));
        }

        fn remove_subscription(&self, spec: &SubscriptionSpec) {
            self.added.lock().retain(|(s, _)| s != spec);
        }

        fn apply_connection_parameter(&self, parameter: &ConnectionParameter) {
            self.parameters.lock().push(parameter.clone());
        }
    }

    #[test]
    fn test_binder_receives_spec_and_ingress_on_start() {
        let binder = Arc::new(RecordingBinder::default());
        let subscriber = Subscriber::builder("telemetry").binder(binder.clone()).build();

        {
            let added = binder.added.lock();
            assert_eq!(added.len(), 1);
            assert_eq!(added[0].0.topic_name, "telemetry");
            assert_eq!(added[0].0.entity_id, subscriber.entity_id());
            assert_eq!(added[0].1.topic_name(), "telemetry");
        }

        subscriber.stop().expect("stop succeeds");
        assert!(binder.added.lock().is_empty());
    }

    #[test]
    fn test_connection_parameter_forwarded_verbatim() {
        let binder = RecordingBinder::default();
        let parameter = ConnectionParameter {
            host_name: "host".to_string(),
            process_id: 3,
            topic_name: "telemetry".to_string(),
            entity_id: 12,
            parameter: vec![0xDE, 0xAD],
        };

        binder.apply_connection_parameter(&parameter);
        assert_eq!(binder.parameters.lock()[0].parameter, vec![0xDE, 0xAD]);
    }

    struct NoOpBinder;

    impl LayerBinder for NoOpBinder {
        fn layer(&self) -> TransportLayer {
            TransportLayer::Udp
        }
        fn add_subscription(&self, _spec: &SubscriptionSpec, _ingress: IngressHandle) {}
        fn remove_subscription(&self, _spec: &SubscriptionSpec) {}
    }

    #[test]
    fn test_default_parameter_handler_is_noop() {
        let binder = NoOpBinder;
        binder.apply_connection_parameter(&ConnectionParameter {
            host_name: String::new(),
            process_id: 0,
            topic_name: String::new(),
            entity_id: 0,
            parameter: Vec::new(),
        });
    }
}
