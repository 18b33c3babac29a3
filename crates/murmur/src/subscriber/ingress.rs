// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The ingress pipeline: what happens to every arriving sample.
//!
//! Runs on transport threads under the receive lock, which serializes
//! transports against each other and against callback registration. The
//! stage order is fixed: created check, layer check, active latch, dedup,
//! filter, clock, counters, delivery. Dedup runs before the clock tracker
//! so a cross-layer duplicate never perturbs the publisher clock cursor.

use super::SubscriberInner;
use crate::callback::ReceivedData;
use crate::ingest::ClockVerdict;
use crate::types::{SampleMeta, TopicInfo};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// Cloneable ingress endpoint handed to transport layers.
///
/// Holds shared ownership of the subscriber state: a late sample arriving
/// after the public handle was dropped observes the stopped subscriber and
/// is ignored, it never dangles.
#[derive(Clone)]
pub struct IngressHandle {
    inner: Arc<SubscriberInner>,
}

impl IngressHandle {
    pub(crate) fn new(inner: Arc<SubscriberInner>) -> Self {
        Self { inner }
    }

    /// Feed one sample into the pipeline.
    ///
    /// See [`Subscriber::on_sample`](crate::Subscriber::on_sample).
    #[inline]
    pub fn on_sample(&self, info: TopicInfo<'_>, payload: &[u8], meta: &SampleMeta) -> usize {
        self.inner.apply_sample(info, payload, meta)
    }

    /// Topic this handle feeds.
    #[must_use]
    pub fn topic_name(&self) -> &str {
        &self.inner.identity.topic_name
    }
}

impl std::fmt::Debug for IngressHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngressHandle")
            .field("topic_name", &self.inner.identity.topic_name)
            .finish()
    }
}

impl SubscriberInner {
    /// Run one sample through the pipeline.
    ///
    /// # Performance
    /// HOT PATH: called for every sample copy on every transport.
    pub(crate) fn apply_sample(
        &self,
        info: TopicInfo<'_>,
        payload: &[u8],
        meta: &SampleMeta,
    ) -> usize {
        let mut receive = self.receive.lock();
        if !self.is_created() {
            return 0;
        }

        if !self.config.layer_enabled(meta.layer) {
            return 0;
        }

        self.layer_states.latch_active(meta.layer);

        // A hash already in the window means this payload was received
        // recently, most likely on another transport layer. Report the
        // bytes as consumed but deliver nothing.
        if receive.dedup.check_and_insert(meta.payload_hash) {
            log::debug!(
                "[ingress] topic='{}' discard sample, multiple receive (hash={:#018x})",
                self.identity.topic_name,
                meta.payload_hash
            );
            return payload.len();
        }

        let filter = self.filter_ids.load();
        if !filter.is_empty() && !filter.contains(&meta.filter_id) {
            return 0;
        }

        match receive.clock.classify(info.entity_id, meta.send_clock) {
            ClockVerdict::RejectDuplicate | ClockVerdict::RejectOutOfOrder => return 0,
            ClockVerdict::AcceptWithGap { lost } => {
                log::debug!(
                    "[ingress] topic='{}' publisher={} lost {} samples before clock {}",
                    self.identity.topic_name,
                    info.entity_id,
                    lost,
                    meta.send_clock
                );
                self.message_drops.fetch_add(lost, Ordering::Relaxed);
                // Report the gap before the post-gap sample becomes visible.
                self.fire_dropped(meta.send_clock);
            }
            ClockVerdict::AcceptOutOfOrder => {
                log::warn!(
                    "[ingress] topic='{}' received a message in the wrong order",
                    self.identity.topic_name
                );
            }
            ClockVerdict::Accept => {}
        }

        self.read_clock.fetch_add(1, Ordering::Relaxed);
        self.frequency.lock().tick(Instant::now());
        self.topic_size.store(payload.len(), Ordering::Relaxed);

        if let Some(callback) = receive.callback.as_ref() {
            let data_type_info = self
                .connections
                .data_type_of(&info.publication_key())
                .unwrap_or_default();
            let data = ReceivedData {
                payload,
                filter_id: meta.filter_id,
                send_time_us: meta.send_time_us,
                send_clock: meta.send_clock,
            };
            callback(info, &data_type_info, &data);
        } else {
            self.read_slot.publish(payload, meta.send_time_us);
        }

        payload.len()
    }
}
