// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Subscriber
//!
//! The [`Subscriber`] is the public surface of the data path. It owns the
//! ingress pipeline components, the known-publisher table, the callback
//! slots and the blocking read buffer, and it announces itself on the
//! registration bus at start and stop.
//!
//! ## Overview
//!
//! A subscriber:
//! - Receives payloads from the configured transport layers
//! - Suppresses cross-layer duplicates and orders samples per publisher
//! - Delivers samples to a receive callback or a blocking [`read`](Subscriber::read)
//! - Tracks publishers via registration updates and emits lifecycle events
//!
//! ## Example
//!
//! ```rust,no_run
//! use murmur::{DataTypeInformation, Subscriber};
//!
//! let subscriber = Subscriber::builder("sensors/temperature")
//!     .data_type(DataTypeInformation::new("raw", "Temperature", Vec::new()))
//!     .build();
//!
//! let mut payload = Vec::new();
//! let mut time_us = 0;
//! if subscriber.read(&mut payload, &mut time_us, 500)? {
//!     println!("got {} bytes sent at {} us", payload.len(), time_us);
//! }
//! # Ok::<(), murmur::Error>(())
//! ```
//!
//! ## Thread Safety
//!
//! All methods are callable from any thread. Receive callbacks run on the
//! transport thread that delivered the sample and are serialized across
//! layers; event callbacks run on the thread that applied the triggering
//! registration update. Neither may call back into subscriber mutators.

mod ingress;
mod snapshot;

pub use ingress::IngressHandle;

use crate::callback::{
    EventCallback, EventCallbacks, ReceiveCallback, SubscriberEvent, SubscriberEventKind,
};
use crate::config::{ProcessInfo, SubscriberConfig};
use crate::connection::{ConnectionChange, ConnectionTable};
use crate::error::{Error, Result};
use crate::ingest::{ClockTracker, FrequencyEstimator, HashDedup, ReadSlot};
use crate::layer::{ConnectionParameter, LayerBinder, SubscriptionSpec};
use crate::registration::{RegistrationProvider, RegistrationSample};
use crate::types::{
    mint_entity_id, wall_clock_us, DataTypeInformation, EntityId, LayerState, LayerStates,
    PublicationKey, SampleMeta, TopicIdentity, TopicInfo, TransportLayer,
};
use arc_swap::ArcSwap;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

// ============================================================================
// Internal state
// ============================================================================

/// State mutated only under the receive lock.
pub(crate) struct ReceiveState {
    pub(crate) callback: Option<ReceiveCallback>,
    pub(crate) dedup: HashDedup,
    pub(crate) clock: ClockTracker,
}

/// Atomic layer-state flags for one transport.
#[derive(Debug, Default)]
pub(crate) struct LayerStateCell {
    read_enabled: AtomicBool,
    write_enabled: AtomicBool,
    active: AtomicBool,
}

impl LayerStateCell {
    fn snapshot(&self) -> LayerState {
        LayerState {
            read_enabled: self.read_enabled.load(Ordering::Relaxed),
            write_enabled: self.write_enabled.load(Ordering::Relaxed),
            active: self.active.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.read_enabled.store(false, Ordering::Relaxed);
        self.write_enabled.store(false, Ordering::Relaxed);
        self.active.store(false, Ordering::Relaxed);
    }
}

/// Layer-state flags for all transports.
#[derive(Debug, Default)]
pub(crate) struct LayerStateSet {
    udp: LayerStateCell,
    shm: LayerStateCell,
    tcp: LayerStateCell,
}

impl LayerStateSet {
    pub(crate) fn cell(&self, layer: TransportLayer) -> &LayerStateCell {
        match layer {
            TransportLayer::Udp => &self.udp,
            TransportLayer::Shm => &self.shm,
            TransportLayer::Tcp => &self.tcp,
        }
    }

    pub(crate) fn latch_active(&self, layer: TransportLayer) {
        self.cell(layer).active.store(true, Ordering::Relaxed);
    }

    fn set_read_enabled(&self, layer: TransportLayer, enabled: bool) {
        self.cell(layer).read_enabled.store(enabled, Ordering::Relaxed);
    }

    /// Mirror the publisher-side write flags announced via registration.
    fn mirror_write_enabled(&self, states: &LayerStates) {
        for layer in TransportLayer::ALL {
            self.cell(layer)
                .write_enabled
                .store(states.get(layer).write_enabled, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot_of(&self, layer: TransportLayer) -> LayerState {
        self.cell(layer).snapshot()
    }

    fn reset(&self) {
        for layer in TransportLayer::ALL {
            self.cell(layer).reset();
        }
    }
}

/// Shared implementation state.
///
/// The public [`Subscriber`] handle and every [`IngressHandle`] hold an
/// `Arc` to this record, so a late transport callback arriving after the
/// handle was dropped observes `created == false` and returns cleanly.
pub(crate) struct SubscriberInner {
    pub(crate) identity: TopicIdentity,
    pub(crate) data_type_info: DataTypeInformation,
    pub(crate) config: SubscriberConfig,
    pub(crate) created: AtomicBool,

    pub(crate) receive: Mutex<ReceiveState>,
    pub(crate) filter_ids: ArcSwap<HashSet<i64>>,
    pub(crate) connections: ConnectionTable,
    pub(crate) events: EventCallbacks,
    pub(crate) read_slot: ReadSlot,
    pub(crate) frequency: Mutex<FrequencyEstimator>,
    pub(crate) layer_states: LayerStateSet,
    pub(crate) attributes: DashMap<String, String>,

    binders: Vec<Arc<dyn LayerBinder>>,
    registration: Option<Arc<dyn RegistrationProvider>>,

    /// Accepted-sample count (`dclock` in registration snapshots).
    pub(crate) read_clock: AtomicI64,
    /// Total samples lost to send-clock gaps.
    pub(crate) message_drops: AtomicI64,
    /// Size of the most recently accepted payload.
    pub(crate) topic_size: AtomicUsize,
}

impl SubscriberInner {
    pub(crate) fn is_created(&self) -> bool {
        self.created.load(Ordering::Acquire)
    }

    fn subscription_spec(&self) -> SubscriptionSpec {
        SubscriptionSpec {
            host_name: self.identity.host_name.clone(),
            topic_name: self.identity.topic_name.clone(),
            entity_id: self.identity.entity_id,
        }
    }

    pub(crate) fn fire_connection_event(
        &self,
        kind: SubscriberEventKind,
        publisher: EntityId,
        data_type_info: DataTypeInformation,
    ) {
        self.events.fire(
            &self.identity.topic_name,
            &SubscriberEvent {
                kind: Some(kind),
                time_us: wall_clock_us(),
                clock: 0,
                publisher_entity_id: Some(publisher),
                publisher_data_type: Some(data_type_info),
            },
        );
    }

    pub(crate) fn fire_disconnected(&self) {
        self.events.fire(
            &self.identity.topic_name,
            &SubscriberEvent {
                kind: Some(SubscriberEventKind::Disconnected),
                time_us: wall_clock_us(),
                clock: 0,
                publisher_entity_id: None,
                publisher_data_type: None,
            },
        );
    }

    pub(crate) fn fire_dropped(&self, clock_at_gap: i64) {
        self.events.fire(
            &self.identity.topic_name,
            &SubscriberEvent {
                kind: Some(SubscriberEventKind::Dropped),
                time_us: wall_clock_us(),
                clock: clock_at_gap,
                publisher_entity_id: None,
                publisher_data_type: None,
            },
        );
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Subscriber`].
pub struct SubscriberBuilder {
    topic_name: String,
    data_type_info: DataTypeInformation,
    config: SubscriberConfig,
    process: ProcessInfo,
    binders: Vec<Arc<dyn LayerBinder>>,
    registration: Option<Arc<dyn RegistrationProvider>>,
}

impl SubscriberBuilder {
    fn new(topic_name: impl Into<String>) -> Self {
        Self {
            topic_name: topic_name.into(),
            data_type_info: DataTypeInformation::default(),
            config: SubscriberConfig::default(),
            process: ProcessInfo::default(),
            binders: Vec::new(),
            registration: None,
        }
    }

    /// Data type this subscriber expects; shared in registration snapshots.
    #[must_use]
    pub fn data_type(mut self, info: DataTypeInformation) -> Self {
        self.data_type_info = info;
        self
    }

    #[must_use]
    pub fn config(mut self, config: SubscriberConfig) -> Self {
        self.config = config;
        self
    }

    /// Identity of the hosting process, stamped into snapshots.
    #[must_use]
    pub fn process(mut self, process: ProcessInfo) -> Self {
        self.process = process;
        self
    }

    /// Attach a transport layer binder. Binders for layers disabled in the
    /// configuration are kept but never started.
    #[must_use]
    pub fn binder(mut self, binder: Arc<dyn LayerBinder>) -> Self {
        self.binders.push(binder);
        self
    }

    /// Sink for registration snapshots (start, stop, on demand).
    #[must_use]
    pub fn registration_provider(mut self, provider: Arc<dyn RegistrationProvider>) -> Self {
        self.registration = Some(provider);
        self
    }

    /// Create the subscriber: mint its entity id, start the enabled
    /// transport layers and emit the initial registration snapshot.
    #[must_use]
    pub fn build(self) -> Subscriber {
        let entity_id = mint_entity_id();
        let identity = TopicIdentity {
            host_name: self.process.host_name,
            host_group_name: self.process.host_group_name,
            process_id: self.process.process_id,
            process_name: self.process.process_name,
            unit_name: self.process.unit_name,
            topic_name: self.topic_name,
            entity_id,
        };

        log::debug!(
            "[sub] create topic='{}' entity_id={}",
            identity.topic_name,
            identity.entity_id
        );

        let drop_out_of_order = self.config.drop_out_of_order_messages;
        let inner = Arc::new(SubscriberInner {
            identity,
            data_type_info: self.data_type_info,
            config: self.config,
            created: AtomicBool::new(true),
            receive: Mutex::new(ReceiveState {
                callback: None,
                dedup: HashDedup::new(),
                clock: ClockTracker::new(drop_out_of_order),
            }),
            filter_ids: ArcSwap::from_pointee(HashSet::new()),
            connections: ConnectionTable::new(),
            events: EventCallbacks::new(),
            read_slot: ReadSlot::new(),
            frequency: Mutex::new(FrequencyEstimator::new()),
            layer_states: LayerStateSet::default(),
            attributes: DashMap::new(),
            binders: self.binders,
            registration: self.registration,
            read_clock: AtomicI64::new(0),
            message_drops: AtomicI64::new(0),
            topic_size: AtomicUsize::new(0),
        });

        let subscriber = Subscriber { inner };
        subscriber.start_transport_layers();

        if let Some(provider) = &subscriber.inner.registration {
            provider.register(&snapshot::build_registration_sample(&subscriber.inner));
        }

        subscriber
    }
}

// ============================================================================
// Subscriber
// ============================================================================

/// Counters exposed for monitoring and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscriberStats {
    /// Samples that passed dedup, filter and clock checks.
    pub samples_accepted: i64,
    /// Total samples lost to send-clock gaps.
    pub message_drops: i64,
    /// Size of the most recently accepted payload.
    pub topic_size: usize,
}

/// Subscriber endpoint of one topic.
///
/// Dropping the handle stops the subscriber; transports holding an
/// [`IngressHandle`] afterwards see their samples ignored.
pub struct Subscriber {
    inner: Arc<SubscriberInner>,
}

impl Subscriber {
    /// Start building a subscriber for `topic_name`.
    #[must_use]
    pub fn builder(topic_name: impl Into<String>) -> SubscriberBuilder {
        SubscriberBuilder::new(topic_name)
    }

    /// Handle for transport layers to feed samples into the pipeline.
    #[must_use]
    pub fn ingress_handle(&self) -> IngressHandle {
        IngressHandle::new(Arc::clone(&self.inner))
    }

    /// Feed one sample into the ingress pipeline.
    ///
    /// Safe to call from any thread without external synchronization; the
    /// returned byte count is informational (0 for every rejection except
    /// cross-layer duplicates, which report the payload as consumed).
    #[inline]
    pub fn on_sample(&self, info: TopicInfo<'_>, payload: &[u8], meta: &SampleMeta) -> usize {
        self.inner.apply_sample(info, payload, meta)
    }

    /// Stop the subscriber: withdraw layer subscriptions, drop callbacks,
    /// emit the unregistration record. Idempotent; the second call reports
    /// [`Error::NotCreated`].
    pub fn stop(&self) -> Result<()> {
        // Flip `created` under the receive lock: in-flight ingress that
        // already holds the lock finishes first, everything after observes
        // the stopped state before touching any callback.
        {
            let mut receive = self.inner.receive.lock();
            if self
                .inner
                .created
                .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return Err(Error::NotCreated);
            }
            receive.callback = None;
            receive.dedup.clear();
            receive.clock.clear();
        }

        log::debug!("[sub] stop topic='{}'", self.inner.identity.topic_name);

        self.stop_transport_layers();
        self.inner.events.clear();
        self.inner.read_slot.clear();
        self.inner.frequency.lock().clear();

        if let Some(provider) = &self.inner.registration {
            provider.unregister(&snapshot::build_unregistration_sample(&self.inner));
        }

        self.inner.connections.clear();
        self.inner.layer_states.reset();
        Ok(())
    }

    /// Blocking read of the next buffered payload.
    ///
    /// `timeout_ms < 0` waits indefinitely, `0` polls, `> 0` waits up to
    /// that many milliseconds. On success the payload is moved into `buf`,
    /// the publisher send time into `time_us`, and `Ok(true)` is returned.
    /// An installed receive callback starves this path by design.
    pub fn read(&self, buf: &mut Vec<u8>, time_us: &mut i64, timeout_ms: i32) -> Result<bool> {
        self.ensure_created()?;
        Ok(self.inner.read_slot.take(buf, time_us, timeout_ms))
    }

    /// Install the receive callback, replacing any previous one.
    ///
    /// While installed, accepted samples bypass the read buffer and are
    /// delivered synchronously on the transport thread. The callback must
    /// return promptly and must not panic or call subscriber mutators.
    pub fn register_receive_callback(&self, callback: ReceiveCallback) -> Result<()> {
        self.ensure_created()?;
        let mut receive = self.inner.receive.lock();
        receive.callback = Some(callback);
        Ok(())
    }

    /// Remove the receive callback; delivery falls back to the read buffer.
    pub fn unregister_receive_callback(&self) -> Result<()> {
        self.ensure_created()?;
        let mut receive = self.inner.receive.lock();
        receive.callback = None;
        Ok(())
    }

    /// Install the event callback for `kind`, replacing any previous one.
    ///
    /// Event callbacks run under the event-map lock and must not call back
    /// into subscriber mutators.
    pub fn register_event_callback(
        &self,
        kind: SubscriberEventKind,
        callback: EventCallback,
    ) -> Result<()> {
        self.ensure_created()?;
        self.inner.events.register(kind, callback);
        Ok(())
    }

    /// Remove the event callback for `kind`.
    pub fn unregister_event_callback(&self, kind: SubscriberEventKind) -> Result<()> {
        self.ensure_created()?;
        self.inner.events.unregister(kind);
        Ok(())
    }

    /// Restrict delivery to samples whose filter id is in `ids`.
    /// An empty set accepts everything.
    pub fn set_filter_ids(&self, ids: HashSet<i64>) -> Result<()> {
        self.ensure_created()?;
        self.inner.filter_ids.store(Arc::new(ids));
        Ok(())
    }

    /// Set a user attribute carried in registration snapshots.
    pub fn set_attribute(&self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.ensure_created()?;
        self.inner.attributes.insert(name.into(), value.into());
        Ok(())
    }

    /// Remove a user attribute.
    pub fn clear_attribute(&self, name: &str) -> Result<()> {
        self.ensure_created()?;
        self.inner.attributes.remove(name);
        Ok(())
    }

    // ========================================================================
    // Registration inputs
    // ========================================================================

    /// Apply publication info for a publisher of this topic.
    ///
    /// The first touch puts the publisher on probation; the second
    /// activates it and fires `connected`; later touches fire
    /// `update_connection`. Events fire outside the table lock.
    pub fn apply_publication(
        &self,
        key: PublicationKey,
        data_type_info: DataTypeInformation,
        layer_states: LayerStates,
    ) -> Result<()> {
        self.ensure_created()?;

        self.inner.layer_states.mirror_write_enabled(&layer_states);
        let change = self
            .inner
            .connections
            .apply(key.clone(), data_type_info.clone(), layer_states);

        log::debug!(
            "[sub] apply_publication topic='{}' publisher={} change={:?}",
            self.inner.identity.topic_name,
            key.entity_id,
            change
        );

        match change {
            ConnectionChange::Pending => {}
            ConnectionChange::Connected => self.inner.fire_connection_event(
                SubscriberEventKind::Connected,
                key.entity_id,
                data_type_info,
            ),
            ConnectionChange::Updated => self.inner.fire_connection_event(
                SubscriberEventKind::UpdateConnection,
                key.entity_id,
                data_type_info,
            ),
        }
        Ok(())
    }

    /// Remove a publisher. Fires `disconnected` exactly when the removal
    /// drops the active-publisher count to zero.
    pub fn remove_publication(&self, key: &PublicationKey) -> Result<()> {
        self.ensure_created()?;

        let last_gone = self.inner.connections.remove(key);
        log::debug!(
            "[sub] remove_publication topic='{}' publisher={} last_gone={}",
            self.inner.identity.topic_name,
            key.entity_id,
            last_gone
        );

        if last_gone {
            self.inner.fire_disconnected();
        }
        Ok(())
    }

    /// Forward publisher connection parameters to the named layer's binder.
    pub fn apply_layer_parameter(
        &self,
        key: &PublicationKey,
        layer: TransportLayer,
        parameter: &[u8],
    ) -> Result<()> {
        self.ensure_created()?;

        if let Some(binder) = self.inner.binders.iter().find(|b| b.layer() == layer) {
            binder.apply_connection_parameter(&ConnectionParameter {
                host_name: key.host_name.clone(),
                process_id: key.process_id,
                topic_name: self.inner.identity.topic_name.clone(),
                entity_id: key.entity_id,
                parameter: parameter.to_vec(),
            });
        }
        Ok(())
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Registration snapshot of the current state, on demand.
    #[must_use]
    pub fn registration_sample(&self) -> RegistrationSample {
        snapshot::build_registration_sample(&self.inner)
    }

    /// Whether at least one publisher is active on this topic.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.inner.connections.active_count() > 0
    }

    /// Number of active publishers.
    #[must_use]
    pub fn publisher_count(&self) -> usize {
        self.inner.connections.active_count()
    }

    /// Accepted-sample rate over the rolling window, in millihertz.
    #[must_use]
    pub fn frequency_millihertz(&self) -> i64 {
        self.inner.frequency.lock().frequency_millihertz(Instant::now())
    }

    #[must_use]
    pub fn stats(&self) -> SubscriberStats {
        SubscriberStats {
            samples_accepted: self.inner.read_clock.load(Ordering::Relaxed),
            message_drops: self.inner.message_drops.load(Ordering::Relaxed),
            topic_size: self.inner.topic_size.load(Ordering::Relaxed),
        }
    }

    #[must_use]
    pub fn identity(&self) -> &TopicIdentity {
        &self.inner.identity
    }

    #[must_use]
    pub fn topic_name(&self) -> &str {
        &self.inner.identity.topic_name
    }

    #[must_use]
    pub fn entity_id(&self) -> EntityId {
        self.inner.identity.entity_id
    }

    #[must_use]
    pub fn is_created(&self) -> bool {
        self.inner.is_created()
    }

    /// Multi-line human-readable state dump for debugging.
    #[must_use]
    pub fn dump(&self) -> String {
        snapshot::dump(&self.inner)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn ensure_created(&self) -> Result<()> {
        if self.inner.is_created() {
            Ok(())
        } else {
            Err(Error::NotCreated)
        }
    }

    fn start_transport_layers(&self) {
        let spec = self.inner.subscription_spec();
        for layer in TransportLayer::ALL {
            if !self.inner.config.layer_enabled(layer) {
                continue;
            }
            self.inner.layer_states.set_read_enabled(layer, true);
            if let Some(binder) = self.inner.binders.iter().find(|b| b.layer() == layer) {
                binder.add_subscription(&spec, self.ingress_handle());
            }
        }
    }

    fn stop_transport_layers(&self) {
        let spec = self.inner.subscription_spec();
        for layer in TransportLayer::ALL {
            if !self.inner.config.layer_enabled(layer) {
                continue;
            }
            self.inner.layer_states.set_read_enabled(layer, false);
            if let Some(binder) = self.inner.binders.iter().find(|b| b.layer() == layer) {
                binder.remove_subscription(&spec);
            }
        }
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscriber")
            .field("topic_name", &self.inner.identity.topic_name)
            .field("entity_id", &self.inner.identity.entity_id)
            .field("created", &self.inner.is_created())
            .finish()
    }
}
