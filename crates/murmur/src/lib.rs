// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # murmur - host-local publish/subscribe middleware
//!
//! This crate implements the murmur **subscriber data path**: the component
//! that receives payloads from multiple concurrent transport layers,
//! deduplicates and orders them against a per-publisher clock, delivers
//! them to user callbacks or a blocking read buffer, tracks the set of
//! active publishers via registration updates, and emits connection
//! lifecycle events.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use murmur::{DataTypeInformation, Subscriber};
//!
//! let subscriber = Subscriber::builder("sensors/temperature")
//!     .data_type(DataTypeInformation::new("raw", "Temperature", Vec::new()))
//!     .build();
//!
//! subscriber.register_receive_callback(Box::new(|info, _data_type, data| {
//!     println!("{}: {} bytes (clock {})", info.topic_name, data.payload.len(), data.send_clock);
//! }))?;
//! # Ok::<(), murmur::Error>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------------+
//! |                        transport threads                           |
//! |     udp binder      |      shm binder      |      tcp binder       |
//! +--------------------------------------------------------------------+
//!                 v on_sample (receive lock held)
//! +--------------------------------------------------------------------+
//! |  HashDedup -> filter set -> ClockTracker -> FrequencyEstimator     |
//! +--------------------------------------------------------------------+
//!        v receive callback            v no callback installed
//! +----------------------+    +----------------------------------+
//! |  user callback       |    |  ReadSlot -> blocking read()     |
//! +----------------------+    +----------------------------------+
//!
//! registration thread -> apply/remove publication -> ConnectionTable
//!                                 v
//!             connected / update_connection / disconnected events
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Subscriber`] | Topic endpoint; owns the whole data path |
//! | [`IngressHandle`] | Cloneable sample entry point for transports |
//! | [`LayerBinder`] | Pluggable per-transport subscription surface |
//! | [`RegistrationProvider`] | Sink for registration snapshots |
//! | [`SubscriberEventKind`] | Connection lifecycle event kinds |
//!
//! ## Delivery Guarantees
//!
//! - Per publisher, accepted samples follow the send clock; gaps are
//!   reported (via `dropped` events) before the first post-gap delivery.
//! - A payload seen on one layer is suppressed on every other layer for a
//!   window of 64 subsequent samples.
//! - Across publishers samples interleave in arrival order; there is no
//!   global order and no causal ordering between discovery and data.

/// Receive and event callback types.
pub mod callback;
/// Subscriber configuration and process identity.
pub mod config;
/// Known-publisher table with two-touch activation.
pub mod connection;
/// Error type for subscriber operations.
pub mod error;
/// Ingress-side pipeline components (dedup, clock, frequency, read slot).
pub mod ingest;
/// Transport layer binder trait.
pub mod layer;
/// Registration snapshot records and the provider trait.
pub mod registration;
/// The subscriber orchestrator.
pub mod subscriber;
/// Core identifier and metadata types.
pub mod types;

pub use callback::{
    EventCallback, ReceiveCallback, ReceivedData, SubscriberEvent, SubscriberEventKind,
};
pub use config::{ProcessInfo, SubscriberConfig, TransportConfig};
pub use connection::{ConnectionChange, ConnectionTable, PublisherState};
pub use error::{Error, Result};
pub use layer::{ConnectionParameter, LayerBinder, SubscriptionSpec};
pub use registration::{
    LayerRecord, RegistrationCommand, RegistrationProvider, RegistrationSample, SampleIdentifier,
    TRANSPORT_LAYER_VERSION,
};
pub use subscriber::{IngressHandle, Subscriber, SubscriberBuilder, SubscriberStats};
pub use types::{
    DataTypeInformation, EntityId, LayerState, LayerStates, PublicationKey, SampleMeta,
    TopicIdentity, TopicInfo, TransportLayer,
};
