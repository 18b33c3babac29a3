// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registration snapshot assembly and the debug dump.

use super::SubscriberInner;
use crate::registration::{
    LayerRecord, RegistrationCommand, RegistrationSample, SampleIdentifier,
    TRANSPORT_LAYER_VERSION,
};
use crate::types::{DataTypeInformation, TransportLayer};
use std::fmt::Write as _;
use std::sync::atomic::Ordering;
use std::time::Instant;

/// Assemble the registration record describing the current state.
pub(crate) fn build_registration_sample(inner: &SubscriberInner) -> RegistrationSample {
    let identity = &inner.identity;

    // Type and descriptor travel only when sharing is configured.
    let mut data_type_info = DataTypeInformation::default();
    if inner.config.share_topic_type {
        data_type_info.encoding = inner.data_type_info.encoding.clone();
        data_type_info.type_name = inner.data_type_info.type_name.clone();
    }
    if inner.config.share_topic_description {
        data_type_info.descriptor = inner.data_type_info.descriptor.clone();
    }

    let layers = TransportLayer::ALL
        .iter()
        .map(|&layer| {
            let state = inner.layer_states.snapshot_of(layer);
            LayerRecord {
                layer,
                version: TRANSPORT_LAYER_VERSION,
                enabled: state.read_enabled,
                active: state.active,
            }
        })
        .collect();

    let dfreq = inner.frequency.lock().frequency_millihertz(Instant::now());

    RegistrationSample {
        cmd_type: RegistrationCommand::RegisterSubscriber,
        identifier: SampleIdentifier {
            process_id: identity.process_id,
            host_name: identity.host_name.clone(),
            entity_id: identity.entity_id,
        },
        host_group_name: identity.host_group_name.clone(),
        topic_name: identity.topic_name.clone(),
        data_type_info,
        attributes: inner
            .attributes
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect(),
        topic_size: inner.topic_size.load(Ordering::Relaxed) as i32,
        layers,
        process_name: identity.process_name.clone(),
        unit_name: identity.unit_name.clone(),
        dclock: inner.read_clock.load(Ordering::Relaxed),
        dfreq,
        message_drops: inner.message_drops.load(Ordering::Relaxed),
    }
}

/// Assemble the unregistration record emitted at stop.
///
/// Carries identity only; counters and layer states are meaningless for an
/// endpoint that is going away.
pub(crate) fn build_unregistration_sample(inner: &SubscriberInner) -> RegistrationSample {
    let identity = &inner.identity;

    RegistrationSample {
        cmd_type: RegistrationCommand::UnregisterSubscriber,
        identifier: SampleIdentifier {
            process_id: identity.process_id,
            host_name: identity.host_name.clone(),
            entity_id: identity.entity_id,
        },
        host_group_name: identity.host_group_name.clone(),
        topic_name: identity.topic_name.clone(),
        data_type_info: DataTypeInformation::default(),
        attributes: Default::default(),
        topic_size: 0,
        layers: Vec::new(),
        process_name: identity.process_name.clone(),
        unit_name: identity.unit_name.clone(),
        dclock: 0,
        dfreq: 0,
        message_drops: 0,
    }
}

/// Multi-line state dump for debugging.
pub(crate) fn dump(inner: &SubscriberInner) -> String {
    let identity = &inner.identity;
    let mut out = String::new();

    let _ = writeln!(out);
    let _ = writeln!(out, "------------------------------------");
    let _ = writeln!(out, " murmur subscriber");
    let _ = writeln!(out, "------------------------------------");
    let _ = writeln!(out, "host_name:        {}", identity.host_name);
    let _ = writeln!(out, "host_group_name:  {}", identity.host_group_name);
    let _ = writeln!(out, "topic_name:       {}", identity.topic_name);
    let _ = writeln!(out, "entity_id:        {}", identity.entity_id);
    let _ = writeln!(out, "encoding:         {}", inner.data_type_info.encoding);
    let _ = writeln!(out, "type_name:        {}", inner.data_type_info.type_name);
    let _ = writeln!(
        out,
        "descriptor_size:  {}",
        inner.data_type_info.descriptor.len()
    );
    let _ = writeln!(
        out,
        "topic_size:       {}",
        inner.topic_size.load(Ordering::Relaxed)
    );
    let _ = writeln!(out, "buffered:         {}", inner.read_slot.is_filled());
    let _ = writeln!(
        out,
        "dclock:           {}",
        inner.read_clock.load(Ordering::Relaxed)
    );
    let _ = writeln!(
        out,
        "frequency [mHz]:  {}",
        inner.frequency.lock().frequency_millihertz(Instant::now())
    );
    let _ = writeln!(
        out,
        "message_drops:    {}",
        inner.message_drops.load(Ordering::Relaxed)
    );
    let _ = writeln!(
        out,
        "connections:      {}",
        inner.connections.active_count()
    );
    let _ = writeln!(out, "created:          {}", inner.is_created());

    out
}
