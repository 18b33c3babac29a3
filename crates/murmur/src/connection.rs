// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Known-publisher table with two-touch activation.
//!
//! Discovery broadcasts race and the first publication info seen for a
//! publisher may be stale or incomplete, so a publisher only counts as
//! connected on its *second* registration touch. The table records the
//! outcome of every mutation; the subscriber fires the matching lifecycle
//! event after the table lock is released.

use crate::types::{DataTypeInformation, LayerStates, PublicationKey};
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// State kept per known publisher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublisherState {
    pub data_type_info: DataTypeInformation,
    pub layer_states: LayerStates,
    /// False while the publisher is on first-touch probation.
    pub active: bool,
}

/// Outcome of applying one publication info to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionChange {
    /// First touch: entry created on probation, no event fires.
    Pending,
    /// Second touch: entry activated, `connected` fires.
    Connected,
    /// Active entry refreshed, `update_connection` fires.
    Updated,
}

/// Map of known publishers keyed by publication identity.
#[derive(Debug, Default)]
pub struct ConnectionTable {
    entries: Mutex<HashMap<PublicationKey, PublisherState>>,
    /// Cached count of active entries, readable without the table lock.
    active_count: AtomicUsize,
}

impl ConnectionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply publication info for `key`.
    ///
    /// The entry's data type and layer states are overwritten in every
    /// case, including on probation; there is no quality arbitration here.
    pub fn apply(
        &self,
        key: PublicationKey,
        data_type_info: DataTypeInformation,
        layer_states: LayerStates,
    ) -> ConnectionChange {
        let mut entries = self.entries.lock();

        let change = match entries.entry(key) {
            Entry::Vacant(vacant) => {
                vacant.insert(PublisherState {
                    data_type_info,
                    layer_states,
                    active: false,
                });
                ConnectionChange::Pending
            }
            Entry::Occupied(mut occupied) => {
                let change = if occupied.get().active {
                    ConnectionChange::Updated
                } else {
                    ConnectionChange::Connected
                };
                occupied.insert(PublisherState {
                    data_type_info,
                    layer_states,
                    active: true,
                });
                change
            }
        };

        self.recount_active(&entries);
        change
    }

    /// Remove `key` from the table.
    ///
    /// Returns `true` when this removal dropped the active-publisher count
    /// from non-zero to zero, i.e. exactly when `disconnected` must fire.
    pub fn remove(&self, key: &PublicationKey) -> bool {
        let mut entries = self.entries.lock();

        let before = entries.values().filter(|entry| entry.active).count();
        entries.remove(key);
        let after = self.recount_active(&entries);

        before > 0 && after == 0
    }

    /// Data type announced by `key`, if the publisher is known.
    #[must_use]
    pub fn data_type_of(&self, key: &PublicationKey) -> Option<DataTypeInformation> {
        self.entries.lock().get(key).map(|entry| entry.data_type_info.clone())
    }

    /// Number of active (past probation) publishers.
    #[must_use]
    #[inline]
    pub fn active_count(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    /// Number of known publishers, probation entries included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Forget all publishers (subscriber stop).
    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.clear();
        self.recount_active(&entries);
    }

    fn recount_active(&self, entries: &HashMap<PublicationKey, PublisherState>) -> usize {
        let count = entries.values().filter(|entry| entry.active).count();
        self.active_count.store(count, Ordering::Relaxed);
        count
    }
}
