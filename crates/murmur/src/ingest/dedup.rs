// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Cross-layer duplicate suppression.
//!
//! A publisher may send the same payload over several transports at once;
//! whichever copy arrives first wins and the others must be discarded
//! without disturbing the publisher clock cursor. The window is a plain
//! FIFO probed linearly: 64 entries keep the scan cheap while covering
//! layers with comparable one-way latencies.

use std::collections::VecDeque;

/// Number of recent payload hashes to remember.
const DEDUP_WINDOW: usize = 64;

/// Bounded FIFO of recently seen payload hashes.
#[derive(Debug)]
pub struct HashDedup {
    window: VecDeque<u64>,
}

impl HashDedup {
    #[must_use]
    pub fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(DEDUP_WINDOW + 1),
        }
    }

    /// Probe for `hash`; remember it when unseen.
    ///
    /// Returns `true` when the hash is already in the window (the sample is
    /// a duplicate and must be discarded). Membership does not refresh an
    /// entry's position: eviction stays strictly first-in-first-out.
    ///
    /// # Performance
    /// HOT PATH: runs on every arriving sample, O(window) scan.
    #[inline]
    pub fn check_and_insert(&mut self, hash: u64) -> bool {
        if self.window.contains(&hash) {
            return true;
        }
        self.window.push_back(hash);
        while self.window.len() > DEDUP_WINDOW {
            self.window.pop_front();
        }
        false
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.window.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Forget all hashes (subscriber stop).
    pub fn clear(&mut self) {
        self.window.clear();
    }
}

impl Default for HashDedup {
    fn default() -> Self {
        Self::new()
    }
}
