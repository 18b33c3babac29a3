// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Single-slot rendezvous buffer behind the blocking read API.
//!
//! Transport writers overwrite the slot unconditionally: when the reader
//! has not drained the previous payload it is lost silently, because the
//! receive callback (not this slot) is the intended high-rate path.
//!
//! # Architecture
//! - One mutex-guarded slot (payload bytes + receive time + filled flag)
//! - Condvar wake for blocked readers; spurious wakeups re-check `filled`

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct SlotState {
    buf: Vec<u8>,
    time_us: i64,
    filled: bool,
}

/// Single-payload rendezvous buffer with blocking take.
#[derive(Debug, Default)]
pub struct ReadSlot {
    state: Mutex<SlotState>,
    available: Condvar,
}

impl ReadSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot with a new payload and wake one blocked reader.
    ///
    /// # Performance
    /// HOT PATH: called on every accepted sample with no receive callback.
    pub fn publish(&self, payload: &[u8], time_us: i64) {
        let mut state = self.state.lock();
        state.buf.clear();
        state.buf.extend_from_slice(payload);
        state.time_us = time_us;
        state.filled = true;
        self.available.notify_one();
    }

    /// Wait for a payload and drain it into `buf`.
    ///
    /// `timeout_ms < 0` waits indefinitely, `0` polls, `> 0` waits up to
    /// that many milliseconds. Returns `true` when a payload was drained;
    /// the slot is empty afterwards.
    pub fn take(&self, buf: &mut Vec<u8>, time_us: &mut i64, timeout_ms: i32) -> bool {
        let mut state = self.state.lock();

        // No need to wait (for whatever time) if something is buffered.
        if !state.filled {
            if timeout_ms < 0 {
                while !state.filled {
                    self.available.wait(&mut state);
                }
            } else if timeout_ms > 0 {
                let deadline = Instant::now() + Duration::from_millis(timeout_ms as u64);
                while !state.filled {
                    if self.available.wait_until(&mut state, deadline).timed_out() {
                        break;
                    }
                }
            }
        }

        if state.filled {
            buf.clear();
            std::mem::swap(buf, &mut state.buf);
            *time_us = state.time_us;
            state.filled = false;
            return true;
        }
        false
    }

    /// Whether an undrained payload is buffered.
    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.state.lock().filled
    }

    /// Drop any buffered payload (subscriber stop).
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.buf.clear();
        state.time_us = 0;
        state.filled = false;
    }
}
