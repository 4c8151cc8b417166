//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Capped exponential backoff for reconnect scheduling.
//!
//! Delays start at a configurable initial interval, double on every attempt,
//! and are clamped to a ceiling. Once the ceiling is reached, retries
//! continue at the ceiling indefinitely; the connection is bounded in how
//! hard it hammers the gateway but never gives up on its own.

use std::time::Duration;

/// Default ceiling for reconnect delays.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(32_768);

/// Capped exponential backoff schedule.
///
/// Successive calls to [`next_delay`](Backoff::next_delay) yield a
/// non-decreasing sequence of delays: `initial`, `initial * 2`,
/// `initial * 4`, ... clamped to the ceiling. [`reset`](Backoff::reset)
/// returns the schedule to the initial interval after a successful
/// handshake.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use tether::connection::backoff::Backoff;
///
/// let mut backoff = Backoff::new(Duration::from_millis(400));
/// assert_eq!(backoff.next_delay(), Duration::from_millis(400));
/// assert_eq!(backoff.next_delay(), Duration::from_millis(800));
/// backoff.reset();
/// assert_eq!(backoff.next_delay(), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    /// Creates a backoff schedule with the given initial interval and the
    /// default ceiling.
    #[must_use]
    pub fn new(initial: Duration) -> Self {
        Self {
            initial,
            max: DEFAULT_MAX_DELAY,
            attempt: 0,
        }
    }

    /// Sets the ceiling delays are clamped to.
    #[must_use]
    pub fn with_ceiling(mut self, max: Duration) -> Self {
        self.max = max;
        self
    }

    /// Returns the number of delays handed out since the last reset.
    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns the delay to wait before the next connection attempt and
    /// advances the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let shift = self.attempt.min(20);
        let millis = (self.initial.as_millis() as u64).saturating_mul(1u64 << shift);
        let delay = Duration::from_millis(millis).min(self.max);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    /// Returns the schedule to its initial interval.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}
