//! Delay policy: waits between contacts and between batches.

use crate::campaign::CampaignConfig;
use rand::Rng;
use std::time::Duration;

/// Controlled waits longer than this are dropped in fast mode.
pub const FAST_MODE_THRESHOLD: Duration = Duration::from_millis(600);

/// Shortest wait kept for UI stabilization in fast mode.
pub const STABILIZATION_FLOOR: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayPolicy {
    min_seconds: u64,
    max_seconds: u64,
    batch_delay_seconds: u64,
    no_delay: bool,
    fast_mode: bool,
}

impl DelayPolicy {
    pub fn new(
        range: (u64, u64),
        batch_delay_seconds: u64,
        no_delay: bool,
        fast_mode: bool,
    ) -> Self {
        Self {
            min_seconds: range.0,
            max_seconds: range.1,
            batch_delay_seconds,
            no_delay,
            fast_mode: fast_mode || no_delay,
        }
    }

    pub fn from_config(config: &CampaignConfig) -> Self {
        Self::new(
            (config.delay_min_seconds, config.delay_max_seconds),
            config.batch_delay_seconds,
            config.no_delay,
            config.fast_mode,
        )
    }

    pub fn fast_mode(&self) -> bool {
        self.fast_mode
    }

    /// Seconds to wait before the next contact.
    pub fn next_contact_delay(&self) -> u64 {
        self.next_contact_delay_with(&mut rand::thread_rng())
    }

    pub fn next_contact_delay_with<R: Rng>(&self, rng: &mut R) -> u64 {
        if self.no_delay {
            return 0;
        }
        if self.min_seconds == 0 && self.max_seconds == 0 {
            return 0;
        }
        if self.max_seconds <= self.min_seconds {
            return self.min_seconds;
        }
        rng.gen_range(self.min_seconds..=self.max_seconds)
    }

    /// Countdown for the pause between batches, one tick per second.
    pub fn next_batch_delay(&self) -> BatchCountdown {
        BatchCountdown {
            remaining: self.batch_delay_seconds,
        }
    }

    /// Apply fast-mode collapsing to a single controlled wait.
    ///
    /// Long waits are removed; short ones are cut to the stabilization floor but never
    /// removed outright.
    pub fn controlled(&self, wait: Duration) -> Duration {
        if !self.fast_mode || wait.is_zero() {
            return wait;
        }
        if wait > FAST_MODE_THRESHOLD {
            Duration::ZERO
        } else {
            wait.min(STABILIZATION_FLOOR)
        }
    }
}

/// Yields the seconds remaining before the next batch, from the configured delay to 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCountdown {
    remaining: u64,
}

impl BatchCountdown {
    pub fn total_seconds(&self) -> u64 {
        self.remaining
    }

    /// Whether a tick should be surfaced: every tenth second and the last five.
    pub fn is_announced(remaining: u64) -> bool {
        remaining % 10 == 0 || remaining <= 5
    }
}

impl Iterator for BatchCountdown {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.remaining;
        self.remaining -= 1;
        Some(current)
    }
}
