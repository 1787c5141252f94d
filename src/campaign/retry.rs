//! Bounded retry with fixed backoff around a single fallible automation call.

use crate::campaign::control::Waiter;
use crate::campaign::delay::DelayPolicy;
use crate::error::DriverError;
use std::time::Duration;
use tracing::{debug, warn};

/// Per-call-site retry parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first
    pub max_retries: u32,
    /// Wait between attempts, before fast-mode collapsing
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Result of running an action through the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome {
    pub succeeded: bool,
    pub attempts: u32,
    pub last_error: Option<String>,
}

pub struct RetryExecutor<'a> {
    delays: &'a DelayPolicy,
    waiter: &'a dyn Waiter,
}

impl<'a> RetryExecutor<'a> {
    pub fn new(delays: &'a DelayPolicy, waiter: &'a dyn Waiter) -> Self {
        Self { delays, waiter }
    }

    /// Run `action` until it reports success or `policy.max_retries` extra attempts are
    /// spent. A `false` answer and an `Err` are both retried.
    ///
    /// The final failure is not logged here; the caller reports it once.
    pub fn execute<F>(&self, label: &str, policy: RetryPolicy, mut action: F) -> RetryOutcome
    where
        F: FnMut(u32) -> Result<bool, DriverError>,
    {
        let max_attempts = policy.max_attempts();
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            match action(attempt) {
                Ok(true) => {
                    debug!(action = label, attempt, "Action succeeded");
                    return RetryOutcome {
                        succeeded: true,
                        attempts: attempt,
                        last_error: None,
                    };
                }
                Ok(false) => last_error = None,
                Err(e) => last_error = Some(e.to_string()),
            }

            if attempt < max_attempts {
                warn!(
                    action = label,
                    attempt,
                    max_attempts,
                    error = last_error.as_deref().unwrap_or("unsuccessful"),
                    "Action failed, retrying"
                );
                self.waiter.settle(self.delays.controlled(policy.backoff));
            }
        }

        RetryOutcome {
            succeeded: false,
            attempts: max_attempts,
            last_error,
        }
    }
}
