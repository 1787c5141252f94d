//! Campaign configuration value.
//!
//! Supplied once at campaign start and immutable for the run. Changing any field means
//! stopping the campaign and starting a new one.

use crate::error::CampaignError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default contact limit; large enough to be effectively unbounded.
pub const UNBOUNDED_CONTACT_LIMIT: u64 = 999_999;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// Contacts per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches, in seconds
    #[serde(default = "default_batch_delay_seconds")]
    pub batch_delay_seconds: u64,

    /// Lower bound of the randomized per-contact delay, in seconds
    #[serde(default = "default_delay_min_seconds")]
    pub delay_min_seconds: u64,

    /// Upper bound of the randomized per-contact delay, in seconds
    #[serde(default = "default_delay_max_seconds")]
    pub delay_max_seconds: u64,

    /// Additional attempts after a failed delivery
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Additional attempts after a failed conversation open (defaults to `max_retries`)
    #[serde(default)]
    pub open_max_retries: Option<u32>,

    /// Fixed backoff between attempts, in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Stop after this many contacts have been processed
    #[serde(default = "default_contact_limit")]
    pub contact_limit: u64,

    /// Skip contacts already recorded in the sent ledger
    #[serde(default = "default_true")]
    pub duplicate_check: bool,

    /// Remove per-contact pacing entirely (implies fast mode)
    #[serde(default)]
    pub no_delay: bool,

    /// Collapse long controlled waits and shorten stabilization waits
    #[serde(default)]
    pub fast_mode: bool,
}

fn default_batch_size() -> usize {
    5
}

fn default_batch_delay_seconds() -> u64 {
    30
}

fn default_delay_min_seconds() -> u64 {
    2
}

fn default_delay_max_seconds() -> u64 {
    5
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    3000
}

fn default_contact_limit() -> u64 {
    UNBOUNDED_CONTACT_LIMIT
}

fn default_true() -> bool {
    true
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_seconds: default_batch_delay_seconds(),
            delay_min_seconds: default_delay_min_seconds(),
            delay_max_seconds: default_delay_max_seconds(),
            max_retries: default_max_retries(),
            open_max_retries: None,
            retry_backoff_ms: default_retry_backoff_ms(),
            contact_limit: default_contact_limit(),
            duplicate_check: default_true(),
            no_delay: false,
            fast_mode: false,
        }
    }
}

impl CampaignConfig {
    /// Validate ranges. Delay bounds are checked here; the delay policy still clamps.
    pub fn validate(&self) -> Result<(), String> {
        if self.batch_size == 0 {
            return Err("batch_size must be positive".to_string());
        }
        if self.contact_limit == 0 {
            return Err("contact_limit must be positive".to_string());
        }
        if self.delay_min_seconds > self.delay_max_seconds {
            return Err(format!(
                "delay_min_seconds ({}) must not exceed delay_max_seconds ({})",
                self.delay_min_seconds, self.delay_max_seconds
            ));
        }
        Ok(())
    }

    /// Validate and apply implied settings: `no_delay` forces `fast_mode`.
    pub fn normalized(mut self) -> Result<Self, CampaignError> {
        self.validate().map_err(CampaignError::InvalidConfig)?;
        if self.no_delay {
            self.fast_mode = true;
        }
        Ok(self)
    }

    pub fn open_retries(&self) -> u32 {
        self.open_max_retries.unwrap_or(self.max_retries)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}
