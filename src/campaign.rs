//! Campaign Dispatch Engine.
//!
//! Turns an ordered contact list into per-contact automation actions under
//! pause/resume/stop control, with batching, adaptive delay, bounded retry and durable
//! duplicate suppression.

pub mod batch;
pub mod control;
pub mod controller;
pub mod delay;
pub mod ledger;
pub mod result;
pub mod retry;
mod runner;
pub mod settings;
mod state;

pub use batch::{BatchBoundary, BatchScheduler};
pub use control::{Checkpoint, ControlSignals, Waiter};
pub use controller::CampaignController;
pub use delay::{BatchCountdown, DelayPolicy};
pub use ledger::{
    read_entries, DuplicateLedger, FileLedgerStore, LedgerConfig, LedgerEntry, LedgerRotation,
    LedgerStore,
};
pub use result::{
    CampaignResult, CheckEntry, CheckReport, CheckStatus, ContactOutcome, FailedContact,
    FailureReason, LedgerWriteFailure, RunReport,
};
pub use retry::{RetryExecutor, RetryOutcome, RetryPolicy};
pub use runner::{DELIVER_SETTLE, OPEN_SETTLE};
pub use settings::{CampaignConfig, UNBOUNDED_CONTACT_LIMIT};
pub use state::CampaignState;
