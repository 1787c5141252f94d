//! Courier: batched, pausable campaign dispatch
//!
//! Sends personalized messages to an ordered list of contacts through an automation
//! driver, in batches with randomized pacing, bounded retries, and a durable sent
//! ledger that keeps a contact from being messaged twice.

pub mod campaign;
pub mod cli;
pub mod config;
pub mod contact;
pub mod driver;
pub mod error;
pub mod logging;
pub mod progress;
