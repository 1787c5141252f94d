//! Error types for the courier campaign dispatch system.

use crate::campaign::CampaignState;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Contact list loading errors. Fatal to a run before it starts.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read contact file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch contact sheet from {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Contact sheet is missing required column '{0}'")]
    MissingColumn(String),

    #[error("Malformed contact sheet at line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("No contact source configured (use --csv, --url or --number)")]
    NotConfigured,
}

/// Automation driver errors.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Automation driver setup failed: {0}")]
    Setup(String),

    #[error("Automation action failed: {0}")]
    Action(String),

    #[error("Automation action timed out after {0:?}")]
    Timeout(Duration),

    #[error("Automation driver I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable duplicate ledger errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Ledger path could not be resolved: {0}")]
    Path(String),
}

/// Errors surfaced by the campaign control surface.
#[derive(Debug, Error)]
pub enum CampaignError {
    #[error("A campaign is already active (state: {0})")]
    AlreadyActive(CampaignState),

    #[error("Invalid campaign configuration: {0}")]
    InvalidConfig(String),

    #[error("Contact source error: {0}")]
    Source(#[from] SourceError),

    #[error("Campaign worker could not be started: {0}")]
    Spawn(String),

    #[error("Campaign worker panicked")]
    WorkerPanicked,
}

/// Errors surfaced through the CLI.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Campaign(#[from] CampaignError),

    #[error("{0}")]
    Source(#[from] SourceError),

    #[error("{0}")]
    Ledger(#[from] LedgerError),

    #[error("{0}")]
    Driver(#[from] DriverError),

    #[error("Output error: {0}")]
    Output(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
