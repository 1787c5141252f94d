//! Configuration System
//!
//! Layered configuration for campaigns: built-in defaults, the global user file, workspace
//! files and `COURIER__SECTION__KEY` environment overrides. Validated once after loading;
//! the campaign section becomes an immutable [`CampaignConfig`] per run.

use crate::campaign::{CampaignConfig, LedgerConfig};
use crate::contact::{ColumnMapping, ContactSource, CsvContactSource, CsvLocation};
use crate::driver::DriverConfig;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod facade;
mod merge;
mod paths;
mod sources;

pub use facade::ConfigLoader;
pub use paths::{courier_data_dir, courier_state_dir, default_ledger_path, global_config_path};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourierConfig {
    /// Batching, pacing and retry settings
    #[serde(default)]
    pub campaign: CampaignConfig,

    /// Sent-ledger location
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Default contact source
    #[serde(default)]
    pub source: SourceConfig,

    /// Automation driver selection
    #[serde(default)]
    pub driver: DriverConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[source]` section: where contacts come from when the command line does not say.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_url: Option<String>,

    /// Give every contact the first row's message
    #[serde(default)]
    pub balance_messages: bool,

    #[serde(default)]
    pub columns: ColumnMapping,
}

impl SourceConfig {
    /// The configured CSV source, if any. A local path wins over a URL.
    pub fn csv_source(&self) -> Option<Box<dyn ContactSource>> {
        let location = match (&self.csv_path, &self.csv_url) {
            (Some(path), _) => CsvLocation::File(path.clone()),
            (None, Some(url)) => CsvLocation::Url(url.clone()),
            (None, None) => return None,
        };
        Some(Box::new(
            CsvContactSource::new(location).with_columns(self.columns.clone()),
        ))
    }

    fn validate(&self) -> Result<(), String> {
        if self.columns.number.trim().is_empty() {
            return Err("source.columns.number cannot be empty".to_string());
        }
        if let Some(url) = &self.csv_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("source.csv_url must be an http(s) URL: {}", url));
            }
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Campaign(String),
    Source(String),
    Driver(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Campaign(msg) => write!(f, "Campaign: {}", msg),
            ValidationError::Source(msg) => write!(f, "Source: {}", msg),
            ValidationError::Driver(msg) => write!(f, "Driver: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl CourierConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.campaign.validate() {
            errors.push(ValidationError::Campaign(e));
        }
        if let Err(e) = self.source.validate() {
            errors.push(ValidationError::Source(e));
        }
        if let Err(e) = self.driver.validate() {
            errors.push(ValidationError::Driver(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Render as TOML, for `config show`.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
