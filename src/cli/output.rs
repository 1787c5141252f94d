//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, CampaignError};

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::Campaign(CampaignError::AlreadyActive(state)) => {
            format!("A campaign is already {}; stop it before starting another", state)
        }
        other => other.to_string(),
    }
}

/// Serialize a value for `--format json` output.
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(|e| ApiError::Output(e.to_string()))
}
