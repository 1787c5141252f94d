//! Contacts: records, identifier normalization, and contact sources.
//!
//! A contact's identity is its normalized identifier: the raw phone-like value with
//! `+`, whitespace and hyphens removed. Two records whose identifiers normalize to the
//! same digits are the same recipient regardless of how they were written.

pub mod source;

pub use source::{
    balance_messages, override_message, ColumnMapping, ContactSource, CsvContactSource,
    CsvLocation, ManualContactSource,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized recipient identifier (ASCII digits only, never empty).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(String);

impl ContactId {
    /// Normalize a raw identifier. Returns `None` when nothing valid remains.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = normalize_identifier(raw);
        if normalized.is_empty() || !normalized.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContactId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Strip `+`, whitespace and hyphens. Applied identically to queried and stored ids.
pub fn normalize_identifier(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '+' && *c != '-' && !c.is_whitespace())
        .collect()
}

/// One recipient as supplied by a contact source. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// Identifier exactly as the source supplied it
    pub raw_id: String,
    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Message body; empty means "open the conversation only"
    #[serde(default)]
    pub message: String,
}

impl ContactRecord {
    pub fn new(raw_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            raw_id: raw_id.into(),
            display_name: None,
            message: message.into(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.display_name = if name.trim().is_empty() {
            None
        } else {
            Some(name)
        };
        self
    }

    /// Normalized identifier, or `None` if the raw value is not a valid identifier.
    pub fn contact_id(&self) -> Option<ContactId> {
        ContactId::parse(&self.raw_id)
    }

    pub fn has_message(&self) -> bool {
        !self.message.trim().is_empty()
    }
}
