//! Contact sources: where an ordered contact list comes from.
//!
//! Sources are read once at campaign start. A load failure is a [`SourceError`] and is
//! fatal to the run before it begins.

use crate::contact::ContactRecord;
use crate::error::SourceError;
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Supplies the ordered list of contacts for one campaign.
pub trait ContactSource: Send + Sync {
    fn load_contacts(&self) -> Result<Vec<ContactRecord>, SourceError>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

/// Numbers entered by hand, all sharing one message.
#[derive(Debug, Clone, Default)]
pub struct ManualContactSource {
    numbers: Vec<String>,
    message: String,
}

impl ManualContactSource {
    pub fn new<I, S>(numbers: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            numbers: numbers
                .into_iter()
                .map(|n| {
                    let n: String = n.into();
                    n.trim().to_string()
                })
                .filter(|n| !n.is_empty())
                .collect(),
            message: message.into().trim().to_string(),
        }
    }
}

impl ContactSource for ManualContactSource {
    fn load_contacts(&self) -> Result<Vec<ContactRecord>, SourceError> {
        Ok(self
            .numbers
            .iter()
            .map(|n| ContactRecord::new(n.clone(), self.message.clone()))
            .collect())
    }

    fn describe(&self) -> String {
        format!("manual list ({} numbers)", self.numbers.len())
    }
}

/// Header names used to map sheet columns onto contact fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(default = "default_number_column")]
    pub number: String,
    #[serde(default = "default_message_column")]
    pub message: String,
    #[serde(default = "default_name_column")]
    pub name: String,
}

fn default_number_column() -> String {
    "Number".to_string()
}

fn default_message_column() -> String {
    "IntroMessage".to_string()
}

fn default_name_column() -> String {
    "Name".to_string()
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            number: default_number_column(),
            message: default_message_column(),
            name: default_name_column(),
        }
    }
}

/// Where CSV text is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvLocation {
    File(PathBuf),
    Url(String),
}

/// CSV-backed source: a local export or a published spreadsheet URL.
#[derive(Debug, Clone)]
pub struct CsvContactSource {
    location: CsvLocation,
    columns: ColumnMapping,
    fetch_timeout: Duration,
}

impl CsvContactSource {
    pub fn new(location: CsvLocation) -> Self {
        Self {
            location,
            columns: ColumnMapping::default(),
            fetch_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_columns(mut self, columns: ColumnMapping) -> Self {
        self.columns = columns;
        self
    }

    fn read_text(&self) -> Result<String, SourceError> {
        match &self.location {
            CsvLocation::File(path) => {
                std::fs::read_to_string(path).map_err(|source| SourceError::Io {
                    path: path.clone(),
                    source,
                })
            }
            CsvLocation::Url(url) => {
                let fetch_err = |message: String| SourceError::Fetch {
                    url: url.clone(),
                    message,
                };
                let client = reqwest::blocking::Client::builder()
                    .timeout(self.fetch_timeout)
                    .build()
                    .map_err(|e| fetch_err(e.to_string()))?;
                let response = client
                    .get(url)
                    .send()
                    .map_err(|e| fetch_err(e.to_string()))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(fetch_err(format!("HTTP status {}", status)));
                }
                response.text().map_err(|e| fetch_err(e.to_string()))
            }
        }
    }

    /// Parse sheet text into contact records. Exposed for sources that obtain text elsewhere.
    pub fn parse_records(&self, text: &str) -> Result<Vec<ContactRecord>, SourceError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let header = reader.headers().map_err(malformed)?.clone();
        let column = |name: &str| header.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
        let number_idx = column(&self.columns.number)
            .ok_or_else(|| SourceError::MissingColumn(self.columns.number.clone()))?;
        let message_idx = column(&self.columns.message);
        let name_idx = column(&self.columns.name);
        if message_idx.is_none() {
            warn!(
                column = %self.columns.message,
                "Message column not present; contacts will be opened without a message"
            );
        }

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(malformed)?;
            let raw_number = clean_cell(cell(&row, Some(number_idx)));
            if raw_number.is_empty() {
                debug!(
                    line = row.position().map(|p| p.line()),
                    "Skipping sheet row without a number"
                );
                continue;
            }
            let number = strip_float_artifact(&raw_number).to_string();
            let message = clean_cell(cell(&row, message_idx));
            let name = clean_cell(cell(&row, name_idx));
            records.push(ContactRecord::new(number, message).with_display_name(name));
        }
        Ok(records)
    }
}

impl ContactSource for CsvContactSource {
    fn load_contacts(&self) -> Result<Vec<ContactRecord>, SourceError> {
        let text = self.read_text()?;
        let records = self.parse_records(&text)?;
        info!(
            source = %self.describe(),
            contacts = records.len(),
            "Loaded contacts from sheet"
        );
        Ok(records)
    }

    fn describe(&self) -> String {
        match &self.location {
            CsvLocation::File(path) => format!("csv file {}", path.display()),
            CsvLocation::Url(url) => format!("csv url {}", url),
        }
    }
}

fn cell(row: &StringRecord, idx: Option<usize>) -> &str {
    idx.and_then(|i| row.get(i)).unwrap_or("")
}

fn malformed(err: csv::Error) -> SourceError {
    SourceError::Malformed {
        line: err.position().map_or(0, |p| p.line() as usize),
        message: err.to_string(),
    }
}

/// Trim, and treat spreadsheet `nan` placeholders as empty.
fn clean_cell(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("nan") {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Numbers exported as floats come through as `"15550102030.0"`.
fn strip_float_artifact(number: &str) -> &str {
    number.strip_suffix(".0").unwrap_or(number)
}

/// Opt-in transformation: every contact gets the first contact's message.
pub fn balance_messages(contacts: Vec<ContactRecord>) -> Vec<ContactRecord> {
    let Some(first) = contacts.first().map(|c| c.message.clone()) else {
        return contacts;
    };
    info!(
        contacts = contacts.len(),
        "Balancing contact messages to the first row's message"
    );
    contacts
        .into_iter()
        .map(|mut c| {
            c.message = first.clone();
            c
        })
        .collect()
}

/// Replace every contact's message with `message` when it is non-blank.
pub fn override_message(contacts: Vec<ContactRecord>, message: &str) -> Vec<ContactRecord> {
    let message = message.trim();
    if message.is_empty() {
        return contacts;
    }
    contacts
        .into_iter()
        .map(|mut c| {
            c.message = message.to_string();
            c
        })
        .collect()
}
