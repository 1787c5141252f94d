//! Duplicate tracker backed by an append-only sent ledger.
//!
//! Ledger format, one record per line:
//!
//! ```text
//! timestamp|normalizedId|displayName|truncatedMessagePreview
//! ```
//!
//! Lines that do not have this shape (blank lines, `#` comments, fewer than four
//! fields, an id field with no digits) are skipped on load, never treated as corruption.

use crate::contact::ContactId;
use crate::error::LedgerError;
use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Characters kept from the message in a ledger record.
pub const PREVIEW_CHARS: usize = 50;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Persistent line store behind the tracker.
pub trait LedgerStore: Send + Sync {
    /// All lines currently stored. A missing store reads as empty.
    fn read_lines(&self) -> Result<Vec<String>, LedgerError>;

    /// Append one line. Must be durable when `Ok` is returned.
    fn append_line(&self, line: &str) -> Result<(), LedgerError>;

    fn describe(&self) -> String;
}

/// Ledger kept in a plain text file.
#[derive(Debug)]
pub struct FileLedgerStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl LedgerStore for FileLedgerStore {
    fn read_lines(&self) -> Result<Vec<String>, LedgerError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(text.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn append_line(&self, line: &str) -> Result<(), LedgerError> {
        let _guard = self.write_lock.lock();
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        writeln!(file, "{}", line).map_err(|e| self.io_error(e))?;
        file.sync_data().map_err(|e| self.io_error(e))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// One parsed ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub timestamp: String,
    pub contact_id: ContactId,
    pub display_name: String,
    pub preview: String,
}

impl LedgerEntry {
    pub fn new(contact_id: ContactId, display_name: Option<&str>, message: &str) -> Self {
        Self {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            contact_id,
            display_name: sanitize_field(display_name.unwrap_or("")),
            preview: sanitize_field(&truncate_preview(message)),
        }
    }

    /// Parse a ledger line; `None` for anything that is not a well-formed record.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let mut parts = line.splitn(4, '|');
        let timestamp = parts.next()?.trim().to_string();
        let contact_id = ContactId::parse(parts.next()?)?;
        let display_name = parts.next()?.trim().to_string();
        let preview = parts.next()?.trim().to_string();
        Some(Self {
            timestamp,
            contact_id,
            display_name,
            preview,
        })
    }

    pub fn to_line(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.timestamp, self.contact_id, self.display_name, self.preview
        )
    }
}

/// First 50 characters of the message, with `...` when cut.
pub fn truncate_preview(message: &str) -> String {
    let mut preview: String = message.chars().take(PREVIEW_CHARS).collect();
    if message.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

/// Keep a field on one line and free of the delimiter.
fn sanitize_field(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '|' || c == '\n' || c == '\r' { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Read every well-formed entry from a store.
pub fn read_entries(store: &dyn LedgerStore) -> Result<Vec<LedgerEntry>, LedgerError> {
    Ok(store
        .read_lines()?
        .iter()
        .filter_map(|line| LedgerEntry::parse(line))
        .collect())
}

/// In-memory duplicate set plus its durable store.
///
/// Mutated only by the campaign worker during a run.
pub struct DuplicateLedger<'a> {
    store: &'a dyn LedgerStore,
    enabled: bool,
    sent: HashSet<ContactId>,
}

impl<'a> DuplicateLedger<'a> {
    /// Reconstruct the sent set from the store. A store that cannot be read degrades to an
    /// empty set with a warning.
    pub fn load(store: &'a dyn LedgerStore, enabled: bool) -> Self {
        let sent = match store.read_lines() {
            Ok(lines) => {
                let total = lines.len();
                let sent: HashSet<ContactId> = lines
                    .iter()
                    .filter_map(|line| LedgerEntry::parse(line))
                    .map(|entry| entry.contact_id)
                    .collect();
                debug!(lines = total, ids = sent.len(), "Parsed sent ledger");
                sent
            }
            Err(e) => {
                warn!(
                    ledger = %store.describe(),
                    error = %e,
                    "Could not read sent ledger; starting with an empty duplicate set"
                );
                HashSet::new()
            }
        };
        info!(
            ledger = %store.describe(),
            previously_sent = sent.len(),
            duplicate_check = enabled,
            "Loaded sent ledger"
        );
        Self {
            store,
            enabled,
            sent,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Ids known to have been sent. Always populated, even when checking is disabled.
    pub fn known(&self) -> &HashSet<ContactId> {
        &self.sent
    }

    pub fn len(&self) -> usize {
        self.sent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty()
    }

    /// Whether `id` was already sent. Always `false` when duplicate checking is off.
    pub fn contains(&self, id: &ContactId) -> bool {
        self.enabled && self.sent.contains(id)
    }

    /// Persist a successful send, then remember it. If the append fails the id is not
    /// added, the error is logged, and the campaign carries on.
    pub fn record(
        &mut self,
        id: &ContactId,
        display_name: Option<&str>,
        message: &str,
    ) -> Result<(), LedgerError> {
        let entry = LedgerEntry::new(id.clone(), display_name, message);
        match self.store.append_line(&entry.to_line()) {
            Ok(()) => {
                self.sent.insert(id.clone());
                debug!(contact = %id, "Recorded contact in sent ledger");
                Ok(())
            }
            Err(e) => {
                warn!(
                    contact = %id,
                    ledger = %self.store.describe(),
                    error = %e,
                    "Failed to append to sent ledger; contact may be messaged again"
                );
                Err(e)
            }
        }
    }
}

/// How ledger files are named over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerRotation {
    /// `sent_messages_<YYYYmmdd>.log`, one file per day
    Daily,
    /// `sent_messages.log`
    None,
}

/// `[ledger]` configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Explicit ledger file; overrides directory and rotation
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Directory for rotated ledger files (default: platform data dir)
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default = "default_rotation")]
    pub rotation: LedgerRotation,
}

fn default_rotation() -> LedgerRotation {
    LedgerRotation::Daily
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: None,
            directory: None,
            rotation: default_rotation(),
        }
    }
}

impl LedgerConfig {
    /// Ledger file for `date`, given the fallback directory used when none is configured.
    pub fn resolve_path(&self, date: NaiveDate, default_dir: &Path) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        let dir = self
            .directory
            .clone()
            .unwrap_or_else(|| default_dir.to_path_buf());
        match self.rotation {
            LedgerRotation::Daily => {
                dir.join(format!("sent_messages_{}.log", date.format("%Y%m%d")))
            }
            LedgerRotation::None => dir.join("sent_messages.log"),
        }
    }
}
