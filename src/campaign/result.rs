//! Per-contact outcomes and run summaries.

use crate::campaign::CampaignState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a contact ended up in `failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Identifier empty or not a phone-like value; never retried
    InvalidIdentifier,
    /// Conversation could not be opened after all attempts
    OpenFailed,
    /// Message could not be delivered after all attempts
    DeliveryFailed,
}

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::InvalidIdentifier => "invalid identifier",
            FailureReason::OpenFailed => "could not open conversation",
            FailureReason::DeliveryFailed => "failed to deliver message",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ContactOutcome {
    Sent { attempts: u32 },
    /// Conversation opened; the contact had no message body
    Opened,
    SkippedDuplicate,
    Failed { reason: FailureReason },
}

impl ContactOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ContactOutcome::Sent { .. } => "sent",
            ContactOutcome::Opened => "opened",
            ContactOutcome::SkippedDuplicate => "skipped_duplicate",
            ContactOutcome::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedContact {
    /// Normalized id, or the raw value when it could not be normalized
    pub id: String,
    pub reason: FailureReason,
}

/// A successful send whose ledger record could not be written. The contact is not
/// remembered as sent, so a later occurrence in the list is delivered again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerWriteFailure {
    pub id: String,
    pub error: String,
}

/// Accumulated counters for one campaign run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignResult {
    pub campaign_id: String,
    pub state: CampaignState,
    pub succeeded: usize,
    pub failed: Vec<FailedContact>,
    pub skipped_duplicates: usize,
    pub processed: u64,
    pub total_contacts: usize,
    /// The run ended because of a stop request
    pub stopped: bool,
    /// The run ended because the contact limit was reached
    pub limit_reached: bool,
    #[serde(default)]
    pub ledger_failures: Vec<LedgerWriteFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl CampaignResult {
    pub fn new(campaign_id: impl Into<String>, total_contacts: usize) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            state: CampaignState::Running,
            succeeded: 0,
            failed: Vec::new(),
            skipped_duplicates: 0,
            processed: 0,
            total_contacts,
            stopped: false,
            limit_reached: false,
            ledger_failures: Vec::new(),
            error: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn record_failure(&mut self, id: impl Into<String>, reason: FailureReason) {
        self.failed.push(FailedContact {
            id: id.into(),
            reason,
        });
    }

    /// Contacts that landed in exactly one outcome bucket.
    pub fn accounted(&self) -> usize {
        self.succeeded + self.skipped_duplicates + self.failed.len()
    }

    pub fn finish(&mut self, state: CampaignState) {
        self.state = state;
        self.ended_at = Some(Utc::now());
    }
}

/// Prior-send and reachability status of one contact in a check-only run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// Already in the sent ledger; conversation opens
    AlreadySent,
    /// Not in the ledger; conversation opens
    NotSent,
    /// Conversation could not be opened
    Unreachable,
    InvalidIdentifier,
}

impl CheckStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::AlreadySent => "already sent",
            CheckStatus::NotSent => "not sent",
            CheckStatus::Unreachable => "unreachable",
            CheckStatus::InvalidIdentifier => "invalid identifier",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub previously_sent: bool,
    pub status: CheckStatus,
}

/// Result of a check-only run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub campaign_id: String,
    pub state: CampaignState,
    pub entries: Vec<CheckEntry>,
    pub total_contacts: usize,
    pub stopped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckReport {
    pub fn count(&self, status: CheckStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }
}

/// What a worker produced when it exited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunReport {
    Campaign(CampaignResult),
    Check(CheckReport),
}

impl RunReport {
    pub fn state(&self) -> CampaignState {
        match self {
            RunReport::Campaign(r) => r.state,
            RunReport::Check(r) => r.state,
        }
    }

    pub fn as_campaign(&self) -> Option<&CampaignResult> {
        match self {
            RunReport::Campaign(r) => Some(r),
            RunReport::Check(_) => None,
        }
    }

    pub fn as_check(&self) -> Option<&CheckReport> {
        match self {
            RunReport::Check(r) => Some(r),
            RunReport::Campaign(_) => None,
        }
    }
}
