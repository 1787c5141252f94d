//! Event schema for campaign progress.

use crate::campaign::{
    CampaignResult, CampaignState, CheckEntry, CheckReport, ContactOutcome, LedgerWriteFailure,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serialized, sequenced form written to event files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub ts: String,
    pub campaign: String,
    pub seq: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
}

impl ProgressEvent {
    pub fn from_envelope(envelope: &ProgressEnvelope, seq: u64) -> Result<Self, serde_json::Error> {
        Ok(Self {
            ts: envelope.ts.clone(),
            campaign: envelope.campaign.clone(),
            seq,
            event_type: envelope.event.event_type().to_string(),
            data: envelope.event.data()?,
        })
    }
}

/// A campaign event stamped with its campaign id and emission time.
#[derive(Debug, Clone)]
pub struct ProgressEnvelope {
    pub ts: String,
    pub campaign: String,
    pub event: CampaignEvent,
}

impl ProgressEnvelope {
    pub fn with_now(campaign: impl Into<String>, event: CampaignEvent) -> Self {
        Self {
            ts: crate::progress::session::now_millis().to_string(),
            campaign: campaign.into(),
            event,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Send,
    Check,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignStartedData {
    pub mode: RunMode,
    pub total_contacts: usize,
    pub total_batches: usize,
    pub duplicate_check: bool,
    pub previously_sent: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateChangedData {
    pub from: CampaignState,
    pub to: CampaignState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchBoundaryData {
    pub batch: usize,
    pub total_batches: usize,
    pub processed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCountdownData {
    pub remaining_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCompletedData {
    pub batch: usize,
    pub processed: u64,
    pub succeeded: usize,
    pub skipped_duplicates: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactOutcomeData {
    /// 0-based position in the contact list
    pub index: usize,
    pub contact_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub outcome: ContactOutcome,
}

/// Everything the engine tells its observers.
#[derive(Debug, Clone)]
pub enum CampaignEvent {
    Started(CampaignStartedData),
    StateChanged(StateChangedData),
    BatchBoundary(BatchBoundaryData),
    BatchCountdown(BatchCountdownData),
    BatchCompleted(BatchCompletedData),
    ContactOutcome(ContactOutcomeData),
    /// Sent, but the ledger record was not persisted
    LedgerWriteFailed(LedgerWriteFailure),
    CheckResult(CheckEntry),
    Summary(CampaignResult),
    CheckSummary(CheckReport),
}

impl CampaignEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            CampaignEvent::Started(_) => "campaign_started",
            CampaignEvent::StateChanged(_) => "state_changed",
            CampaignEvent::BatchBoundary(_) => "batch_started",
            CampaignEvent::BatchCountdown(_) => "batch_countdown",
            CampaignEvent::BatchCompleted(_) => "batch_completed",
            CampaignEvent::ContactOutcome(_) => "contact_outcome",
            CampaignEvent::LedgerWriteFailed(_) => "ledger_write_failed",
            CampaignEvent::CheckResult(_) => "check_result",
            CampaignEvent::Summary(_) => "campaign_summary",
            CampaignEvent::CheckSummary(_) => "check_summary",
        }
    }

    pub fn data(&self) -> Result<Value, serde_json::Error> {
        match self {
            CampaignEvent::Started(d) => serde_json::to_value(d),
            CampaignEvent::StateChanged(d) => serde_json::to_value(d),
            CampaignEvent::BatchBoundary(d) => serde_json::to_value(d),
            CampaignEvent::BatchCountdown(d) => serde_json::to_value(d),
            CampaignEvent::BatchCompleted(d) => serde_json::to_value(d),
            CampaignEvent::ContactOutcome(d) => serde_json::to_value(d),
            CampaignEvent::LedgerWriteFailed(d) => serde_json::to_value(d),
            CampaignEvent::CheckResult(d) => serde_json::to_value(d),
            CampaignEvent::Summary(d) => serde_json::to_value(d),
            CampaignEvent::CheckSummary(d) => serde_json::to_value(d),
        }
    }

    /// Terminal events close a run's event stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CampaignEvent::Summary(_) | CampaignEvent::CheckSummary(_)
        )
    }
}
