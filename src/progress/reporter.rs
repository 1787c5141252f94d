//! Progress reporters: where campaign events go once the worker emits them.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{info, warn};

use crate::progress::event::{CampaignEvent, ProgressEnvelope, ProgressEvent};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Progress receiver disconnected")]
    Disconnected,

    #[error("Failed to write event file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A destination for progress events.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, envelope: &ProgressEnvelope) -> Result<(), ReportError>;
}

/// Writes each event to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&self, envelope: &ProgressEnvelope) -> Result<(), ReportError> {
        let campaign = envelope.campaign.as_str();
        match &envelope.event {
            CampaignEvent::Started(d) => info!(
                campaign,
                mode = ?d.mode,
                total_contacts = d.total_contacts,
                total_batches = d.total_batches,
                previously_sent = d.previously_sent,
                "Campaign started"
            ),
            CampaignEvent::StateChanged(d) => {
                info!(campaign, from = %d.from, to = %d.to, "Campaign state changed")
            }
            CampaignEvent::BatchBoundary(d) => info!(
                campaign,
                batch = d.batch,
                total_batches = d.total_batches,
                processed = d.processed,
                "Starting batch"
            ),
            CampaignEvent::BatchCountdown(d) => {
                info!(campaign, remaining_seconds = d.remaining_seconds, "Waiting for next batch")
            }
            CampaignEvent::BatchCompleted(d) => info!(
                campaign,
                batch = d.batch,
                processed = d.processed,
                succeeded = d.succeeded,
                skipped = d.skipped_duplicates,
                failed = d.failed,
                "Batch completed"
            ),
            CampaignEvent::ContactOutcome(d) => info!(
                campaign,
                index = d.index,
                contact = %d.contact_id,
                outcome = d.outcome.label(),
                "Contact processed"
            ),
            CampaignEvent::LedgerWriteFailed(d) => warn!(
                campaign,
                contact = %d.id,
                error = %d.error,
                "Sent ledger not updated"
            ),
            CampaignEvent::CheckResult(d) => info!(
                campaign,
                contact = %d.id,
                status = d.status.as_str(),
                "Contact checked"
            ),
            CampaignEvent::Summary(r) => info!(
                campaign,
                state = %r.state,
                succeeded = r.succeeded,
                failed = r.failed.len(),
                skipped = r.skipped_duplicates,
                processed = r.processed,
                "Campaign finished"
            ),
            CampaignEvent::CheckSummary(r) => info!(
                campaign,
                state = %r.state,
                checked = r.entries.len(),
                "Check finished"
            ),
        }
        Ok(())
    }
}

/// Appends sequenced events to a JSON Lines file.
pub struct EventFileSink {
    path: PathBuf,
    inner: Mutex<EventFileState>,
}

struct EventFileState {
    writer: BufWriter<File>,
    next_seq: u64,
}

impl EventFileSink {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let path = path.as_ref().to_path_buf();
        let io_err = |source| ReportError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        Ok(Self {
            path: path.clone(),
            inner: Mutex::new(EventFileState {
                writer: BufWriter::new(file),
                next_seq: 1,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressReporter for EventFileSink {
    fn report(&self, envelope: &ProgressEnvelope) -> Result<(), ReportError> {
        let mut state = self.inner.lock();
        let event = ProgressEvent::from_envelope(envelope, state.next_seq)?;
        let line = serde_json::to_string(&event)?;
        let io_err = |source| ReportError::Io {
            path: self.path.clone(),
            source,
        };
        writeln!(state.writer, "{line}").map_err(io_err)?;
        state.writer.flush().map_err(io_err)?;
        state.next_seq += 1;
        Ok(())
    }
}

/// Forwards every event to each inner reporter; the first error is returned
/// after all reporters have been tried.
#[derive(Default)]
pub struct FanoutReporter {
    reporters: Vec<Arc<dyn ProgressReporter>>,
}

impl FanoutReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporters.push(reporter);
        self
    }

    pub fn push(&mut self, reporter: Arc<dyn ProgressReporter>) {
        self.reporters.push(reporter);
    }
}

impl ProgressReporter for FanoutReporter {
    fn report(&self, envelope: &ProgressEnvelope) -> Result<(), ReportError> {
        let mut first_err = None;
        for reporter in &self.reporters {
            if let Err(err) = reporter.report(envelope) {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Campaign-scoped handle used by the worker. Reporting never fails the run.
#[derive(Clone)]
pub struct Reporter {
    campaign_id: String,
    sink: Arc<dyn ProgressReporter>,
}

impl Reporter {
    pub fn new(campaign_id: impl Into<String>, sink: Arc<dyn ProgressReporter>) -> Self {
        Self {
            campaign_id: campaign_id.into(),
            sink,
        }
    }

    pub fn campaign_id(&self) -> &str {
        &self.campaign_id
    }

    pub fn emit_best_effort(&self, event: CampaignEvent) {
        let event_type = event.event_type();
        let envelope = ProgressEnvelope::with_now(self.campaign_id.clone(), event);
        if let Err(err) = self.sink.report(&envelope) {
            warn!(
                campaign = %self.campaign_id,
                event_type,
                error = %err,
                "failed to emit progress event"
            );
        }
    }
}
