//! The per-run worker loop.
//!
//! One [`CampaignWorker`] owns everything a single run needs and is moved onto the
//! worker thread by the controller. It is the only writer of the duplicate ledger and
//! of terminal campaign states.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::campaign::batch::BatchScheduler;
use crate::campaign::control::{Checkpoint, ControlSignals, Waiter};
use crate::campaign::delay::{BatchCountdown, DelayPolicy};
use crate::campaign::ledger::{DuplicateLedger, LedgerStore};
use crate::campaign::result::{
    CampaignResult, CheckEntry, CheckReport, CheckStatus, ContactOutcome, FailureReason,
    LedgerWriteFailure, RunReport,
};
use crate::campaign::retry::{RetryExecutor, RetryPolicy};
use crate::campaign::settings::CampaignConfig;
use crate::campaign::state::StateCell;
use crate::campaign::CampaignState;
use crate::contact::ContactRecord;
use crate::driver::{AutomationDriver, DriverFactory};
use crate::progress::{
    BatchBoundaryData, BatchCompletedData, BatchCountdownData, CampaignEvent,
    CampaignStartedData, ContactOutcomeData, Reporter, RunMode, StateChangedData,
};

/// Settle after a conversation opens.
pub const OPEN_SETTLE: Duration = Duration::from_secs(2);

/// Settle after a message is delivered.
pub const DELIVER_SETTLE: Duration = Duration::from_secs(1);

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

pub(crate) struct CampaignWorker {
    pub config: CampaignConfig,
    pub contacts: Vec<ContactRecord>,
    pub drivers: Arc<dyn DriverFactory>,
    pub ledger: Arc<dyn LedgerStore>,
    pub reporter: Reporter,
    pub signals: Arc<ControlSignals>,
    pub state: Arc<StateCell>,
}

/// Whether handling a contact reached the automation driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Touch {
    Driver,
    Skipped,
}

impl CampaignWorker {
    pub fn run(self, mode: RunMode) -> RunReport {
        match mode {
            RunMode::Send => RunReport::Campaign(self.run_campaign()),
            RunMode::Check => RunReport::Check(self.run_check()),
        }
    }

    fn run_campaign(self) -> CampaignResult {
        let campaign_id = self.reporter.campaign_id().to_string();
        let mut result = CampaignResult::new(campaign_id.as_str(), self.contacts.len());

        let mut driver = match self.drivers.connect() {
            Ok(driver) => driver,
            Err(e) => {
                error!(campaign = %campaign_id, error = %e, "Automation driver setup failed");
                result.error = Some(e.to_string());
                return self.finish_campaign(result, CampaignState::Failed);
            }
        };

        let ledger = DuplicateLedger::load(self.ledger.as_ref(), self.config.duplicate_check);
        let scheduler = BatchScheduler::new(self.config.batch_size, self.contacts.len());
        let delays = DelayPolicy::from_config(&self.config);
        let waiter: &dyn Waiter = &*self.signals;
        let retry = RetryExecutor::new(&delays, waiter);

        self.reporter
            .emit_best_effort(CampaignEvent::Started(CampaignStartedData {
                mode: RunMode::Send,
                total_contacts: self.contacts.len(),
                total_batches: scheduler.total_batches(),
                duplicate_check: ledger.is_enabled(),
                previously_sent: ledger.len(),
            }));

        let mut step = ContactStep {
            driver: driver.as_mut(),
            ledger,
            reporter: &self.reporter,
            retry: &retry,
            delays: &delays,
            waiter,
            open_policy: RetryPolicy::new(self.config.open_retries(), self.config.retry_backoff()),
            deliver_policy: RetryPolicy::new(self.config.max_retries, self.config.retry_backoff()),
        };

        for (index, contact) in self.contacts.iter().enumerate() {
            if self.signals.checkpoint() == Checkpoint::Stop {
                info!(
                    campaign = %campaign_id,
                    processed = result.processed,
                    remaining = self.contacts.len() - index,
                    "Stop requested; ending campaign"
                );
                result.stopped = true;
                break;
            }

            if let Some(boundary) = scheduler.boundary_before(index) {
                self.reporter
                    .emit_best_effort(CampaignEvent::BatchBoundary(BatchBoundaryData {
                        batch: boundary.number,
                        total_batches: boundary.total_batches,
                        processed: result.processed,
                    }));
            }

            let (outcome, touch) = step.process(contact, &mut result);
            self.reporter
                .emit_best_effort(CampaignEvent::ContactOutcome(ContactOutcomeData {
                    index,
                    contact_id: contact
                        .contact_id()
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| contact.raw_id.clone()),
                    display_name: contact.display_name.clone(),
                    outcome,
                }));

            if result.processed >= self.config.contact_limit {
                info!(
                    campaign = %campaign_id,
                    limit = self.config.contact_limit,
                    "Contact limit reached"
                );
                result.limit_reached = true;
                break;
            }

            if index + 1 == self.contacts.len() {
                break;
            }

            if scheduler.delay_after(index) {
                self.reporter
                    .emit_best_effort(CampaignEvent::BatchCompleted(BatchCompletedData {
                        batch: scheduler.batch_of(index),
                        processed: result.processed,
                        succeeded: result.succeeded,
                        skipped_duplicates: result.skipped_duplicates,
                        failed: result.failed.len(),
                    }));
                self.wait_for_next_batch(&delays);
            } else if touch == Touch::Driver {
                let seconds = delays.next_contact_delay();
                if seconds > 0 {
                    debug!(seconds, "Waiting before next contact");
                    waiter.pace(delays.controlled(Duration::from_secs(seconds)));
                }
            }
        }

        step.driver.shutdown();
        self.finish_campaign(result, CampaignState::Finished)
    }

    fn run_check(self) -> CheckReport {
        let campaign_id = self.reporter.campaign_id().to_string();
        let mut report = CheckReport {
            campaign_id: campaign_id.clone(),
            state: CampaignState::Running,
            entries: Vec::with_capacity(self.contacts.len()),
            total_contacts: self.contacts.len(),
            stopped: false,
            error: None,
        };

        let mut driver = match self.drivers.connect() {
            Ok(driver) => driver,
            Err(e) => {
                error!(campaign = %campaign_id, error = %e, "Automation driver setup failed");
                report.error = Some(e.to_string());
                return self.finish_check(report, CampaignState::Failed);
            }
        };

        // Prior-send status is reported even when duplicate suppression is off.
        let ledger = DuplicateLedger::load(self.ledger.as_ref(), true);
        let delays = DelayPolicy::from_config(&self.config);
        let waiter: &dyn Waiter = &*self.signals;
        let retry = RetryExecutor::new(&delays, waiter);
        let open_policy = RetryPolicy::new(self.config.open_retries(), self.config.retry_backoff());

        self.reporter
            .emit_best_effort(CampaignEvent::Started(CampaignStartedData {
                mode: RunMode::Check,
                total_contacts: self.contacts.len(),
                total_batches: 1,
                duplicate_check: true,
                previously_sent: ledger.len(),
            }));

        for contact in &self.contacts {
            if self.signals.checkpoint() == Checkpoint::Stop {
                report.stopped = true;
                break;
            }

            let entry = match contact.contact_id() {
                None => CheckEntry {
                    id: contact.raw_id.clone(),
                    display_name: contact.display_name.clone(),
                    previously_sent: false,
                    status: CheckStatus::InvalidIdentifier,
                },
                Some(id) => {
                    let previously_sent = ledger.known().contains(&id);
                    let name = contact.display_name.as_deref();
                    let opened = retry.execute("open_conversation", open_policy, |_| {
                        driver.open_conversation(&id, name)
                    });
                    let status = match (opened.succeeded, previously_sent) {
                        (false, _) => {
                            warn!(
                                contact = %id,
                                attempts = opened.attempts,
                                error = opened.last_error.as_deref().unwrap_or("unsuccessful"),
                                "Could not open conversation"
                            );
                            CheckStatus::Unreachable
                        }
                        (true, true) => CheckStatus::AlreadySent,
                        (true, false) => CheckStatus::NotSent,
                    };
                    if opened.succeeded {
                        waiter.settle(delays.controlled(OPEN_SETTLE));
                    }
                    CheckEntry {
                        id: id.to_string(),
                        display_name: contact.display_name.clone(),
                        previously_sent,
                        status,
                    }
                }
            };

            self.reporter
                .emit_best_effort(CampaignEvent::CheckResult(entry.clone()));
            report.entries.push(entry);
        }

        driver.shutdown();
        self.finish_check(report, CampaignState::Finished)
    }

    /// Count down the inter-batch pause one second at a time. A stop request cuts the
    /// countdown short; the next checkpoint then ends the run.
    fn wait_for_next_batch(&self, delays: &DelayPolicy) {
        let countdown = delays.next_batch_delay();
        if countdown.total_seconds() == 0 {
            return;
        }
        info!(
            seconds = countdown.total_seconds(),
            "Batch complete; waiting before next batch"
        );
        let waiter: &dyn Waiter = &*self.signals;
        for remaining in countdown {
            if BatchCountdown::is_announced(remaining) {
                self.reporter
                    .emit_best_effort(CampaignEvent::BatchCountdown(BatchCountdownData {
                        remaining_seconds: remaining,
                    }));
            }
            if !waiter.pace(delays.controlled(COUNTDOWN_TICK)) {
                break;
            }
        }
    }

    fn finish_campaign(&self, mut result: CampaignResult, to: CampaignState) -> CampaignResult {
        result.finish(to);
        self.publish_terminal(to);
        info!(
            campaign = %result.campaign_id,
            state = %to,
            succeeded = result.succeeded,
            failed = result.failed.len(),
            skipped = result.skipped_duplicates,
            processed = result.processed,
            "Campaign ended"
        );
        self.reporter
            .emit_best_effort(CampaignEvent::Summary(result.clone()));
        result
    }

    fn finish_check(&self, mut report: CheckReport, to: CampaignState) -> CheckReport {
        report.state = to;
        self.publish_terminal(to);
        self.reporter
            .emit_best_effort(CampaignEvent::CheckSummary(report.clone()));
        report
    }

    fn publish_terminal(&self, to: CampaignState) {
        debug_assert!(to.is_terminal(), "worker may only publish terminal states");
        let from = self.state.set(to);
        self.reporter
            .emit_best_effort(CampaignEvent::StateChanged(StateChangedData { from, to }));
    }
}

/// Per-contact processing for a send run.
struct ContactStep<'a> {
    driver: &'a mut dyn AutomationDriver,
    ledger: DuplicateLedger<'a>,
    reporter: &'a Reporter,
    retry: &'a RetryExecutor<'a>,
    delays: &'a DelayPolicy,
    waiter: &'a dyn Waiter,
    open_policy: RetryPolicy,
    deliver_policy: RetryPolicy,
}

impl ContactStep<'_> {
    /// Process one contact, updating `result`. Every contact lands in exactly one of
    /// succeeded, skipped or failed; `processed` counts contacts whose conversation
    /// opened.
    fn process(
        &mut self,
        contact: &ContactRecord,
        result: &mut CampaignResult,
    ) -> (ContactOutcome, Touch) {
        let Some(id) = contact.contact_id() else {
            warn!(raw = %contact.raw_id, "Skipping contact with invalid identifier");
            return (
                self.fail(result, contact.raw_id.clone(), FailureReason::InvalidIdentifier),
                Touch::Skipped,
            );
        };

        if self.ledger.contains(&id) {
            info!(contact = %id, "Already messaged; skipping");
            result.skipped_duplicates += 1;
            return (ContactOutcome::SkippedDuplicate, Touch::Skipped);
        }

        let name = contact.display_name.as_deref();
        let driver = &mut *self.driver;
        let opened = self
            .retry
            .execute("open_conversation", self.open_policy, |_| {
                driver.open_conversation(&id, name)
            });
        if !opened.succeeded {
            warn!(
                contact = %id,
                attempts = opened.attempts,
                error = opened.last_error.as_deref().unwrap_or("unsuccessful"),
                "Could not open conversation"
            );
            return (
                self.fail(result, id.to_string(), FailureReason::OpenFailed),
                Touch::Driver,
            );
        }
        self.waiter.settle(self.delays.controlled(OPEN_SETTLE));

        let outcome = if contact.has_message() {
            let driver = &mut *self.driver;
            let text = contact.message.as_str();
            let delivered = self
                .retry
                .execute("deliver_text", self.deliver_policy, |_| driver.deliver_text(text));
            if delivered.succeeded {
                result.succeeded += 1;
                info!(contact = %id, attempts = delivered.attempts, "Message sent");
                if let Err(e) = self.ledger.record(&id, name, text) {
                    let failure = LedgerWriteFailure {
                        id: id.to_string(),
                        error: e.to_string(),
                    };
                    self.reporter
                        .emit_best_effort(CampaignEvent::LedgerWriteFailed(failure.clone()));
                    result.ledger_failures.push(failure);
                }
                self.waiter.settle(self.delays.controlled(DELIVER_SETTLE));
                ContactOutcome::Sent {
                    attempts: delivered.attempts,
                }
            } else {
                warn!(
                    contact = %id,
                    attempts = delivered.attempts,
                    error = delivered.last_error.as_deref().unwrap_or("unsuccessful"),
                    "Failed to deliver message"
                );
                self.fail(result, id.to_string(), FailureReason::DeliveryFailed)
            }
        } else {
            debug!(contact = %id, "No message body; conversation opened only");
            result.succeeded += 1;
            ContactOutcome::Opened
        };

        result.processed += 1;
        (outcome, Touch::Driver)
    }

    fn fail(
        &self,
        result: &mut CampaignResult,
        id: String,
        reason: FailureReason,
    ) -> ContactOutcome {
        result.record_failure(id, reason);
        ContactOutcome::Failed { reason }
    }
}
