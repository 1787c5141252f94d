//! Campaign Controller: the control surface the presentation layer drives.
//!
//! The controller owns the campaign state and at most one worker thread. `start` and
//! `check_only` spawn the worker; `pause`, `resume` and `stop` flip the shared control
//! flags and return immediately. The worker observes the flags only between contacts.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::campaign::control::ControlSignals;
use crate::campaign::ledger::LedgerStore;
use crate::campaign::result::RunReport;
use crate::campaign::runner::CampaignWorker;
use crate::campaign::settings::CampaignConfig;
use crate::campaign::state::StateCell;
use crate::campaign::CampaignState;
use crate::contact::{ContactRecord, ContactSource};
use crate::driver::DriverFactory;
use crate::error::CampaignError;
use crate::progress::{
    new_campaign_id, CampaignEvent, ProgressReporter, Reporter, RunMode, StateChangedData,
};

struct ActiveRun {
    reporter: Reporter,
    signals: Arc<ControlSignals>,
    handle: Option<JoinHandle<RunReport>>,
}

pub struct CampaignController {
    drivers: Arc<dyn DriverFactory>,
    ledger: Arc<dyn LedgerStore>,
    sink: Arc<dyn ProgressReporter>,
    state: Arc<StateCell>,
    run: Mutex<Option<ActiveRun>>,
}

impl CampaignController {
    pub fn new(
        drivers: Arc<dyn DriverFactory>,
        ledger: Arc<dyn LedgerStore>,
        sink: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            drivers,
            ledger,
            sink,
            state: Arc::new(StateCell::new()),
            run: Mutex::new(None),
        }
    }

    pub fn state(&self) -> CampaignState {
        self.state.get()
    }

    pub fn is_active(&self) -> bool {
        self.state.get().is_active()
    }

    /// Id of the current or most recent run.
    pub fn campaign_id(&self) -> Option<String> {
        self.run
            .lock()
            .as_ref()
            .map(|run| run.reporter.campaign_id().to_string())
    }

    /// Start a send run over `contacts`. Returns the new campaign id.
    ///
    /// Rejected with [`CampaignError::AlreadyActive`] while another run is Running,
    /// Paused or stopping.
    pub fn start(
        &self,
        config: CampaignConfig,
        contacts: Vec<ContactRecord>,
    ) -> Result<String, CampaignError> {
        self.launch(RunMode::Send, config, contacts)
    }

    /// Load contacts from `source`, then start. A source failure leaves the controller
    /// where it was.
    pub fn start_from_source(
        &self,
        config: CampaignConfig,
        source: &dyn ContactSource,
    ) -> Result<String, CampaignError> {
        self.ensure_idle()?;
        let contacts = source.load_contacts().map_err(|e| {
            warn!(source = %source.describe(), error = %e, "Failed to load contacts");
            CampaignError::from(e)
        })?;
        info!(source = %source.describe(), contacts = contacts.len(), "Loaded contacts");
        self.start(config, contacts)
    }

    /// Start a read-only run: open each conversation and report prior-send status
    /// without delivering anything.
    pub fn check_only(
        &self,
        config: CampaignConfig,
        contacts: Vec<ContactRecord>,
    ) -> Result<String, CampaignError> {
        self.launch(RunMode::Check, config, contacts)
    }

    /// Request a pause at the next contact boundary. Idempotent.
    pub fn pause(&self) -> CampaignState {
        self.signal(CampaignState::Running, CampaignState::Paused, |s| s.pause())
    }

    /// Resume a paused run. Idempotent.
    pub fn resume(&self) -> CampaignState {
        self.signal(CampaignState::Paused, CampaignState::Running, |s| s.resume())
    }

    /// Request a stop. Releases any pause; the worker exits at the next boundary.
    pub fn stop(&self) -> CampaignState {
        let run = self.run.lock();
        let Some(run) = run.as_ref() else {
            return self.state.get();
        };
        if let Some(from) = self.state.transition(
            &[CampaignState::Running, CampaignState::Paused],
            CampaignState::StopRequested,
        ) {
            run.signals.stop();
            info!(campaign = %run.reporter.campaign_id(), "Stop requested");
            run.reporter
                .emit_best_effort(CampaignEvent::StateChanged(StateChangedData {
                    from,
                    to: CampaignState::StopRequested,
                }));
        }
        self.state.get()
    }

    /// Block until the current worker exits and return what it produced. `Ok(None)` if
    /// there is no worker to wait for.
    pub fn wait(&self) -> Result<Option<RunReport>, CampaignError> {
        let handle = self.run.lock().as_mut().and_then(|run| run.handle.take());
        let Some(handle) = handle else {
            return Ok(None);
        };
        match handle.join() {
            Ok(report) => Ok(Some(report)),
            Err(_) => {
                self.state.set(CampaignState::Failed);
                Err(CampaignError::WorkerPanicked)
            }
        }
    }

    fn signal(
        &self,
        from: CampaignState,
        to: CampaignState,
        apply: impl FnOnce(&ControlSignals),
    ) -> CampaignState {
        let run = self.run.lock();
        let Some(run) = run.as_ref() else {
            return self.state.get();
        };
        if let Some(previous) = self.state.transition(&[from], to) {
            apply(&run.signals);
            info!(campaign = %run.reporter.campaign_id(), from = %previous, to = %to, "Campaign state changed");
            run.reporter
                .emit_best_effort(CampaignEvent::StateChanged(StateChangedData {
                    from: previous,
                    to,
                }));
        }
        self.state.get()
    }

    fn ensure_idle(&self) -> Result<(), CampaignError> {
        let current = self.state.get();
        if current.is_active() {
            warn!(state = %current, "A campaign is already active; start request ignored");
            return Err(CampaignError::AlreadyActive(current));
        }
        Ok(())
    }

    fn launch(
        &self,
        mode: RunMode,
        config: CampaignConfig,
        contacts: Vec<ContactRecord>,
    ) -> Result<String, CampaignError> {
        let config = config.normalized()?;
        let mut run = self.run.lock();

        let Some(previous) = self.state.transition(
            &[
                CampaignState::Idle,
                CampaignState::Finished,
                CampaignState::Failed,
            ],
            CampaignState::Running,
        ) else {
            let current = self.state.get();
            warn!(state = %current, "A campaign is already active; start request ignored");
            return Err(CampaignError::AlreadyActive(current));
        };

        // Reap the previous worker; its report is dropped if nobody waited for it.
        if let Some(handle) = run.take().and_then(|old| old.handle) {
            let _ = handle.join();
        }

        let campaign_id = new_campaign_id();
        let reporter = Reporter::new(campaign_id.as_str(), Arc::clone(&self.sink));
        let signals = Arc::new(ControlSignals::new());
        let worker = CampaignWorker {
            config,
            contacts,
            drivers: Arc::clone(&self.drivers),
            ledger: Arc::clone(&self.ledger),
            reporter: reporter.clone(),
            signals: Arc::clone(&signals),
            state: Arc::clone(&self.state),
        };

        info!(campaign = %campaign_id, mode = ?mode, "Campaign started");
        reporter.emit_best_effort(CampaignEvent::StateChanged(StateChangedData {
            from: previous,
            to: CampaignState::Running,
        }));

        let spawned = thread::Builder::new()
            .name(format!("courier-{}", campaign_id))
            .spawn(move || worker.run(mode));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.state.set(previous);
                warn!(campaign = %campaign_id, error = %e, "Could not spawn campaign worker");
                reporter.emit_best_effort(CampaignEvent::StateChanged(StateChangedData {
                    from: CampaignState::Running,
                    to: previous,
                }));
                return Err(CampaignError::Spawn(e.to_string()));
            }
        };

        *run = Some(ActiveRun {
            reporter,
            signals,
            handle: Some(handle),
        });
        Ok(campaign_id)
    }
}

impl Drop for CampaignController {
    fn drop(&mut self) {
        if let Some(run) = self.run.get_mut().as_mut() {
            run.signals.stop();
            if let Some(handle) = run.handle.take() {
                let _ = handle.join();
            }
        }
    }
}
