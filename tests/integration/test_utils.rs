//! Shared test utilities for integration tests
//!
//! Provides a scripted automation driver, an in-memory ledger, a recording progress
//! reporter, and serialized access to process environment variables.

use courier::campaign::{CampaignConfig, CampaignController, LedgerStore};
use courier::contact::{ContactId, ContactRecord};
use courier::driver::{AutomationDriver, DriverFactory};
use courier::error::{DriverError, LedgerError};
use courier::progress::{CampaignEvent, ProgressEnvelope, ProgressReporter, ReportError};
use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Environment variable state to restore after test
struct EnvState {
    saved: Vec<(String, Option<String>)>,
}

impl EnvState {
    fn capture(keys: &[&str]) -> Self {
        Self {
            saved: keys
                .iter()
                .map(|k| (k.to_string(), std::env::var(k).ok()))
                .collect(),
        }
    }

    fn restore(self) {
        for (key, value) in self.saved {
            match value {
                Some(v) => std::env::set_var(&key, v),
                None => std::env::remove_var(&key),
            }
        }
    }
}

/// Run `f` with XDG directories and HOME pointed into `test_dir`, restoring the
/// environment afterwards. Also clears any `COURIER_ENV`.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture(&[
        "HOME",
        "XDG_CONFIG_HOME",
        "XDG_DATA_HOME",
        "XDG_STATE_HOME",
        "COURIER_ENV",
    ]);

    let config_home = test_dir.path().join("config");
    let data_home = test_dir.path().join("data");
    let state_home = test_dir.path().join("state");
    let home = test_dir.path().join("home");
    for dir in [&config_home, &data_home, &state_home, &home] {
        std::fs::create_dir_all(dir).unwrap();
    }

    std::env::set_var("XDG_CONFIG_HOME", &config_home);
    std::env::set_var("XDG_DATA_HOME", &data_home);
    std::env::set_var("XDG_STATE_HOME", &state_home);
    std::env::set_var("HOME", &home);
    std::env::remove_var("COURIER_ENV");

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));
    env_state.restore();
    match result {
        Ok(r) => r,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// A campaign config with every wait collapsed, for tests that must not sleep.
pub fn quick_config() -> CampaignConfig {
    CampaignConfig {
        no_delay: true,
        batch_delay_seconds: 0,
        ..CampaignConfig::default()
    }
}

pub fn contact(raw_id: &str, message: &str) -> ContactRecord {
    ContactRecord::new(raw_id, message)
}

pub fn id(raw: &str) -> ContactId {
    ContactId::parse(raw).unwrap()
}

/// One observed driver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect,
    Open(String),
    Deliver(String),
    Shutdown,
}

/// Blocks the first open of one contact until released.
struct OpenGate {
    target: String,
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

/// Handle the test uses to observe and release a gated open.
pub struct GateHandle {
    entered: Receiver<()>,
    release: Sender<()>,
}

impl GateHandle {
    /// Wait until the worker is inside the gated open.
    pub fn wait_entered(&self) {
        self.entered
            .recv_timeout(Duration::from_secs(10))
            .expect("worker never reached the gated contact");
    }

    pub fn release(&self) {
        self.release.send(()).unwrap();
    }
}

#[derive(Default)]
struct Script {
    fail_open: HashSet<String>,
    fail_deliver: bool,
    fail_connect: bool,
    gate: Option<OpenGate>,
}

/// Driver factory whose sessions follow a script and log every call.
#[derive(Clone, Default)]
pub struct ScriptedDriverFactory {
    calls: Arc<Mutex<Vec<Call>>>,
    script: Arc<Mutex<Script>>,
}

impl ScriptedDriverFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every open for `raw_id` answers "not opened".
    pub fn failing_open(self, raw_id: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .fail_open
            .insert(id(raw_id).to_string());
        self
    }

    /// Every delivery errors.
    pub fn failing_deliver(self) -> Self {
        self.script.lock().unwrap().fail_deliver = true;
        self
    }

    /// `connect` fails, so the run never starts processing.
    pub fn failing_connect(self) -> Self {
        self.script.lock().unwrap().fail_connect = true;
        self
    }

    /// Hold the first open of `raw_id` until the returned handle releases it.
    pub fn gate_open(&self, raw_id: &str) -> GateHandle {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        self.script.lock().unwrap().gate = Some(OpenGate {
            target: id(raw_id).to_string(),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        GateHandle {
            entered: entered_rx,
            release: release_tx,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn opens(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Open(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn opens_of(&self, raw_id: &str) -> usize {
        let target = id(raw_id).to_string();
        self.opens().iter().filter(|o| **o == target).count()
    }

    pub fn deliveries(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Deliver(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl DriverFactory for ScriptedDriverFactory {
    fn connect(&self) -> Result<Box<dyn AutomationDriver>, DriverError> {
        self.calls.lock().unwrap().push(Call::Connect);
        if self.script.lock().unwrap().fail_connect {
            return Err(DriverError::Setup("scripted connect failure".to_string()));
        }
        Ok(Box::new(ScriptedDriver {
            calls: Arc::clone(&self.calls),
            script: Arc::clone(&self.script),
        }))
    }
}

struct ScriptedDriver {
    calls: Arc<Mutex<Vec<Call>>>,
    script: Arc<Mutex<Script>>,
}

impl AutomationDriver for ScriptedDriver {
    fn open_conversation(
        &mut self,
        contact: &ContactId,
        _display_name: Option<&str>,
    ) -> Result<bool, DriverError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Open(contact.to_string()));

        let gate = {
            let mut script = self.script.lock().unwrap();
            match &script.gate {
                Some(g) if g.target == contact.as_str() => script.gate.take(),
                _ => None,
            }
        };
        if let Some(gate) = gate {
            gate.entered.lock().unwrap().send(()).unwrap();
            let _ = gate
                .release
                .lock()
                .unwrap()
                .recv_timeout(Duration::from_secs(10));
        }

        Ok(!self
            .script
            .lock()
            .unwrap()
            .fail_open
            .contains(contact.as_str()))
    }

    fn deliver_text(&mut self, text: &str) -> Result<bool, DriverError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Deliver(text.to_string()));
        if self.script.lock().unwrap().fail_deliver {
            return Err(DriverError::Action("scripted delivery failure".to_string()));
        }
        Ok(true)
    }

    fn shutdown(&mut self) {
        self.calls.lock().unwrap().push(Call::Shutdown);
    }
}

/// Ledger kept in memory; optionally refuses appends.
#[derive(Default)]
pub struct MemoryLedger {
    lines: Mutex<Vec<String>>,
    reject_appends: bool,
}

impl MemoryLedger {
    pub fn with_lines(lines: &[&str]) -> Self {
        Self {
            lines: Mutex::new(lines.iter().map(|l| l.to_string()).collect()),
            reject_appends: false,
        }
    }

    pub fn rejecting_appends() -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
            reject_appends: true,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl LedgerStore for MemoryLedger {
    fn read_lines(&self) -> Result<Vec<String>, LedgerError> {
        Ok(self.lines())
    }

    fn append_line(&self, line: &str) -> Result<(), LedgerError> {
        if self.reject_appends {
            return Err(LedgerError::Path("memory ledger is read-only".to_string()));
        }
        self.lines.lock().unwrap().push(line.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Collects every envelope it is given.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ProgressEnvelope>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<CampaignEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event.clone())
            .collect()
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        self.events().iter().map(|e| e.event_type()).collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, envelope: &ProgressEnvelope) -> Result<(), ReportError> {
        self.events.lock().unwrap().push(envelope.clone());
        Ok(())
    }
}

/// Controller wired to the given test doubles.
pub struct Harness {
    pub drivers: ScriptedDriverFactory,
    pub ledger: Arc<MemoryLedger>,
    pub reporter: Arc<RecordingReporter>,
    pub controller: CampaignController,
}

impl Harness {
    pub fn new(drivers: ScriptedDriverFactory, ledger: MemoryLedger) -> Self {
        let ledger = Arc::new(ledger);
        let reporter = Arc::new(RecordingReporter::default());
        let controller = CampaignController::new(
            Arc::new(drivers.clone()),
            Arc::clone(&ledger) as Arc<dyn LedgerStore>,
            Arc::clone(&reporter) as Arc<dyn ProgressReporter>,
        );
        Self {
            drivers,
            ledger,
            reporter,
            controller,
        }
    }

    pub fn simple() -> Self {
        Self::new(ScriptedDriverFactory::new(), MemoryLedger::default())
    }
}
