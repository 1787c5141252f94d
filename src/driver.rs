//! UI automation drivers.
//!
//! The campaign engine never talks to the messaging surface directly. It asks a
//! [`DriverFactory`] for a connected [`AutomationDriver`] when a run starts and then
//! issues two operations per contact: open a conversation, deliver a block of text.
//! Both may be retried for the same target in immediate succession, so implementations
//! must tolerate repeated calls.

use crate::contact::ContactId;
use crate::error::DriverError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::{ChildStdin, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A connected automation session.
///
/// `Ok(false)` is a clean "did not work" answer; `Err` is a transient failure. The
/// retry executor treats both as retryable.
pub trait AutomationDriver: Send {
    fn open_conversation(
        &mut self,
        contact: &ContactId,
        display_name: Option<&str>,
    ) -> Result<bool, DriverError>;

    fn deliver_text(&mut self, text: &str) -> Result<bool, DriverError>;

    /// Release the automation session. Called once when the campaign worker exits.
    fn shutdown(&mut self) {}
}

/// Creates driver sessions. A failing `connect` is a campaign-fatal setup failure.
pub trait DriverFactory: Send + Sync {
    fn connect(&self) -> Result<Box<dyn AutomationDriver>, DriverError>;
}

/// Driver selection from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    Simulate,
    Command,
}

/// `[driver]` configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    #[serde(default = "default_driver_kind")]
    pub kind: DriverKind,
    /// Program invoked by the command driver
    #[serde(default)]
    pub program: Option<String>,
    /// Extra arguments placed before the action verb
    #[serde(default)]
    pub args: Vec<String>,
    /// Per-call detection timeout
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_driver_kind() -> DriverKind {
    DriverKind::Simulate
}

fn default_timeout_seconds() -> u64 {
    20
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            kind: default_driver_kind(),
            program: None,
            args: Vec::new(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl DriverConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.kind == DriverKind::Command
            && self.program.as_deref().map_or(true, |p| p.trim().is_empty())
        {
            return Err("driver.program is required when driver.kind = \"command\"".to_string());
        }
        if self.timeout_seconds == 0 {
            return Err("driver.timeout_seconds must be positive".to_string());
        }
        Ok(())
    }

    /// Build the factory this configuration describes.
    pub fn build_factory(&self) -> Result<Box<dyn DriverFactory>, DriverError> {
        self.validate().map_err(DriverError::Setup)?;
        match self.kind {
            DriverKind::Simulate => Ok(Box::new(SimulatedDriverFactory)),
            DriverKind::Command => Ok(Box::new(CommandDriverFactory {
                program: self.program.clone().unwrap_or_default(),
                args: self.args.clone(),
                timeout: Duration::from_secs(self.timeout_seconds),
            })),
        }
    }
}

/// Dry-run driver: logs every action and reports success.
#[derive(Debug, Default)]
pub struct SimulatedDriver {
    open: Option<ContactId>,
}

impl AutomationDriver for SimulatedDriver {
    fn open_conversation(
        &mut self,
        contact: &ContactId,
        display_name: Option<&str>,
    ) -> Result<bool, DriverError> {
        info!(contact = %contact, name = ?display_name, "[simulate] conversation opened");
        self.open = Some(contact.clone());
        Ok(true)
    }

    fn deliver_text(&mut self, text: &str) -> Result<bool, DriverError> {
        match &self.open {
            Some(contact) => {
                info!(contact = %contact, chars = text.chars().count(), "[simulate] message delivered");
                Ok(true)
            }
            None => Err(DriverError::Action("no conversation is open".to_string())),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedDriverFactory;

impl DriverFactory for SimulatedDriverFactory {
    fn connect(&self) -> Result<Box<dyn AutomationDriver>, DriverError> {
        info!("Using simulated automation driver; no messages will leave this machine");
        Ok(Box::new(SimulatedDriver::default()))
    }
}

/// Delegates each action to an external automation program.
///
/// Invocations: `<program> <args..> setup`, `<program> <args..> open <id> [name]`,
/// `<program> <args..> deliver` with the message on stdin. Exit status 0 is success.
#[derive(Debug, Clone)]
pub struct CommandDriverFactory {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl DriverFactory for CommandDriverFactory {
    fn connect(&self) -> Result<Box<dyn AutomationDriver>, DriverError> {
        let driver = CommandDriver {
            program: self.program.clone(),
            args: self.args.clone(),
            timeout: self.timeout,
        };
        match driver.run(&["setup"], None) {
            Ok(status) if status.success() => {
                info!(program = %self.program, "Automation driver ready");
                Ok(Box::new(driver))
            }
            Ok(status) => Err(DriverError::Setup(format!(
                "{} setup exited with {}",
                self.program, status
            ))),
            Err(e) => Err(DriverError::Setup(e.to_string())),
        }
    }
}

pub struct CommandDriver {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandDriver {
    fn run(&self, action: &[&str], stdin_text: Option<&str>) -> Result<ExitStatus, DriverError> {
        let deadline = Instant::now() + self.timeout;
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .args(action)
            .stdin(if stdin_text.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()?;

        // Fed from its own thread so a program that never drains stdin cannot hold
        // the caller past the deadline.
        let written = match (stdin_text, child.stdin.take()) {
            (Some(text), Some(stdin)) => Some(spawn_stdin_writer(stdin, text.to_string())?),
            _ => None,
        };

        loop {
            if let Some(status) = child.try_wait()? {
                debug!(program = %self.program, action = ?action, %status, "Driver command finished");
                if let Some(Ok(Err(e))) = written.as_ref().map(Receiver::try_recv) {
                    // The program exited without reading its input; its status decides.
                    if e.kind() != std::io::ErrorKind::BrokenPipe {
                        return Err(e.into());
                    }
                }
                return Ok(status);
            }
            if Instant::now() >= deadline {
                if let Err(e) = child.kill() {
                    warn!(program = %self.program, error = %e, "Failed to kill timed out driver command");
                }
                let _ = child.wait();
                return Err(DriverError::Timeout(self.timeout));
            }
            std::thread::sleep(Duration::from_millis(50));
        }
    }
}

/// Write `text` to the child's stdin and close it. The writer is never joined: if a
/// descendant keeps the pipe open without reading, the thread ends when it does.
fn spawn_stdin_writer(
    mut stdin: ChildStdin,
    text: String,
) -> std::io::Result<Receiver<std::io::Result<()>>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("courier-driver-stdin".to_string())
        .spawn(move || {
            let _ = tx.send(stdin.write_all(text.as_bytes()));
        })?;
    Ok(rx)
}

impl AutomationDriver for CommandDriver {
    fn open_conversation(
        &mut self,
        contact: &ContactId,
        display_name: Option<&str>,
    ) -> Result<bool, DriverError> {
        let mut action = vec!["open", contact.as_str()];
        if let Some(name) = display_name {
            action.push(name);
        }
        Ok(self.run(&action, None)?.success())
    }

    fn deliver_text(&mut self, text: &str) -> Result<bool, DriverError> {
        Ok(self.run(&["deliver"], Some(text))?.success())
    }

    fn shutdown(&mut self) {
        if let Err(e) = self.run(&["shutdown"], None) {
            warn!(program = %self.program, error = %e, "Driver shutdown command failed");
        }
    }
}
