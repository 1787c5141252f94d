//! Interactive console: reads control commands from stdin while a campaign runs.

use std::io::BufRead;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::campaign::CampaignController;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Pause,
    Resume,
    Stop,
    Status,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "p" | "pause" => Some(ConsoleCommand::Pause),
            "r" | "resume" => Some(ConsoleCommand::Resume),
            "s" | "stop" | "q" | "quit" => Some(ConsoleCommand::Stop),
            "status" | "?" => Some(ConsoleCommand::Status),
            _ => None,
        }
    }

    /// Send the command to the controller and describe the resulting state.
    pub fn apply(self, controller: &CampaignController) -> String {
        let state = match self {
            ConsoleCommand::Pause => controller.pause(),
            ConsoleCommand::Resume => controller.resume(),
            ConsoleCommand::Stop => controller.stop(),
            ConsoleCommand::Status => controller.state(),
        };
        format!("Campaign is {}", state)
    }
}

/// Read stdin lines on a detached thread until the campaign ends or stdin closes.
pub fn spawn_console(controller: Arc<CampaignController>) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("courier-console".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if !controller.is_active() {
                    break;
                }
                match ConsoleCommand::parse(&line) {
                    Some(command) => eprintln!("{}", command.apply(&controller)),
                    None if line.trim().is_empty() => {}
                    None => eprintln!("Unknown command '{}'. {}", line.trim(), super::help::CONSOLE_HELP),
                }
            }
            debug!("Console reader finished");
        })
}
