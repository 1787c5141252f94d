//! CLI help and command-name contract for logging and routing.

use crate::cli::parse::{Commands, ConfigCommands, LedgerCommands};

/// Command name string for logs (e.g. "send", "ledger.list").
pub fn command_name(command: &Commands) -> String {
    match command {
        Commands::Send { .. } => "send".to_string(),
        Commands::Check { .. } => "check".to_string(),
        Commands::Ledger { command } => format!("ledger.{}", ledger_command_name(command)),
        Commands::Config { command } => format!("config.{}", config_command_name(command)),
    }
}

pub fn ledger_command_name(command: &LedgerCommands) -> &'static str {
    match command {
        LedgerCommands::List { .. } => "list",
        LedgerCommands::Path => "path",
    }
}

pub fn config_command_name(command: &ConfigCommands) -> &'static str {
    match command {
        ConfigCommands::Show => "show",
    }
}

/// Help text printed when the interactive console starts.
pub const CONSOLE_HELP: &str =
    "Type 'pause', 'resume', 'stop' or 'status' and press Enter to control the campaign.";
