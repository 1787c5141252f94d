//! CLI domain: parse, route, help, output, console, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod console;
mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use console::{spawn_console, ConsoleCommand};
pub use help::{command_name, CONSOLE_HELP};
pub use output::map_error;
pub use parse::{CampaignArgs, Cli, Commands, ConfigCommands, LedgerCommands, SourceArgs};
pub use presentation::{
    format_campaign_result, format_campaign_result_text, format_check_report,
    format_check_report_text, format_event_line, format_ledger_entries, format_send_prompt,
};
pub use route::RunContext;
