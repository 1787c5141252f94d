//! CLI parse: clap types for Courier. No behavior; definitions only.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Courier CLI - batched, resumable message campaigns
#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(about = "Send personalized messages in batches with pause/resume/stop and duplicate suppression")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Append campaign progress events to this file as JSON lines
    #[arg(long)]
    pub events_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a campaign: open each conversation and deliver its message
    Send {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        campaign: CampaignArgs,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Open each conversation and report whether it was already messaged; sends nothing
    Check {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        campaign: CampaignArgs,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Inspect the sent ledger
    Ledger {
        #[command(subcommand)]
        command: LedgerCommands,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Where contacts come from. Falls back to the `[source]` config section.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Local CSV file with a header row
    #[arg(long, conflicts_with_all = ["url", "number"])]
    pub csv: Option<PathBuf>,

    /// URL of a published sheet in CSV form
    #[arg(long, conflicts_with = "number")]
    pub url: Option<String>,

    /// Contact number; repeat for several (manual mode)
    #[arg(long = "number", num_args = 1..)]
    pub number: Vec<String>,

    /// Message for every contact; replaces sheet messages
    #[arg(long)]
    pub message: Option<String>,

    /// Give every contact the first row's message
    #[arg(long)]
    pub balance_messages: bool,

    /// Header of the number column
    #[arg(long)]
    pub number_column: Option<String>,

    /// Header of the message column
    #[arg(long)]
    pub message_column: Option<String>,

    /// Header of the display-name column
    #[arg(long)]
    pub name_column: Option<String>,
}

/// Per-run overrides of the `[campaign]` config section.
#[derive(Args, Debug, Clone, Default)]
pub struct CampaignArgs {
    /// Contacts per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Seconds to wait between batches
    #[arg(long)]
    pub batch_delay: Option<u64>,

    /// Minimum seconds between contacts
    #[arg(long)]
    pub delay_min: Option<u64>,

    /// Maximum seconds between contacts
    #[arg(long)]
    pub delay_max: Option<u64>,

    /// Retries per failed action
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Stop after this many contacts
    #[arg(long)]
    pub limit: Option<u64>,

    /// Send even to contacts already in the sent ledger
    #[arg(long)]
    pub no_duplicate_check: bool,

    /// Remove pacing delays (implies --fast)
    #[arg(long)]
    pub no_delay: bool,

    /// Shorten stabilization waits
    #[arg(long)]
    pub fast: bool,
}

#[derive(Subcommand, Debug)]
pub enum LedgerCommands {
    /// List entries in today's ledger
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the resolved ledger path
    Path,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
}
