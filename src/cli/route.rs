//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::campaign::{
    read_entries, CampaignConfig, CampaignController, FileLedgerStore, RunReport,
};
use crate::cli::console::spawn_console;
use crate::cli::help::{command_name, CONSOLE_HELP};
use crate::cli::parse::{CampaignArgs, Commands, ConfigCommands, LedgerCommands, SourceArgs};
use crate::cli::presentation::{
    format_campaign_result, format_check_report, format_event_line, format_ledger_entries,
    format_send_prompt,
};
use crate::config::{default_ledger_path, ConfigLoader, CourierConfig};
use crate::contact::{
    balance_messages, override_message, ContactRecord, ContactSource, CsvContactSource,
    CsvLocation, ManualContactSource,
};
use crate::error::ApiError;
use crate::progress::{
    EventFileSink, FanoutReporter, ProgressBus, ProgressEnvelope, ProgressReporter, RunMode,
    TracingReporter,
};

const EVENT_POLL: Duration = Duration::from_millis(200);

/// Runtime context for CLI execution: workspace, loaded configuration, event file.
/// Built from workspace path and optional config path using ConfigLoader only.
pub struct RunContext {
    workspace_root: PathBuf,
    config: CourierConfig,
    events_file: Option<PathBuf>,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        events_file: Option<PathBuf>,
    ) -> Result<Self, ApiError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };

        config.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;

        Ok(Self {
            workspace_root,
            config,
            events_file,
        })
    }

    pub fn config(&self) -> &CourierConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let started = Instant::now();
        let name = command_name(command);
        info!(command = %name, workspace = %self.workspace_root.display(), "Executing command");
        let result = self.execute_inner(command);
        match &result {
            Ok(_) => info!(
                command = %name,
                duration_ms = started.elapsed().as_millis() as u64,
                "Command completed"
            ),
            Err(e) => warn!(command = %name, error = %e, "Command failed"),
        }
        result
    }

    fn execute_inner(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Send {
                source,
                campaign,
                yes,
                format,
            } => self.handle_send(source, campaign, *yes, format),
            Commands::Check {
                source,
                campaign,
                format,
            } => self.handle_check(source, campaign, format),
            Commands::Ledger { command } => self.handle_ledger_command(command),
            Commands::Config { command } => match command {
                ConfigCommands::Show => self
                    .config
                    .to_toml()
                    .map_err(|e| ApiError::Output(e.to_string())),
            },
        }
    }

    fn handle_send(
        &self,
        source: &SourceArgs,
        campaign: &CampaignArgs,
        yes: bool,
        format: &str,
    ) -> Result<String, ApiError> {
        let contacts = self.load_contacts(source)?;
        if contacts.is_empty() {
            return Ok("No contacts to process.".to_string());
        }
        let config = self.campaign_config(campaign);

        if !yes {
            use dialoguer::Confirm;
            let confirmed = Confirm::new()
                .with_prompt(format_send_prompt(contacts.len(), &config))
                .interact()
                .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))?;

            if !confirmed {
                return Ok("Campaign cancelled".to_string());
            }
        }

        match self.run(RunMode::Send, config, contacts)? {
            Some(RunReport::Campaign(result)) => format_campaign_result(&result, format),
            _ => Err(ApiError::Output("campaign produced no result".to_string())),
        }
    }

    fn handle_check(
        &self,
        source: &SourceArgs,
        campaign: &CampaignArgs,
        format: &str,
    ) -> Result<String, ApiError> {
        let contacts = self.load_contacts(source)?;
        if contacts.is_empty() {
            return Ok("No contacts to check.".to_string());
        }
        let config = self.campaign_config(campaign);
        match self.run(RunMode::Check, config, contacts)? {
            Some(RunReport::Check(report)) => format_check_report(&report, format),
            _ => Err(ApiError::Output("check produced no result".to_string())),
        }
    }

    fn handle_ledger_command(&self, command: &LedgerCommands) -> Result<String, ApiError> {
        let path = default_ledger_path(&self.config.ledger);
        match command {
            LedgerCommands::Path => Ok(path.display().to_string()),
            LedgerCommands::List { format } => {
                let store = FileLedgerStore::new(&path);
                let entries = read_entries(&store)?;
                format_ledger_entries(&path, &entries, format)
            }
        }
    }

    /// Start the worker, stream its events to stderr, and wait for the report.
    fn run(
        &self,
        mode: RunMode,
        config: CampaignConfig,
        contacts: Vec<ContactRecord>,
    ) -> Result<Option<RunReport>, ApiError> {
        let (bus, events) = ProgressBus::new_pair();
        let mut sink = FanoutReporter::new()
            .with(Arc::new(TracingReporter))
            .with(Arc::new(bus));
        if let Some(path) = &self.events_file {
            let file = EventFileSink::create(path)
                .map_err(|e| ApiError::Output(e.to_string()))?;
            sink.push(Arc::new(file));
        }

        let ledger_path = default_ledger_path(&self.config.ledger);
        info!(ledger = %ledger_path.display(), "Using sent ledger");
        let drivers = self.config.driver.build_factory()?;
        let sink: Arc<dyn ProgressReporter> = Arc::new(sink);
        let controller = Arc::new(CampaignController::new(
            Arc::from(drivers),
            Arc::new(FileLedgerStore::new(ledger_path)),
            sink,
        ));

        match mode {
            RunMode::Send => controller.start(config, contacts)?,
            RunMode::Check => controller.check_only(config, contacts)?,
        };

        if std::io::stdin().is_terminal() {
            eprintln!("{}", CONSOLE_HELP);
            if let Err(e) = spawn_console(Arc::clone(&controller)) {
                warn!(error = %e, "Interactive console unavailable");
            }
        }

        stream_events(&controller, &events);
        Ok(controller.wait()?)
    }

    fn campaign_config(&self, args: &CampaignArgs) -> CampaignConfig {
        let mut config = self.config.campaign.clone();
        if let Some(v) = args.batch_size {
            config.batch_size = v;
        }
        if let Some(v) = args.batch_delay {
            config.batch_delay_seconds = v;
        }
        if let Some(v) = args.delay_min {
            config.delay_min_seconds = v;
        }
        if let Some(v) = args.delay_max {
            config.delay_max_seconds = v;
        }
        if let Some(v) = args.max_retries {
            config.max_retries = v;
        }
        if let Some(v) = args.limit {
            config.contact_limit = v;
        }
        if args.no_duplicate_check {
            config.duplicate_check = false;
        }
        if args.no_delay {
            config.no_delay = true;
        }
        if args.fast {
            config.fast_mode = true;
        }
        config
    }

    /// Contacts from the command line, falling back to the configured source, with the
    /// message override and balancing applied.
    fn load_contacts(&self, args: &SourceArgs) -> Result<Vec<ContactRecord>, ApiError> {
        let mut columns = self.config.source.columns.clone();
        if let Some(c) = &args.number_column {
            columns.number = c.clone();
        }
        if let Some(c) = &args.message_column {
            columns.message = c.clone();
        }
        if let Some(c) = &args.name_column {
            columns.name = c.clone();
        }

        let source: Box<dyn ContactSource> = if !args.number.is_empty() {
            Box::new(ManualContactSource::new(
                args.number.iter().cloned(),
                args.message.clone().unwrap_or_default(),
            ))
        } else if let Some(path) = &args.csv {
            Box::new(CsvContactSource::new(CsvLocation::File(path.clone())).with_columns(columns))
        } else if let Some(url) = &args.url {
            Box::new(CsvContactSource::new(CsvLocation::Url(url.clone())).with_columns(columns))
        } else {
            let mut source_config = self.config.source.clone();
            source_config.columns = columns;
            source_config.csv_source().ok_or(crate::error::SourceError::NotConfigured)?
        };

        let mut contacts = source.load_contacts()?;
        info!(source = %source.describe(), contacts = contacts.len(), "Loaded contacts");

        if args.number.is_empty() {
            if let Some(message) = &args.message {
                contacts = override_message(contacts, message);
            }
        }
        if args.balance_messages || self.config.source.balance_messages {
            contacts = balance_messages(contacts);
        }
        Ok(contacts)
    }
}

/// Print live event lines until the run's terminal event arrives.
fn stream_events(controller: &CampaignController, events: &Receiver<ProgressEnvelope>) {
    loop {
        match events.recv_timeout(EVENT_POLL) {
            Ok(envelope) => {
                if let Some(line) = format_event_line(&envelope.event) {
                    eprintln!("{}", line);
                }
                if envelope.event.is_terminal() {
                    return;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !controller.is_active() {
                    // Worker is done; print whatever it queued and stop.
                    for envelope in events.try_iter() {
                        if let Some(line) = format_event_line(&envelope.event) {
                            eprintln!("{}", line);
                        }
                    }
                    return;
                }
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}
