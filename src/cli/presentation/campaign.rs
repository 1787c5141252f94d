//! Campaign presentation: live event lines, confirmation prompt, run summaries.

use owo_colors::OwoColorize;

use crate::campaign::{CampaignConfig, CampaignResult, CheckReport, CheckStatus, ContactOutcome};
use crate::cli::output::to_json;
use crate::cli::presentation::shared::{format_section_heading, table_with_header};
use crate::error::ApiError;
use crate::progress::{CampaignEvent, RunMode};

/// One human-readable line per progress event; `None` for events not worth a line.
pub fn format_event_line(event: &CampaignEvent) -> Option<String> {
    let line = match event {
        CampaignEvent::Started(d) => {
            let banner = if d.duplicate_check {
                format!(
                    "Duplicate prevention: ON ({} numbers already messaged)",
                    d.previously_sent
                )
            } else {
                "Duplicate prevention: OFF".to_string()
            };
            let verb = match d.mode {
                RunMode::Send => "Sending to",
                RunMode::Check => "Checking",
            };
            format!(
                "{} {} contacts in {} batch(es)\n{}",
                verb.bold(),
                d.total_contacts,
                d.total_batches,
                banner
            )
        }
        CampaignEvent::StateChanged(d) => format!("State: {} -> {}", d.from, d.to),
        CampaignEvent::BatchBoundary(d) => format!(
            "{} (processed so far: {})",
            format!("Batch {}/{}", d.batch, d.total_batches).cyan(),
            d.processed
        ),
        CampaignEvent::BatchCountdown(d) => {
            format!("Next batch in {}s", d.remaining_seconds)
        }
        CampaignEvent::BatchCompleted(d) => format!(
            "Batch {} complete: processed {}, sent {}, skipped {}, failed {}",
            d.batch, d.processed, d.succeeded, d.skipped_duplicates, d.failed
        ),
        CampaignEvent::ContactOutcome(d) => {
            let who = match &d.display_name {
                Some(name) => format!("{} ({})", d.contact_id, name),
                None => d.contact_id.clone(),
            };
            let status = match &d.outcome {
                ContactOutcome::Sent { attempts } if *attempts > 1 => {
                    format!("{}", format!("sent after {} attempts", attempts).green())
                }
                ContactOutcome::Sent { .. } => format!("{}", "sent".green()),
                ContactOutcome::Opened => format!("{}", "opened (no message)".green()),
                ContactOutcome::SkippedDuplicate => {
                    format!("{}", "skipped, already messaged".yellow())
                }
                ContactOutcome::Failed { reason } => format!("{}", reason.red()),
            };
            format!("[{}] {}: {}", d.index + 1, who, status)
        }
        CampaignEvent::LedgerWriteFailed(d) => format!(
            "{} {}: {}",
            "Ledger not updated for".red(),
            d.id,
            d.error
        ),
        CampaignEvent::CheckResult(entry) => {
            let status = match entry.status {
                CheckStatus::AlreadySent => format!("{}", entry.status.as_str().yellow()),
                CheckStatus::NotSent => format!("{}", entry.status.as_str().green()),
                CheckStatus::Unreachable | CheckStatus::InvalidIdentifier => {
                    format!("{}", entry.status.as_str().red())
                }
            };
            format!("{}: {}", entry.id, status)
        }
        CampaignEvent::Summary(_) | CampaignEvent::CheckSummary(_) => return None,
    };
    Some(line)
}

/// Confirmation prompt shown before a send run.
pub fn format_send_prompt(contacts: usize, config: &CampaignConfig) -> String {
    let pacing = if config.no_delay {
        "no delay".to_string()
    } else {
        format!(
            "{}-{}s between contacts",
            config.delay_min_seconds, config.delay_max_seconds
        )
    };
    format!(
        "Send to {} contact(s) in batches of {} ({}, {}s between batches)?",
        contacts, config.batch_size, pacing, config.batch_delay_seconds
    )
}

pub fn format_campaign_result_text(result: &CampaignResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Campaign Summary")));
    out.push_str(&format!("  Campaign: {}\n", result.campaign_id));
    let mut state = result.state.to_string();
    if result.stopped {
        state.push_str(" (stopped)");
    }
    if result.limit_reached {
        state.push_str(" (contact limit reached)");
    }
    out.push_str(&format!("  State: {}\n", state));
    if let Some(error) = &result.error {
        out.push_str(&format!("  Error: {}\n", error.red()));
    }
    out.push('\n');

    let mut table = table_with_header(vec!["Metric", "Count"]);
    table.add_row(vec!["Total contacts".to_string(), result.total_contacts.to_string()]);
    table.add_row(vec!["Processed".to_string(), result.processed.to_string()]);
    table.add_row(vec!["Succeeded".to_string(), result.succeeded.to_string()]);
    table.add_row(vec![
        "Skipped (already messaged)".to_string(),
        result.skipped_duplicates.to_string(),
    ]);
    table.add_row(vec!["Failed".to_string(), result.failed.len().to_string()]);
    if !result.ledger_failures.is_empty() {
        table.add_row(vec![
            "Ledger write failures".to_string(),
            result.ledger_failures.len().to_string(),
        ]);
    }
    out.push_str(&format!("{}\n", table));

    if !result.failed.is_empty() {
        out.push_str(&format!("\n{}\n\n", format_section_heading("Failed contacts")));
        let mut table = table_with_header(vec!["Number", "Reason"]);
        for failed in &result.failed {
            table.add_row(vec![failed.id.clone(), failed.reason.to_string()]);
        }
        out.push_str(&format!("{}\n", table));
    }

    if !result.ledger_failures.is_empty() {
        out.push_str(&format!(
            "\n{}\n\n",
            format_section_heading("Sent but not recorded (may be messaged again)")
        ));
        let mut table = table_with_header(vec!["Number", "Error"]);
        for failure in &result.ledger_failures {
            table.add_row(vec![failure.id.clone(), failure.error.clone()]);
        }
        out.push_str(&format!("{}\n", table));
    }
    out
}

pub fn format_check_report_text(report: &CheckReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Check Summary")));
    out.push_str(&format!("  Campaign: {}\n", report.campaign_id));
    let mut state = report.state.to_string();
    if report.stopped {
        state.push_str(" (stopped)");
    }
    out.push_str(&format!("  State: {}\n", state));
    if let Some(error) = &report.error {
        out.push_str(&format!("  Error: {}\n", error.red()));
    }
    out.push('\n');

    if report.entries.is_empty() {
        out.push_str("No contacts checked.\n");
        return out;
    }
    let mut table = table_with_header(vec!["Number", "Name", "Status"]);
    for entry in &report.entries {
        table.add_row(vec![
            entry.id.clone(),
            entry.display_name.clone().unwrap_or_else(|| "-".to_string()),
            entry.status.as_str().to_string(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out.push_str(&format!(
        "\n  Already sent: {}  Not sent: {}  Unreachable: {}  Invalid: {}\n",
        report.count(CheckStatus::AlreadySent),
        report.count(CheckStatus::NotSent),
        report.count(CheckStatus::Unreachable),
        report.count(CheckStatus::InvalidIdentifier),
    ));
    out
}

pub fn format_campaign_result(result: &CampaignResult, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        to_json(result)
    } else {
        Ok(format_campaign_result_text(result))
    }
}

pub fn format_check_report(report: &CheckReport, format: &str) -> Result<String, ApiError> {
    if format == "json" {
        to_json(report)
    } else {
        Ok(format_check_report_text(report))
    }
}
