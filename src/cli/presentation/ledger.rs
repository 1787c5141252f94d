//! Ledger presentation.

use std::path::Path;

use crate::campaign::LedgerEntry;
use crate::cli::output::to_json;
use crate::cli::presentation::shared::{format_section_heading, table_with_header};
use crate::error::ApiError;

pub fn format_ledger_entries(
    path: &Path,
    entries: &[LedgerEntry],
    format: &str,
) -> Result<String, ApiError> {
    if format == "json" {
        return to_json(&serde_json::json!({
            "path": path,
            "entries": entries,
        }));
    }

    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Sent Ledger")));
    out.push_str(&format!("  File: {}\n", path.display()));
    out.push_str(&format!("  Entries: {}\n\n", entries.len()));
    if entries.is_empty() {
        out.push_str("No contacts recorded yet.\n");
        return Ok(out);
    }
    let mut table = table_with_header(vec!["Sent at", "Number", "Name", "Message"]);
    for entry in entries {
        table.add_row(vec![
            entry.timestamp.clone(),
            entry.contact_id.to_string(),
            entry.display_name.clone(),
            entry.preview.clone(),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    Ok(out)
}
