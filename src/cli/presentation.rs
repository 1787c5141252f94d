//! CLI presentation: text and json formatters per command family.

mod campaign;
mod ledger;
mod shared;

pub use campaign::{
    format_campaign_result, format_campaign_result_text, format_check_report,
    format_check_report_text, format_event_line, format_send_prompt,
};
pub use ledger::format_ledger_entries;
pub use shared::format_section_heading;
