//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
///
/// Only scalar defaults that other layers commonly override are seeded here; everything
/// else falls back to serde defaults on the typed structs.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("campaign.batch_size", 5)?
        .set_default("campaign.batch_delay_seconds", 30)?
        .set_default("campaign.delay_min_seconds", 2)?
        .set_default("campaign.delay_max_seconds", 5)?
        .set_default("ledger.rotation", "daily")?
        .set_default("driver.kind", "simulate")
}
