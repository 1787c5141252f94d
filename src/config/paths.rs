//! Platform directories for configuration, ledgers and logs.

use chrono::Local;
use directories::BaseDirs;
use std::path::PathBuf;

use crate::campaign::LedgerConfig;

const APP_DIR: &str = "courier";

/// `courier/config.toml` under the platform config dir (`$XDG_CONFIG_HOME` or
/// `~/.config` on Linux).
pub fn global_config_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.config_dir().join(APP_DIR).join("config.toml"))
}

/// Where sent ledgers live by default.
pub fn courier_data_dir() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.data_dir().join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(".courier"))
}

/// Where per-run log files live by default.
pub fn courier_state_dir() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| {
            dirs.state_dir()
                .unwrap_or_else(|| dirs.data_local_dir())
                .join(APP_DIR)
        })
        .unwrap_or_else(|| PathBuf::from(".").join(".courier"))
}

/// Today's ledger file under `config`.
pub fn default_ledger_path(config: &LedgerConfig) -> PathBuf {
    config.resolve_path(Local::now().date_naive(), &courier_data_dir())
}
