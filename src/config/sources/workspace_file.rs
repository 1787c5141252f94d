//! Workspace config files: `<workspace>/config/config.toml`, then the file named by
//! `COURIER_ENV` (default `development`).

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};
use tracing::debug;

const ENV_VAR: &str = "COURIER_ENV";
const DEFAULT_ENV: &str = "development";

/// Workspace files in the order they are layered; later entries win.
pub fn candidate_paths(workspace_root: &Path) -> Vec<PathBuf> {
    let env_name = std::env::var(ENV_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENV.to_string());
    let dir = workspace_root.join("config");
    vec![dir.join("config.toml"), dir.join(format!("{}.toml", env_name))]
}

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(candidate_paths(workspace_root)
        .into_iter()
        .filter(|path| {
            let present = path.is_file();
            if !present {
                debug!(config_path = %path.display(), "Workspace config file not present");
            }
            present
        })
        .fold(builder, |builder, path| {
            builder.add_source(File::from(path).required(false))
        }))
}
