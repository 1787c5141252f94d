//! Entry point for loading configuration.

use crate::config::merge::merge_policy;
use crate::config::sources::{global_file, workspace_file};
use crate::config::CourierConfig;
use config::{ConfigError, Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`CourierConfig`] from layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global file, `config/config.toml`,
    /// `config/<COURIER_ENV>.toml`, `COURIER__SECTION__KEY` environment variables.
    pub fn load(workspace_root: &Path) -> Result<CourierConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = builder.add_source(Self::environment());

        let config: CourierConfig = builder.build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load configuration from a single explicit file. Environment overrides still apply.
    pub fn load_from_file(path: &Path) -> Result<CourierConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let builder = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true))
            .add_source(Self::environment());
        let config: CourierConfig = builder.build()?.try_deserialize()?;
        debug!(file = %path.display(), "Configuration loaded from file");
        Ok(config)
    }

    /// Path of the global configuration file, if one can be determined.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    fn environment() -> Environment {
        Environment::with_prefix("COURIER")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
    }
}
