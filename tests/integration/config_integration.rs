//! Integration tests for the configuration system

use crate::integration::test_utils::with_xdg_env;
use courier::campaign::LedgerRotation;
use courier::config::{default_ledger_path, global_config_path, ConfigLoader};
use courier::driver::DriverKind;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_explicit_file_overrides_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("courier.toml");
    fs::write(
        &config_file,
        r#"
[campaign]
batch_size = 10
delay_min_seconds = 1
delay_max_seconds = 3
duplicate_check = false

[ledger]
directory = "/var/lib/courier"
rotation = "none"

[source]
csv_path = "contacts.csv"

[source.columns]
number = "Phone"

[driver]
kind = "command"
program = "wa-agent"
args = ["--profile", "work"]
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert!(config.validate().is_ok());

    assert_eq!(config.campaign.batch_size, 10);
    assert_eq!(config.campaign.batch_delay_seconds, 30);
    assert!(!config.campaign.duplicate_check);
    assert_eq!(config.ledger.rotation, LedgerRotation::None);
    assert_eq!(config.source.columns.number, "Phone");
    assert_eq!(config.source.columns.message, "IntroMessage");
    assert_eq!(config.driver.kind, DriverKind::Command);
    assert_eq!(config.driver.args, vec!["--profile", "work"]);
    assert_eq!(
        default_ledger_path(&config.ledger),
        std::path::PathBuf::from("/var/lib/courier/sent_messages.log")
    );
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    assert!(ConfigLoader::load_from_file(&temp_dir.path().join("nope.toml")).is_err());
}

#[test]
fn test_invalid_delay_range_fails_validation() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("courier.toml");
    fs::write(
        &config_file,
        "[campaign]\ndelay_min_seconds = 9\ndelay_max_seconds = 2\n",
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().starts_with("Campaign:"));
}

#[test]
fn test_command_driver_requires_program() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("courier.toml");
    fs::write(&config_file, "[driver]\nkind = \"command\"\n").unwrap();

    let config = ConfigLoader::load_from_file(&config_file).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_workspace_file_layers_over_global() {
    let temp_dir = TempDir::new().unwrap();
    with_xdg_env(&temp_dir, || {
        let global_dir = temp_dir.path().join("config").join("courier");
        fs::create_dir_all(&global_dir).unwrap();
        fs::write(
            global_dir.join("config.toml"),
            "[campaign]\nbatch_size = 7\nmax_retries = 4\n",
        )
        .unwrap();

        let workspace = temp_dir.path().join("ws");
        fs::create_dir_all(workspace.join("config")).unwrap();
        fs::write(
            workspace.join("config").join("config.toml"),
            "[campaign]\nbatch_size = 3\n",
        )
        .unwrap();

        let config = ConfigLoader::load(&workspace).unwrap();
        assert_eq!(config.campaign.batch_size, 3);
        assert_eq!(config.campaign.max_retries, 4);
    });
}

#[test]
fn test_default_ledger_lives_in_data_dir() {
    let temp_dir = TempDir::new().unwrap();
    with_xdg_env(&temp_dir, || {
        let workspace = temp_dir.path().join("empty-ws");
        fs::create_dir_all(&workspace).unwrap();
        let config = ConfigLoader::load(&workspace).unwrap();
        let path = default_ledger_path(&config.ledger);
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("sent_messages_"));
        assert!(name.ends_with(".log"));
        assert!(path.starts_with(temp_dir.path().join("data")));
    });
}

#[cfg(target_os = "linux")]
#[test]
fn test_global_config_path_follows_xdg_config_home() {
    let temp_dir = TempDir::new().unwrap();
    with_xdg_env(&temp_dir, || {
        assert_eq!(
            global_config_path(),
            Some(temp_dir.path().join("config").join("courier").join("config.toml"))
        );
    });
}
