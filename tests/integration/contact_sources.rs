//! Contact sources read from disk, and the message transformations.

use courier::campaign::CampaignState;
use courier::contact::{
    balance_messages, override_message, ColumnMapping, ContactSource, CsvContactSource,
    CsvLocation, ManualContactSource,
};
use courier::error::{CampaignError, SourceError};
use crate::integration::test_utils::{quick_config, Harness};
use std::fs;
use tempfile::TempDir;

fn write_sheet(dir: &TempDir, text: &str) -> std::path::PathBuf {
    let path = dir.path().join("contacts.csv");
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn csv_file_source_maps_columns_and_cleans_cells() {
    let dir = TempDir::new().unwrap();
    let path = write_sheet(
        &dir,
        "Name,Number,IntroMessage\n\
         Ana,15550100.0,\"Hi Ana, welcome\"\n\
         ,,orphan message\n\
         Bo,+1 555 0101,nan\n\
         \"Cy \"\"C\"\"\",1-555-0102,\"line one\nline two\"\n",
    );

    let source = CsvContactSource::new(CsvLocation::File(path));
    let contacts = source.load_contacts().unwrap();

    assert_eq!(contacts.len(), 3);
    assert_eq!(contacts[0].raw_id, "15550100");
    assert_eq!(contacts[0].display_name.as_deref(), Some("Ana"));
    assert_eq!(contacts[0].message, "Hi Ana, welcome");
    assert_eq!(contacts[1].message, "");
    assert!(!contacts[1].has_message());
    assert_eq!(contacts[2].display_name.as_deref(), Some("Cy \"C\""));
    assert_eq!(contacts[2].message, "line one\nline two");
    assert_eq!(contacts[2].contact_id().unwrap().as_str(), "15550102");
}

#[test]
fn custom_column_names_are_honored() {
    let dir = TempDir::new().unwrap();
    let path = write_sheet(&dir, "phone,text\n123,hello\n");
    let source = CsvContactSource::new(CsvLocation::File(path)).with_columns(ColumnMapping {
        number: "phone".to_string(),
        message: "text".to_string(),
        name: "who".to_string(),
    });

    let contacts = source.load_contacts().unwrap();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].message, "hello");
    assert_eq!(contacts[0].display_name, None);
}

#[test]
fn missing_number_column_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = write_sheet(&dir, "Phone,IntroMessage\n123,hello\n");
    let err = CsvContactSource::new(CsvLocation::File(path))
        .load_contacts()
        .unwrap_err();
    assert!(matches!(err, SourceError::MissingColumn(ref c) if c == "Number"));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = CsvContactSource::new(CsvLocation::File(dir.path().join("absent.csv")))
        .load_contacts()
        .unwrap_err();
    assert!(matches!(err, SourceError::Io { .. }));
}

#[test]
fn source_failure_leaves_controller_idle() {
    let dir = TempDir::new().unwrap();
    let harness = Harness::simple();
    let source = CsvContactSource::new(CsvLocation::File(dir.path().join("absent.csv")));

    let err = harness
        .controller
        .start_from_source(quick_config(), &source)
        .unwrap_err();

    assert!(matches!(err, CampaignError::Source(_)));
    assert_eq!(harness.controller.state(), CampaignState::Idle);
    assert!(harness.drivers.calls().is_empty());
}

#[test]
fn start_from_source_runs_the_loaded_contacts() {
    let harness = Harness::simple();
    let source = ManualContactSource::new(vec!["111", " ", "222"], "shared");

    harness
        .controller
        .start_from_source(quick_config(), &source)
        .unwrap();
    let report = harness.controller.wait().unwrap().unwrap();

    assert_eq!(report.as_campaign().unwrap().succeeded, 2);
    assert_eq!(harness.drivers.deliveries(), vec!["shared", "shared"]);
}

#[test]
fn override_then_balance() {
    let dir = TempDir::new().unwrap();
    let path = write_sheet(&dir, "Number,IntroMessage\n1,first\n2,second\n");
    let contacts = CsvContactSource::new(CsvLocation::File(path))
        .load_contacts()
        .unwrap();

    let balanced = balance_messages(contacts.clone());
    assert!(balanced.iter().all(|c| c.message == "first"));

    let overridden = override_message(contacts.clone(), "manual");
    assert!(overridden.iter().all(|c| c.message == "manual"));

    let untouched = override_message(contacts.clone(), "  ");
    assert_eq!(untouched, contacts);
}
