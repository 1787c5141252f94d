//! Pause, resume and stop against a live worker.

use crate::integration::test_utils::{contact, quick_config, Harness, MemoryLedger, ScriptedDriverFactory};
use courier::campaign::{CampaignConfig, CampaignState, RunReport};
use courier::contact::ContactRecord;
use courier::error::CampaignError;
use courier::progress::CampaignEvent;
use std::thread;
use std::time::{Duration, Instant};

fn four() -> Vec<ContactRecord> {
    vec![
        contact("101", "m"),
        contact("102", "m"),
        contact("103", "m"),
        contact("104", "m"),
    ]
}

/// Harness whose first contact blocks inside `open_conversation` until released.
fn gated() -> (Harness, crate::integration::test_utils::GateHandle) {
    let drivers = ScriptedDriverFactory::new();
    let gate = drivers.gate_open("101");
    (Harness::new(drivers, MemoryLedger::default()), gate)
}

#[test]
fn pause_holds_the_worker_between_contacts() {
    let (harness, gate) = gated();
    harness.controller.start(quick_config(), four()).unwrap();
    gate.wait_entered();

    assert_eq!(harness.controller.pause(), CampaignState::Paused);
    assert_eq!(harness.controller.pause(), CampaignState::Paused);
    gate.release();

    thread::sleep(Duration::from_millis(200));
    assert_eq!(harness.drivers.opens(), vec!["101"]);
    assert_eq!(harness.controller.state(), CampaignState::Paused);

    assert_eq!(harness.controller.resume(), CampaignState::Running);
    assert_eq!(harness.controller.resume(), CampaignState::Running);
    let report = harness.controller.wait().unwrap().unwrap();
    let result = report.as_campaign().unwrap();
    assert_eq!(result.succeeded, 4);
    assert_eq!(result.state, CampaignState::Finished);
}

#[test]
fn stop_ends_the_run_at_the_next_boundary() {
    let (harness, gate) = gated();
    harness.controller.start(quick_config(), four()).unwrap();
    gate.wait_entered();

    assert_eq!(harness.controller.stop(), CampaignState::StopRequested);
    gate.release();

    let report = harness.controller.wait().unwrap().unwrap();
    let result = report.as_campaign().unwrap();
    assert!(result.stopped);
    assert_eq!(result.processed, 1);
    assert_eq!(result.state, CampaignState::Finished);
    assert_eq!(harness.drivers.opens(), vec!["101"]);
    assert_eq!(harness.controller.state(), CampaignState::Finished);
}

#[test]
fn stop_releases_a_paused_worker() {
    let (harness, gate) = gated();
    harness.controller.start(quick_config(), four()).unwrap();
    gate.wait_entered();
    harness.controller.pause();
    gate.release();
    thread::sleep(Duration::from_millis(100));

    assert_eq!(harness.controller.stop(), CampaignState::StopRequested);
    let report = harness.controller.wait().unwrap().unwrap();
    assert_eq!(report.state(), CampaignState::Finished);
    assert_eq!(harness.drivers.opens().len(), 1);
}

#[test]
fn stop_cuts_the_batch_pause_short() {
    let harness = Harness::simple();
    let config = CampaignConfig {
        batch_size: 1,
        batch_delay_seconds: 30,
        no_delay: false,
        fast_mode: false,
        delay_min_seconds: 0,
        delay_max_seconds: 0,
        ..quick_config()
    };
    // No message body, so the only settle is the one after opening.
    let contacts = vec![contact("101", ""), contact("102", "")];
    harness.controller.start(config, contacts).unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while !harness
        .reporter
        .events()
        .iter()
        .any(|e| matches!(e, CampaignEvent::BatchCountdown(_)))
    {
        assert!(Instant::now() < deadline, "countdown never started");
        thread::sleep(Duration::from_millis(20));
    }

    let stopped_at = Instant::now();
    harness.controller.stop();
    let report = harness.controller.wait().unwrap().unwrap();
    assert!(stopped_at.elapsed() < Duration::from_secs(5));

    let result = report.as_campaign().unwrap();
    assert!(result.stopped);
    assert_eq!(result.processed, 1);
    assert_eq!(harness.drivers.opens(), vec!["101"]);
    let countdowns = harness
        .reporter
        .events()
        .iter()
        .filter(|e| matches!(e, CampaignEvent::BatchCountdown(_)))
        .count();
    assert!(countdowns < 30);
}

#[test]
fn start_is_rejected_while_a_run_is_active() {
    let (harness, gate) = gated();
    let first = harness.controller.start(quick_config(), four()).unwrap();
    gate.wait_entered();

    let err = harness
        .controller
        .start(quick_config(), vec![contact("999", "m")])
        .unwrap_err();
    assert!(matches!(err, CampaignError::AlreadyActive(CampaignState::Running)));

    harness.controller.pause();
    let err = harness
        .controller
        .check_only(quick_config(), vec![contact("999", "m")])
        .unwrap_err();
    assert!(matches!(err, CampaignError::AlreadyActive(CampaignState::Paused)));

    harness.controller.resume();
    gate.release();
    harness.controller.wait().unwrap();
    assert_eq!(harness.controller.campaign_id(), Some(first));
    assert_eq!(harness.drivers.opens_of("999"), 0);
}

#[test]
fn restart_after_finish_uses_fresh_counters() {
    let harness = Harness::simple();
    harness
        .controller
        .start(quick_config(), vec![contact("201", "m"), contact("202", "m")])
        .unwrap();
    harness.controller.wait().unwrap();

    let second = harness
        .controller
        .start(quick_config(), vec![contact("203", "m")])
        .unwrap();
    let report = harness.controller.wait().unwrap().unwrap();
    let RunReport::Campaign(result) = report else {
        panic!("expected a campaign report");
    };
    assert_eq!(result.campaign_id, second);
    assert_eq!(result.succeeded, 1);
    assert_eq!(result.processed, 1);
    assert_eq!(result.total_contacts, 1);
}

#[test]
fn restart_after_setup_failure_is_allowed() {
    let drivers = ScriptedDriverFactory::new().failing_connect();
    let harness = Harness::new(drivers, MemoryLedger::default());
    harness.controller.start(quick_config(), four()).unwrap();
    harness.controller.wait().unwrap();
    assert_eq!(harness.controller.state(), CampaignState::Failed);

    assert!(harness.controller.start(quick_config(), four()).is_ok());
    harness.controller.wait().unwrap();
    assert_eq!(harness.controller.state(), CampaignState::Failed);
}

#[test]
fn controls_after_finish_do_not_change_state() {
    let harness = Harness::simple();
    harness
        .controller
        .start(quick_config(), vec![contact("301", "m")])
        .unwrap();
    harness.controller.wait().unwrap();

    assert_eq!(harness.controller.pause(), CampaignState::Finished);
    assert_eq!(harness.controller.resume(), CampaignState::Finished);
    assert_eq!(harness.controller.stop(), CampaignState::Finished);
}
