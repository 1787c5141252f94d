//! Property tests for counting, limit and retry bounds.

use crate::integration::test_utils::{quick_config, Harness, MemoryLedger, ScriptedDriverFactory};
use courier::campaign::{
    CampaignConfig, ControlSignals, DelayPolicy, RetryExecutor, RetryPolicy,
};
use courier::contact::ContactRecord;
use courier::error::DriverError;
use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

/// (raw id, message, open fails)
fn contacts_strategy() -> impl Strategy<Value = Vec<(String, bool, bool)>> {
    prop::collection::vec(
        (
            prop_oneof![
                4 => "[0-9]{3,6}",
                1 => Just("bad-id".to_string()),
            ],
            any::<bool>(),
            prop::bool::weighted(0.2),
        ),
        0..12,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn counters_respect_list_and_limit(
        rows in contacts_strategy(),
        batch_size in 1usize..5,
        limit in 1u64..15,
    ) {
        let mut drivers = ScriptedDriverFactory::new();
        let mut contacts = Vec::new();
        for (raw, has_message, open_fails) in &rows {
            if *open_fails {
                if courier::contact::ContactId::parse(raw).is_some() {
                    drivers = drivers.failing_open(raw);
                }
            }
            let message = if *has_message { "hello" } else { "" };
            contacts.push(ContactRecord::new(raw.clone(), message));
        }
        let harness = Harness::new(drivers, MemoryLedger::default());
        let config = CampaignConfig {
            batch_size,
            contact_limit: limit,
            max_retries: 0,
            ..quick_config()
        };

        harness.controller.start(config, contacts.clone()).unwrap();
        let report = harness.controller.wait().unwrap().unwrap();
        let result = report.as_campaign().unwrap();

        prop_assert!(result.processed as usize <= contacts.len());
        prop_assert!(result.processed <= limit);
        prop_assert!(result.accounted() <= contacts.len());
        if !result.limit_reached {
            prop_assert_eq!(result.accounted(), contacts.len());
        }

        // A delivered id is recorded once and never delivered again in the run.
        let recorded: Vec<String> = harness
            .ledger
            .lines()
            .iter()
            .filter_map(|line| line.split('|').nth(1).map(str::to_string))
            .collect();
        let distinct: HashSet<&String> = recorded.iter().collect();
        prop_assert_eq!(distinct.len(), recorded.len());
        prop_assert_eq!(recorded.len(), harness.drivers.deliveries().len());
    }

    #[test]
    fn retry_never_exceeds_its_bound(max_retries in 0u32..6, failures in 0u32..10) {
        let delays = DelayPolicy::new((0, 0), 0, true, true);
        let signals = ControlSignals::new();
        let executor = RetryExecutor::new(&delays, &signals);
        let mut calls = 0u32;

        let outcome = executor.execute(
            "prop",
            RetryPolicy::new(max_retries, Duration::from_millis(3000)),
            |_| {
                calls += 1;
                if calls <= failures {
                    Err(DriverError::Action("flaky".to_string()))
                } else {
                    Ok(true)
                }
            },
        );

        prop_assert!(calls <= max_retries + 1);
        prop_assert_eq!(outcome.attempts, calls);
        prop_assert_eq!(outcome.succeeded, failures <= max_retries);
    }
}
