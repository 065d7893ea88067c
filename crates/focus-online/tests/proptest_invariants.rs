// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use focus_core::{FocusError, TriggerAlgorithm};
use focus_online::{ConstantConfig, ConstantFocus, DesConfig, DesFocus, Focus, FocusConfig};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

const MIN_PROPTEST_CASES: u32 = 256;

fn proptest_cases() -> u32 {
    std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .map(|parsed| parsed.max(MIN_PROPTEST_CASES))
        .unwrap_or(MIN_PROPTEST_CASES)
}

fn runner_config() -> ProptestConfig {
    ProptestConfig {
        cases: proptest_cases(),
        failure_persistence: Some(Box::new(FileFailurePersistence::Off)),
        ..ProptestConfig::default()
    }
}

/// Background rates that are exactly representable and whose running sums
/// stay exact, so the streaming and reference computations see identical
/// floats.
fn exact_backgrounds() -> impl Strategy<Value = f64> {
    prop::sample::select(vec![0.5, 1.0, 2.0, 2.5, 4.0, 8.0])
}

fn counts() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..=20, 1..200)
}

/// Trigger step of the O(n^2) exhaustive search, or `None`.
fn exhaustive_stop(xs: &[u64], background: f64, threshold_llr: f64) -> Option<usize> {
    let mut prefix = vec![0u64];
    for (t, &x) in xs.iter().enumerate() {
        prefix.push(prefix[t] + x);
        for h in 1..=t + 1 {
            let a = (prefix[t + 1] - prefix[t + 1 - h]) as f64;
            let b = background * h as f64;
            if a > b && a * (a / b).ln() - (a - b) >= threshold_llr {
                return Some(t + 1);
            }
        }
    }
    None
}

proptest! {
    #![proptest_config(runner_config())]

    #[test]
    fn update_never_fails_on_positive_background(
        xs in counts(),
        background in exact_backgrounds(),
    ) {
        let mut focus = Focus::new(FocusConfig { threshold_std: 5.0, mu_min: 1.0 })
            .expect("valid config");
        for &x in &xs {
            focus.update(x, background).expect("positive background must be accepted");
        }
    }

    #[test]
    fn update_always_rejects_non_positive_background(
        x in 0u64..=50,
        background in -10.0_f64..=0.0,
    ) {
        let mut focus = Focus::new(FocusConfig { threshold_std: 5.0, mu_min: 1.0 })
            .expect("valid config");
        let err = focus.update(x, background)
            .expect_err("non-positive background must fail");
        prop_assert!(matches!(err, FocusError::InvalidBackground(_)));
    }

    #[test]
    fn global_max_is_zero_until_the_threshold_is_crossed(
        xs in counts(),
        background in exact_backgrounds(),
    ) {
        let threshold_std = 5.0;
        let mut focus = Focus::new(FocusConfig { threshold_std, mu_min: 1.0 })
            .expect("valid config");
        for &x in &xs {
            let step = focus.update(x, background).expect("update should succeed");
            if step.is_triggered() {
                prop_assert!(step.global_max >= threshold_std * threshold_std / 2.0);
                break;
            }
            prop_assert_eq!(step.global_max, 0.0);
            prop_assert_eq!(step.time_offset, 0);
        }
    }

    #[test]
    fn streaming_detector_stops_exactly_where_the_oracle_stops(
        xs in counts(),
        background in exact_backgrounds(),
    ) {
        let threshold_std = 4.0;
        let mut algo = ConstantFocus::new(ConstantConfig {
            background,
            threshold_std,
            mu_min: 1.0,
            skip: 0,
        }).expect("valid config");
        let outcome = algo.run(&xs).expect("run should succeed");

        let oracle = exhaustive_stop(&xs, background, threshold_std * threshold_std / 2.0);
        match oracle {
            Some(stop) => {
                prop_assert!(outcome.is_detection());
                prop_assert_eq!(outcome.stop, stop);
                prop_assert!(outcome.significance >= threshold_std);
            }
            None => prop_assert!(!outcome.is_detection()),
        }
    }

    #[test]
    fn stack_never_outgrows_the_number_of_observations(
        xs in counts(),
        background in exact_backgrounds(),
    ) {
        let mut focus = Focus::new(FocusConfig { threshold_std: 50.0, mu_min: 1.0 })
            .expect("valid config");
        for (t, &x) in xs.iter().enumerate() {
            focus.update(x, background).expect("update should succeed");
            // Anchor + at most one curve per observation seen so far.
            prop_assert!(focus.stack_len() >= 2);
            prop_assert!(focus.stack_len() <= t + 3);
        }
    }

    #[test]
    fn des_warmup_is_always_quiet(
        xs in prop::collection::vec(0u64..=400, 1..64),
    ) {
        let sleep = 64;
        let mut algo = DesFocus::new(DesConfig {
            sleep: Some(sleep),
            ..DesConfig::default()
        }).expect("valid config");
        for &x in &xs {
            let step = algo.step(x).expect("warm-up step should succeed");
            prop_assert!(!step.is_triggered());
        }
    }
}

/// Long stationary stream: the pruned stack must stay small even though
/// every one of the 20k start times is implicitly still under test.
#[test]
fn stack_stays_small_over_a_long_stationary_stream() {
    let mut state = 0x0DDB_1A5E_5BAD_5EEDu64;
    let mut focus = Focus::new(FocusConfig {
        threshold_std: 50.0,
        mu_min: 1.0,
    })
    .expect("valid config");

    let mut max_len = 0;
    for _ in 0..20_000 {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let x = (state >> 59) % 9;
        focus.update(x, 4.0).expect("update should succeed");
        max_len = max_len.max(focus.stack_len());
    }
    assert!(
        max_len <= 64,
        "stack reached {max_len} curves on stationary input"
    );
}
