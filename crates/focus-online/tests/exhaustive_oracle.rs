// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Agreement between the streaming detector and the O(n^2) exhaustive
//! search over all candidate start times, for constant background.
//!
//! The exhaustive reference is the correctness oracle only: with
//! `mu_min = 1` the pruned stack provably attains the same per-step
//! maximum, so both must trigger on the same step. The streaming detector
//! reports the most recent qualifying hypothesis rather than the global
//! maximum, so its significance is bounded by the oracle's and equals it
//! whenever a single hypothesis crosses first.

use focus_core::{RunOutcome, TriggerAlgorithm};
use focus_online::{ConstantConfig, ConstantFocus};

/// Exhaustive generalized likelihood-ratio search, O(n) per step.
fn exhaustive_run(xs: &[u64], background: f64, threshold_std: f64) -> RunOutcome {
    let threshold_llr = threshold_std * threshold_std / 2.0;
    let mut prefix = vec![0u64];
    for (t, &x) in xs.iter().enumerate() {
        prefix.push(prefix[t] + x);
        let mut best = 0.0_f64;
        let mut best_h = 0;
        for h in 1..=t + 1 {
            let a = (prefix[t + 1] - prefix[t + 1 - h]) as f64;
            let b = background * h as f64;
            if a > b {
                let llr = a * (a / b).ln() - (a - b);
                if llr > best {
                    best = llr;
                    best_h = h;
                }
            }
        }
        if best >= threshold_llr {
            return RunOutcome {
                significance: (2.0 * best).sqrt(),
                changepoint: t + 2 - best_h,
                stop: t + 1,
            };
        }
    }
    RunOutcome::no_detection(xs.len())
}

fn focus_run(xs: &[u64], background: f64, threshold_std: f64) -> RunOutcome {
    let mut algo = ConstantFocus::new(ConstantConfig {
        background,
        threshold_std,
        mu_min: 1.0,
        skip: 0,
    })
    .expect("valid config");
    algo.run(xs).expect("run should succeed")
}

fn stationary(n: usize) -> Vec<u64> {
    [4u64, 3, 5, 4, 2, 6, 4, 4].iter().copied().cycle().take(n).collect()
}

/// Deterministic pseudo-Poisson counts in 0..=8 (mean 4).
fn noise(seed: u64, n: usize) -> Vec<u64> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).max(1);
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 59) % 9
        })
        .collect()
}

#[test]
fn sharp_burst_matches_the_oracle_exactly() {
    for (background, threshold_std) in [(4.0, 5.0), (2.5, 5.0), (4.0, 6.0), (0.5, 4.0)] {
        let mut xs = stationary(400);
        xs.extend(std::iter::repeat_n(40u64, 10));

        let focus = focus_run(&xs, background, threshold_std);
        let oracle = exhaustive_run(&xs, background, threshold_std);

        assert!(focus.is_detection() && oracle.is_detection());
        assert_eq!(focus.stop, oracle.stop, "b={background} thr={threshold_std}");
        assert_eq!(
            focus.changepoint, oracle.changepoint,
            "b={background} thr={threshold_std}"
        );
        assert!(
            (focus.significance - oracle.significance).abs() < 1e-9,
            "b={background} thr={threshold_std}: {} vs {}",
            focus.significance,
            oracle.significance
        );
    }
}

#[test]
fn quiet_stream_matches_the_oracle_no_detection() {
    let xs = stationary(2000);
    let focus = focus_run(&xs, 4.0, 6.0);
    let oracle = exhaustive_run(&xs, 4.0, 6.0);
    assert_eq!(focus, RunOutcome::no_detection(2000));
    assert_eq!(oracle, RunOutcome::no_detection(2000));
}

#[test]
fn noisy_streams_agree_on_the_trigger_step() {
    for seed in 1..=40u64 {
        let mut xs = noise(seed, 600);
        // Bursts of varying strength, some near the detection floor.
        let strength = 8 + (seed % 6) * 4;
        for slot in xs[300..330].iter_mut() {
            *slot += strength;
        }

        let focus = focus_run(&xs, 4.0, 5.0);
        let oracle = exhaustive_run(&xs, 4.0, 5.0);

        assert_eq!(
            focus.is_detection(),
            oracle.is_detection(),
            "seed {seed}: detection disagreement"
        );
        assert_eq!(focus.stop, oracle.stop, "seed {seed}: stop disagreement");
        if focus.is_detection() {
            // First-match policy: bounded by the oracle's global maximum,
            // and above the configured threshold.
            assert!(focus.significance >= 5.0, "seed {seed}");
            assert!(
                focus.significance <= oracle.significance + 1e-9,
                "seed {seed}: {} vs {}",
                focus.significance,
                oracle.significance
            );
        }
    }
}

#[test]
fn weak_rate_increase_is_found_by_both_given_enough_data() {
    // A 50% rate increase over a long stretch: detectable only by
    // accumulating evidence across many steps.
    let mut xs = stationary(800);
    let bump = noise(7, 400).into_iter().map(|x| x + 2).collect::<Vec<_>>();
    xs.extend(&bump);

    let focus = focus_run(&xs, 4.0, 5.0);
    let oracle = exhaustive_run(&xs, 4.0, 5.0);

    assert!(focus.is_detection());
    assert_eq!(focus.stop, oracle.stop);
    assert!(focus.stop > 800, "evidence must accumulate past the change");
    // The inferred start should fall close to the true change at 801.
    assert!(focus.changepoint >= 780 && focus.changepoint <= focus.stop);
}
