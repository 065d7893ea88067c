// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::curve::{Curve, dominates, ymax, ymax_or_zero};
use focus_core::FocusError;

/// Poisson-FOCuS detector configuration.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusConfig {
    /// Trigger threshold in standard-deviation units.
    pub threshold_std: f64,
    /// Minimum detectable rate ratio; raises the pruning floor. Must be >= 1.
    pub mu_min: f64,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            threshold_std: 5.0,
            mu_min: 1.0,
        }
    }
}

impl FocusConfig {
    pub(crate) fn validate(&self) -> Result<(), FocusError> {
        if !self.threshold_std.is_finite() || self.threshold_std <= 0.0 {
            return Err(FocusError::invalid_parameter(format!(
                "threshold_std must be finite and > 0; got {}",
                self.threshold_std
            )));
        }
        if !self.mu_min.is_finite() || self.mu_min < 1.0 {
            return Err(FocusError::invalid_parameter(format!(
                "mu_min must be finite and >= 1; got {}",
                self.mu_min
            )));
        }
        Ok(())
    }

    /// LLR threshold, `threshold_std^2 / 2` by Wilks' theorem.
    pub fn threshold_llr(&self) -> f64 {
        self.threshold_std * self.threshold_std / 2.0
    }

    /// Pruning gate slope `(mu_min - 1) / ln(mu_min)`, with limit 1 at
    /// `mu_min == 1`.
    pub fn ab_crit(&self) -> f64 {
        if self.mu_min == 1.0 {
            1.0
        } else {
            (self.mu_min - 1.0) / self.mu_min.ln()
        }
    }
}

/// Session-state snapshot returned by [`Focus::update`].
///
/// `global_max` is in log-likelihood-ratio units; it becomes non-zero only
/// once some hypothesis crossed the configured threshold, and `time_offset`
/// is then the age of that hypothesis.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocusStep {
    pub global_max: f64,
    pub time_offset: usize,
}

impl FocusStep {
    pub fn is_triggered(&self) -> bool {
        self.global_max > 0.0
    }

    /// Standard-deviation significance, `sqrt(2 * LLR)`.
    pub fn significance(&self) -> f64 {
        (2.0 * self.global_max).sqrt()
    }
}

/// Online Poisson-FOCuS changepoint detector.
///
/// Maintains the pruned stack of non-dominated changepoint hypotheses,
/// oldest first, between the anchor sentinel at the bottom and a fresh
/// zero-age curve on top. Each curve is pushed once and popped at most once,
/// so `update` is amortized O(1) while implicitly scoring every possible
/// start time.
#[derive(Clone, Debug)]
pub struct Focus {
    config: FocusConfig,
    threshold_llr: f64,
    ab_crit: f64,
    curves: Vec<Curve>,
    global_max: f64,
    time_offset: usize,
}

impl Focus {
    pub fn new(config: FocusConfig) -> Result<Self, FocusError> {
        config.validate()?;
        Ok(Self {
            threshold_llr: config.threshold_llr(),
            ab_crit: config.ab_crit(),
            config,
            curves: vec![Curve::anchor(), Curve::zero()],
            global_max: 0.0,
            time_offset: 0,
        })
    }

    pub fn config(&self) -> &FocusConfig {
        &self.config
    }

    /// Best LLR observed since construction or the last reset.
    pub fn global_max(&self) -> f64 {
        self.global_max
    }

    /// Age of the hypothesis producing [`Self::global_max`].
    pub fn time_offset(&self) -> usize {
        self.time_offset
    }

    /// Number of live curves, sentinels included. Bounded independent of
    /// stream length for stationary input.
    pub fn stack_len(&self) -> usize {
        self.curves.len()
    }

    pub(crate) fn curves(&self) -> &[Curve] {
        &self.curves
    }

    /// Discards all hypotheses and session state, as after construction.
    pub fn reset(&mut self) {
        self.curves.clear();
        self.curves.push(Curve::anchor());
        self.curves.push(Curve::zero());
        self.global_max = 0.0;
        self.time_offset = 0;
    }

    /// Advances the detector by one observation: `x` counts against an
    /// expected background increment `b`.
    pub fn update(&mut self, x: u64, b: f64) -> Result<FocusStep, FocusError> {
        if !b.is_finite() || b <= 0.0 {
            return Err(FocusError::invalid_background(format!(
                "background increment must be finite and > 0; got {b}"
            )));
        }

        let x = x as f64;
        let mut p = self
            .curves
            .pop()
            .expect("stack always holds the anchor and a top curve");
        let mut acc = p.accumulate(x, b);
        // Prune hypotheses made obsolete by the latest data. The anchor is
        // dominated by every finite curve, which terminates the loop.
        while !dominates(
            &p,
            self.curves
                .last()
                .expect("anchor sentinel is never popped"),
            &acc,
        ) {
            p = self
                .curves
                .pop()
                .expect("dominance loop stops at the anchor");
        }

        if (acc.counts - p.counts) > self.ab_crit * (acc.background - p.background) {
            // Hypothesis still viable above the mu_min floor.
            acc.best_llr = p.best_llr + ymax(&p, &acc)?;
            self.maximize(&p, &acc);
            self.curves.push(p);
            self.curves.push(acc);
        } else {
            // Below the detectability floor: no plausible changepoint older
            // than now. Collapse to the anchor and start fresh.
            self.curves.truncate(1);
            self.curves.push(Curve::zero());
        }

        Ok(FocusStep {
            global_max: self.global_max,
            time_offset: self.time_offset,
        })
    }

    /// Backward threshold scan over the surviving stack.
    ///
    /// Walks from the most recent hypothesis toward older ones while the
    /// memoized bound `m + best_llr` still allows a crossing; the first
    /// hypothesis whose own statistic reaches the threshold is reported.
    /// This first-match policy (rather than a global-maximum scan) is the
    /// documented behavior: once triggered, processing stops at this step.
    fn maximize(&mut self, p: &Curve, acc: &Curve) {
        let mut m = acc.best_llr - p.best_llr;
        let mut p_llr = p.best_llr;
        let mut p_age = p.age;
        let mut i = self.curves.len();
        while m + p_llr >= self.threshold_llr {
            if m >= self.threshold_llr {
                self.global_max = m;
                self.time_offset = (acc.age - p_age) as usize;
                break;
            }
            // Index 0 is the anchor, which has no evaluable statistic.
            if i <= 1 {
                break;
            }
            i -= 1;
            let q = &self.curves[i];
            p_llr = q.best_llr;
            p_age = q.age;
            m = ymax_or_zero(q, acc);
        }
    }
}
