// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::FocusError;

/// Per-step readout of an online trigger algorithm.
///
/// `significance` is in standard-deviation units (`sqrt(2 * LLR)` by Wilks'
/// theorem); zero means the detector has not crossed its threshold at this
/// step. `offset` is the age, in steps, of the hypothesized rate change.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerStep {
    pub significance: f64,
    pub offset: usize,
}

impl TriggerStep {
    /// A below-threshold step.
    pub const fn quiet() -> Self {
        Self {
            significance: 0.0,
            offset: 0,
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.significance > 0.0
    }
}

/// End-of-run contract shared by every trigger algorithm.
///
/// Indices are 1-based: `changepoint` is the sample where the rate increase
/// is inferred to have started, `stop` the sample where detection fired.
/// "No detection" over `n` samples is encoded as
/// `(significance = 0.0, changepoint = n + 1, stop = n)`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunOutcome {
    pub significance: f64,
    pub changepoint: usize,
    pub stop: usize,
}

impl RunOutcome {
    pub const fn no_detection(n: usize) -> Self {
        Self {
            significance: 0.0,
            changepoint: n + 1,
            stop: n,
        }
    }

    pub fn is_detection(&self) -> bool {
        self.significance > 0.0
    }
}

/// Contract for online trigger algorithms consumed by the multiplexer.
///
/// `step` consumes one raw count and deterministically advances internal
/// state; results for step `t` depend only on the observations through `t`.
pub trait TriggerAlgorithm {
    fn step(&mut self, x: u64) -> Result<TriggerStep, FocusError>;

    /// Discards all accumulated state, as after construction.
    fn reset(&mut self);

    /// Feeds `xs` one count at a time, stopping at the first trigger.
    fn run(&mut self, xs: &[u64]) -> Result<RunOutcome, FocusError> {
        for (t, &x) in xs.iter().enumerate() {
            let step = self.step(x)?;
            if step.is_triggered() {
                return Ok(RunOutcome {
                    significance: step.significance,
                    // 1-based start of the interval covering the last
                    // `offset` samples ending at t.
                    changepoint: (t + 2).saturating_sub(step.offset),
                    stop: t + 1,
                });
            }
        }
        Ok(RunOutcome::no_detection(xs.len()))
    }
}
