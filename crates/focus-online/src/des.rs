// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::curve::ymax_or_zero;
use crate::detector::{Focus, FocusConfig};
use focus_core::{FocusError, TriggerAlgorithm, TriggerStep};
use std::collections::VecDeque;

/// Configuration for [`DesFocus`]: Poisson-FOCuS over a double-exponential-
/// smoothing background forecast.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DesConfig {
    pub threshold_std: f64,
    /// DES level smoothing factor. Must be >= 0.
    pub alpha: f64,
    /// DES slope smoothing factor. Must be >= 0.
    pub beta: f64,
    /// Background estimate delay and forecast length, in steps. The most
    /// recent `m` counts are deliberately excluded from the estimate so an
    /// ongoing transient cannot contaminate its own background.
    pub m: usize,
    pub mu_min: f64,
    /// Maximum plausible changepoint duration; enables the quality-control
    /// re-scan that keeps delayed forecasts from reporting changepoints too
    /// far in the past. Disabled when `None`.
    pub t_max: Option<usize>,
    /// Warm-up length for automated level initialization; defaults to `m`.
    pub sleep: Option<usize>,
    /// Initial level; defaults to the average over the first `sleep - m`
    /// counts.
    pub s_0: Option<f64>,
    /// Initial slope; defaults to 0.
    pub b_0: Option<f64>,
}

impl Default for DesConfig {
    fn default() -> Self {
        Self {
            threshold_std: 5.0,
            alpha: 0.1,
            beta: 0.1,
            m: 8,
            mu_min: 1.0,
            t_max: None,
            sleep: None,
            s_0: None,
            b_0: None,
        }
    }
}

impl DesConfig {
    fn validate(&self) -> Result<(), FocusError> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(FocusError::invalid_parameter(format!(
                "alpha must be finite and >= 0; got {}",
                self.alpha
            )));
        }
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(FocusError::invalid_parameter(format!(
                "beta must be finite and >= 0; got {}",
                self.beta
            )));
        }
        if self.m == 0 {
            return Err(FocusError::invalid_parameter(
                "forecast delay m must be >= 1",
            ));
        }
        let sleep = self.sleep.unwrap_or(self.m);
        if sleep < self.m {
            return Err(FocusError::invalid_parameter(format!(
                "sleep must be >= m; got sleep={sleep}, m={}",
                self.m
            )));
        }
        match self.s_0 {
            Some(s_0) if !s_0.is_finite() || s_0 <= 0.0 => {
                return Err(FocusError::invalid_parameter(format!(
                    "s_0 must be finite and > 0; got {s_0}"
                )));
            }
            None if sleep == self.m => {
                return Err(FocusError::invalid_parameter(
                    "automated level initialization needs sleep > m; supply s_0 or a longer sleep",
                ));
            }
            _ => {}
        }
        if let Some(b_0) = self.b_0
            && (!b_0.is_finite() || b_0 < 0.0)
        {
            return Err(FocusError::invalid_parameter(format!(
                "b_0 must be finite and >= 0; got {b_0}"
            )));
        }
        if self.t_max == Some(0) {
            return Err(FocusError::invalid_parameter("t_max must be >= 1"));
        }
        self.focus_config().validate()
    }

    fn focus_config(&self) -> FocusConfig {
        FocusConfig {
            threshold_std: self.threshold_std,
            mu_min: self.mu_min,
        }
    }
}

/// Poisson-FOCuS fed by a lagged double-exponential-smoothing forecast.
///
/// The level/slope pair is trained on counts delayed by `m` steps and the
/// background handed to the detector at time `t` is the `m`-step-ahead
/// forecast `lambda_t = s_t + m * b_t`.
#[derive(Clone, Debug)]
pub struct DesFocus {
    config: DesConfig,
    sleep: usize,
    focus: Focus,
    buffer: VecDeque<u64>,
    s_t: f64,
    b_t: f64,
    t: usize,
}

impl DesFocus {
    pub fn new(config: DesConfig) -> Result<Self, FocusError> {
        config.validate()?;
        let focus = Focus::new(config.focus_config())?;
        Ok(Self {
            sleep: config.sleep.unwrap_or(config.m),
            config,
            focus,
            buffer: VecDeque::new(),
            s_t: 0.0,
            b_t: 0.0,
            t: 0,
        })
    }

    pub fn config(&self) -> &DesConfig {
        &self.config
    }

    /// Current level estimate. Meaningful only after warm-up.
    pub fn level(&self) -> f64 {
        self.s_t
    }

    /// Current slope estimate. Meaningful only after warm-up.
    pub fn slope(&self) -> f64 {
        self.b_t
    }

    /// Forecast background for the current step.
    pub fn forecast(&self) -> f64 {
        self.s_t + self.config.m as f64 * self.b_t
    }

    fn initialize(&mut self) {
        self.s_t = match self.config.s_0 {
            Some(s_0) => s_0,
            None => {
                let window = self.sleep - self.config.m;
                let sum: u64 = self.buffer.iter().take(window).sum();
                sum as f64 / window as f64
            }
        };
        self.b_t = self.config.b_0.unwrap_or(0.0);
    }

    fn smooth(&mut self, x: f64) {
        let s_prev = self.s_t;
        let b_prev = self.b_t;
        self.s_t = self.config.alpha * x + (1.0 - self.config.alpha) * (s_prev + b_prev);
        self.b_t = self.config.beta * (self.s_t - s_prev) + (1.0 - self.config.beta) * b_prev;
    }

    /// Quality-control re-maximization.
    ///
    /// Because the forecast lags by `m` steps, the unbounded stack maximum
    /// can sit on a hypothesis far older than any plausible transient.
    /// With `t_max` configured, the maximum is recomputed over the top of
    /// the stack only, skipping curves older than `t_max`.
    fn quality_control(&self) -> TriggerStep {
        let Some(t_max) = self.config.t_max else {
            return TriggerStep {
                significance: (2.0 * self.focus.global_max()).sqrt(),
                offset: self.focus.time_offset(),
            };
        };

        let curves = self.focus.curves();
        let (acc, older) = curves
            .split_last()
            .expect("curve stack always holds the anchor and a top curve");
        let mut best = 0.0;
        let mut offset = 0;
        // Walk newest to oldest, never reaching the anchor at index 0.
        for q in older.iter().skip(1).rev() {
            if (acc.age - q.age) as usize > t_max {
                break;
            }
            let q_max = ymax_or_zero(q, acc);
            if q_max > best {
                best = q_max;
                offset = (acc.age - q.age) as usize;
            }
        }
        TriggerStep {
            significance: (2.0 * best).sqrt(),
            offset,
        }
    }
}

impl TriggerAlgorithm for DesFocus {
    fn step(&mut self, x: u64) -> Result<TriggerStep, FocusError> {
        let t = self.t;
        self.t += 1;
        self.buffer.push_back(x);

        if t < self.sleep {
            return Ok(TriggerStep::quiet());
        }
        if t == self.sleep {
            self.initialize();
            for _ in 0..self.sleep - self.config.m {
                self.buffer.pop_front();
            }
        }

        let lagged = self
            .buffer
            .pop_front()
            .expect("lag buffer holds m + 1 entries after warm-up");
        self.smooth(lagged as f64);
        let lambda_t = self.forecast();
        let step = self.focus.update(x, lambda_t)?;
        if step.is_triggered() {
            return Ok(self.quality_control());
        }
        Ok(TriggerStep::quiet())
    }

    fn reset(&mut self) {
        self.focus.reset();
        self.buffer.clear();
        self.s_t = 0.0;
        self.b_t = 0.0;
        self.t = 0;
    }
}
