// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::detector::{Focus, FocusConfig};
use focus_core::{FocusError, TriggerAlgorithm, TriggerStep};

/// Configuration for [`ConstantFocus`]: a known, constant background rate.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConstantConfig {
    /// Expected background counts per step. Must be finite and > 0.
    pub background: f64,
    pub threshold_std: f64,
    pub mu_min: f64,
    /// Initial steps ignored entirely: neither accumulated nor evaluated.
    pub skip: usize,
}

impl Default for ConstantConfig {
    fn default() -> Self {
        Self {
            background: 1.0,
            threshold_std: 5.0,
            mu_min: 1.0,
            skip: 0,
        }
    }
}

impl ConstantConfig {
    fn validate(&self) -> Result<(), FocusError> {
        if !self.background.is_finite() || self.background <= 0.0 {
            return Err(FocusError::invalid_parameter(format!(
                "background rate must be finite and > 0; got {}",
                self.background
            )));
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

/// Poisson-FOCuS over a caller-supplied constant background rate.
#[derive(Clone, Debug)]
pub struct ConstantFocus {
    config: ConstantConfig,
    focus: Focus,
    t: usize,
}

impl ConstantFocus {
    pub fn new(config: ConstantConfig) -> Result<Self, FocusError> {
        config.validate()?;
        let focus = Focus::new(config.focus_config())?;
        Ok(Self {
            config,
            focus,
            t: 0,
        })
    }

    pub fn config(&self) -> &ConstantConfig {
        &self.config
    }

    /// The wrapped detector, for state inspection after a step.
    pub fn detector(&self) -> &Focus {
        &self.focus
    }
}

impl TriggerAlgorithm for ConstantFocus {
    fn step(&mut self, x: u64) -> Result<TriggerStep, FocusError> {
        let t = self.t;
        self.t += 1;
        if t < self.config.skip {
            return Ok(TriggerStep::quiet());
        }

        let step = self.focus.update(x, self.config.background)?;
        if step.is_triggered() {
            return Ok(TriggerStep {
                significance: step.significance(),
                offset: step.time_offset,
            });
        }
        Ok(TriggerStep::quiet())
    }

    fn reset(&mut self) {
        self.focus.reset();
        self.t = 0;
    }
}
