// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use focus_core::{FocusError, TriggerAlgorithm};
use focus_online::{DesConfig, DesFocus};
use tracing::{debug, info};

use crate::matrix::ChannelMatrix;

/// Cross-channel coincidence predicate.
///
/// Channels are partitioned into consecutive groups of `group_size`
/// (e.g. three energy sub-ranges per physical detector); a system-level
/// trigger requires exceedances in at least `min_groups` distinct groups,
/// guarding against single-channel noise spikes.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoincidenceRule {
    pub group_size: usize,
    pub min_groups: usize,
}

impl Default for CoincidenceRule {
    fn default() -> Self {
        Self {
            group_size: 3,
            min_groups: 2,
        }
    }
}

impl CoincidenceRule {
    pub fn validate(&self) -> Result<(), FocusError> {
        if self.group_size == 0 {
            return Err(FocusError::invalid_parameter(
                "coincidence group_size must be >= 1",
            ));
        }
        if self.min_groups == 0 {
            return Err(FocusError::invalid_parameter(
                "coincidence min_groups must be >= 1",
            ));
        }
        Ok(())
    }

    /// True when the exceeding channels span enough distinct groups.
    pub fn is_satisfied(&self, channels: impl IntoIterator<Item = usize>) -> bool {
        let groups: BTreeSet<usize> = channels
            .into_iter()
            .map(|channel| channel / self.group_size)
            .collect();
        groups.len() >= self.min_groups
    }
}

/// One channel's contribution to a system-level trigger.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelExceedance {
    pub channel: usize,
    /// Age of the hypothesized rate change, in steps before the trigger row.
    pub offset: usize,
    pub significance: f64,
}

/// Registry entry for one system-level trigger.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerRecord {
    pub key: usize,
    pub timestamp: f64,
    pub row: usize,
    pub exceedances: Vec<ChannelExceedance>,
}

/// Multiplexer configuration.
///
/// `thresholds` holds one entry per channel, in standard-deviation units;
/// a channel counts as exceeding only strictly above its threshold, and
/// `None` disables a channel entirely (it is never stepped). `stride` is
/// the dead-time, in rows, imposed after each recorded trigger.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct MuxConfig {
    pub thresholds: Vec<Option<f64>>,
    pub stride: usize,
    pub coincidence: CoincidenceRule,
}

impl MuxConfig {
    pub fn validate(&self) -> Result<(), FocusError> {
        if !self.thresholds.iter().any(Option::is_some) {
            return Err(FocusError::invalid_parameter(
                "at least one channel threshold must be enabled",
            ));
        }
        for (channel, threshold) in self.thresholds.iter().enumerate() {
            if let Some(value) = threshold
                && !(value.is_finite() && *value > 0.0)
            {
                return Err(FocusError::invalid_parameter(format!(
                    "threshold for channel {channel} must be finite and > 0; got {value}"
                )));
            }
        }
        if self.stride == 0 {
            return Err(FocusError::invalid_parameter("stride must be >= 1"));
        }
        self.coincidence.validate()
    }
}

/// Runs one independent trigger algorithm per channel over a shared
/// observation matrix and aggregates per-channel exceedances into
/// system-level triggers.
#[derive(Debug)]
pub struct TriggerMux<T: TriggerAlgorithm> {
    config: MuxConfig,
    channels: Vec<T>,
}

impl<T: TriggerAlgorithm> TriggerMux<T> {
    pub fn new(channels: Vec<T>, config: MuxConfig) -> Result<Self, FocusError> {
        config.validate()?;
        if channels.len() != config.thresholds.len() {
            return Err(FocusError::invalid_parameter(format!(
                "{} channels but {} thresholds",
                channels.len(),
                config.thresholds.len()
            )));
        }
        Ok(Self { config, channels })
    }

    pub fn config(&self) -> &MuxConfig {
        &self.config
    }

    fn reset_channels(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
    }

    /// Processes the whole matrix, returning the ordered trigger registry.
    ///
    /// Data-gap rows and all-zero dropout rows reset every channel and the
    /// read position skips to the next usable row; a dropout from which
    /// some but never all channels recover before the end of stream is an
    /// `UnrecoverableGap`.
    pub fn run(&mut self, matrix: &ChannelMatrix<'_>) -> Result<Vec<TriggerRecord>, FocusError> {
        if matrix.n_channels() != self.channels.len() {
            return Err(FocusError::invalid_parameter(format!(
                "matrix has {} channels but multiplexer has {}",
                matrix.n_channels(),
                self.channels.len()
            )));
        }

        let n_rows = matrix.n_rows();
        let mut registry = Vec::new();
        let mut t = 0;
        while t < n_rows {
            if matrix.is_gap(t) {
                self.reset_channels();
                match (t..n_rows).find(|&row| !matrix.is_gap(row)) {
                    Some(next) => {
                        debug!(from = t, to = next, "skipping data gap");
                        t = next;
                    }
                    None => break,
                }
                continue;
            }

            if matrix.row(t).iter().all(|&x| x == 0) {
                self.reset_channels();
                match (t..n_rows).find(|&row| matrix.row(row).iter().all(|&x| x != 0)) {
                    Some(next) => {
                        debug!(from = t, to = next, "skipping sensor dropout");
                        t = next;
                    }
                    None => {
                        if (t..n_rows).any(|row| matrix.row(row).iter().any(|&x| x != 0)) {
                            return Err(FocusError::unrecoverable_gap(format!(
                                "partial signal after dropout at row {t} never spans all channels"
                            )));
                        }
                        break;
                    }
                }
                continue;
            }

            let row = matrix.row(t);
            let mut exceedances = Vec::new();
            for (channel, threshold) in self.config.thresholds.iter().enumerate() {
                let Some(threshold) = threshold else {
                    continue;
                };
                let step = self.channels[channel].step(row[channel])?;
                if step.significance > *threshold {
                    exceedances.push(ChannelExceedance {
                        channel,
                        offset: step.offset,
                        significance: step.significance,
                    });
                }
            }

            if self
                .config
                .coincidence
                .is_satisfied(exceedances.iter().map(|e| e.channel))
            {
                let record = TriggerRecord {
                    key: registry.len(),
                    timestamp: matrix.timestamp(t),
                    row: t,
                    exceedances,
                };
                info!(
                    key = record.key,
                    timestamp = record.timestamp,
                    row = t,
                    channels = record.exceedances.len(),
                    "system-level trigger"
                );
                registry.push(record);
                self.reset_channels();
                t += self.config.stride;
            } else {
                t += 1;
            }
        }
        Ok(registry)
    }
}

impl TriggerMux<DesFocus> {
    /// Convenience constructor: one DES-background detector per channel,
    /// all built from the same configuration.
    pub fn des(des: DesConfig, config: MuxConfig) -> Result<Self, FocusError> {
        let channels = config
            .thresholds
            .iter()
            .map(|_| DesFocus::new(des))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(channels, config)
    }
}
