// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use focus_core::FocusError;

/// Borrowed row-major observation matrix: one row per time step, one column
/// per channel, with per-row timestamps and instrument-anomaly flags.
#[derive(Clone, Copy, Debug)]
pub struct ChannelMatrix<'a> {
    counts: &'a [u64],
    timestamps: &'a [f64],
    gaps: &'a [bool],
    n_rows: usize,
    n_channels: usize,
}

impl<'a> ChannelMatrix<'a> {
    pub fn new(
        counts: &'a [u64],
        n_rows: usize,
        n_channels: usize,
        timestamps: &'a [f64],
        gaps: &'a [bool],
    ) -> Result<Self, FocusError> {
        if n_channels == 0 {
            return Err(FocusError::invalid_parameter(
                "channel matrix needs at least one channel",
            ));
        }
        if counts.len() != n_rows * n_channels {
            return Err(FocusError::invalid_parameter(format!(
                "counts length {} does not match {n_rows} rows x {n_channels} channels",
                counts.len()
            )));
        }
        if timestamps.len() != n_rows {
            return Err(FocusError::invalid_parameter(format!(
                "timestamps length {} does not match {n_rows} rows",
                timestamps.len()
            )));
        }
        if gaps.len() != n_rows {
            return Err(FocusError::invalid_parameter(format!(
                "gap flags length {} does not match {n_rows} rows",
                gaps.len()
            )));
        }
        Ok(Self {
            counts,
            timestamps,
            gaps,
            n_rows,
            n_channels,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// Counts for row `t`, one entry per channel.
    ///
    /// # Panics
    ///
    /// Panics if `t >= n_rows()`.
    pub fn row(&self, t: usize) -> &'a [u64] {
        &self.counts[t * self.n_channels..(t + 1) * self.n_channels]
    }

    /// Timestamp of row `t`.
    ///
    /// # Panics
    ///
    /// Panics if `t >= n_rows()`.
    pub fn timestamp(&self, t: usize) -> f64 {
        self.timestamps[t]
    }

    /// Whether row `t` is flagged as an instrument anomaly.
    ///
    /// # Panics
    ///
    /// Panics if `t >= n_rows()`.
    pub fn is_gap(&self, t: usize) -> bool {
        self.gaps[t]
    }
}
