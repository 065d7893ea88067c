// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Shared contracts for the Poisson-FOCuS transient-detection workspace:
//! the workspace error type and the online trigger-algorithm trait with its
//! per-step and end-of-run result types.

mod error;
mod trigger;

pub use error::FocusError;
pub use trigger::{RunOutcome, TriggerAlgorithm, TriggerStep};
