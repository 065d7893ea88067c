// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Multi-channel trigger multiplexer.
//!
//! Runs one independent trigger algorithm per detector/energy channel over
//! a shared observation matrix, resets every channel across data gaps
//! (instrument anomalies, sensor dropouts) and aggregates per-channel
//! exceedances into system-level triggers through a configurable
//! coincidence rule.

mod matrix;
mod mux;

pub use matrix::ChannelMatrix;
pub use mux::{ChannelExceedance, CoincidenceRule, MuxConfig, TriggerMux, TriggerRecord};
