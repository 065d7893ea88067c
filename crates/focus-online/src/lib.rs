// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Online Poisson-FOCuS transient detection.
//!
//! [`Focus`] is the core stack engine: it implicitly evaluates the Poisson
//! generalized likelihood-ratio statistic over every possible changepoint
//! start time in amortized constant time per step, by keeping only the
//! non-dominated hypothesis curves. [`ConstantFocus`] runs it over a known
//! constant background rate; [`DesFocus`] derives the background from a
//! lagged double-exponential-smoothing forecast with an optional bounded
//! quality-control re-scan.

pub mod constant;
pub mod curve;
pub mod des;
pub mod detector;

pub use constant::{ConstantConfig, ConstantFocus};
pub use curve::{Curve, dominates, ymax, ymax_or_zero};
pub use des::{DesConfig, DesFocus};
pub use detector::{Focus, FocusConfig, FocusStep};
