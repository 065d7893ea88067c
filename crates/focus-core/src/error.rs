// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use thiserror::Error;

/// Error type shared by every crate in the workspace.
///
/// Parameter problems are raised eagerly at construction time; the runtime
/// variants (`InvalidBackground`, `NumericalIssue`) indicate a caller
/// contract breach mid-stream and are never coerced to a quiet result.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FocusError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("invalid background: {0}")]
    InvalidBackground(String),
    #[error("numerical issue: {0}")]
    NumericalIssue(String),
    #[error("unrecoverable gap: {0}")]
    UnrecoverableGap(String),
}

impl FocusError {
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    pub fn invalid_background(message: impl Into<String>) -> Self {
        Self::InvalidBackground(message.into())
    }

    pub fn numerical_issue(message: impl Into<String>) -> Self {
        Self::NumericalIssue(message.into())
    }

    pub fn unrecoverable_gap(message: impl Into<String>) -> Self {
        Self::UnrecoverableGap(message.into())
    }
}
