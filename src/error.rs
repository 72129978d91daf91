// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy for report requests.

use thiserror::Error;

/// Errors surfaced to callers of the reporting commands.
///
/// The aggregation engine itself never produces these: parameters are
/// validated when the newtypes in [`crate::model`] and [`crate::window`] are
/// constructed, user existence is checked before the engine runs, and post
/// source failures pass through the engine unchanged before being wrapped in
/// [`ReportError::Source`] here.
#[derive(Debug, Error)]
pub enum ReportError {
    /// No user matches the given id or email address.
    #[error("user not found: {0}")]
    NotFound(String),

    #[error("invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("post source failed")]
    Source(#[source] anyhow::Error),
}

impl ReportError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
