// SPDX-FileCopyrightText: The cratedigger authors
// SPDX-License-Identifier: MPL-2.0

use thiserror::Error;

/// Save precondition violated locally.
///
/// Raised synchronously, before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("crate name must not be empty")]
    EmptyName,
    #[error("smart crate needs at least one rule")]
    NoRules,
}

/// Failures surfaced by this crate.
///
/// None of them is fatal to the hosting application: validation errors
/// block a save before the network is touched, preview failures leave the
/// session editable, and a failed save preserves the draft for a retry.
/// There is no automatic retry for any call.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Transport failure or undecodable response body.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
