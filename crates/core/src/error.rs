// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use roster_domain::DomainError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a backend implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Transport(String),
    /// The backend answered with `success: false` or an error status.
    #[error("Request rejected: {0}")]
    Rejected(String),
    /// The response body did not match the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),
    /// The session is missing, expired or was refused.
    #[error("Session is missing or expired")]
    Unauthorized,
}

/// Errors raised by durable client storage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// Reading or writing the underlying medium failed.
    #[error("Storage I/O failed for key '{key}': {message}")]
    Io {
        /// The storage key.
        key: String,
        /// The underlying error.
        message: String,
    },
    /// A value could not be serialized.
    #[error("Could not serialize value for key '{key}': {message}")]
    Serialize {
        /// The storage key.
        key: String,
        /// The underlying error.
        message: String,
    },
}

/// Classification of a failed list fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    /// Transport failure.
    Network,
    /// Non-success response.
    Rejected,
    /// Malformed response.
    Decode,
    /// Missing or expired session.
    Unauthorized,
    /// The fetch task ended without producing a result.
    Interrupted,
}

/// A failed list fetch, kept alongside the last good page.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct FetchError {
    /// What went wrong.
    pub kind: FetchErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl From<&BackendError> for FetchError {
    fn from(err: &BackendError) -> Self {
        let kind: FetchErrorKind = match err {
            BackendError::Transport(_) => FetchErrorKind::Network,
            BackendError::Rejected(_) => FetchErrorKind::Rejected,
            BackendError::Decode(_) => FetchErrorKind::Decode,
            BackendError::Unauthorized => FetchErrorKind::Unauthorized,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// Why a page change was ignored.
///
/// These are not surfaced to the operator; the request is simply a no-op.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum InvalidPageRequest {
    /// No page has been loaded yet, so the page count is unknown.
    #[error("Page count is not known yet")]
    TotalUnknown,
    /// The page is outside `[1, pages]`.
    #[error("Page {requested} is outside 1..={pages}")]
    OutOfRange {
        /// The requested page.
        requested: u32,
        /// The last valid page.
        pages: u32,
    },
    /// A page change is still being fetched.
    #[error("A page change is already in flight")]
    PaginationInFlight,
}

/// Why a filter change was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The value is not valid for the key.
    #[error(transparent)]
    Invalid(#[from] DomainError),
    /// A page change failed the page-bound checks.
    #[error(transparent)]
    Page(#[from] InvalidPageRequest),
}
