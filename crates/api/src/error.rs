// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use reqwest::StatusCode;
use roster::BackendError;
use thiserror::Error;

/// Errors raised while setting up the REST boundary or exporting data.
///
/// Request failures are not reported here; they are translated into
/// [`BackendError`] so the core components can classify them.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured backend URL cannot be used.
    #[error("Invalid backend URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
    /// Writing an export failed.
    #[error("Export failed: {0}")]
    Export(String),
}

impl From<csv::Error> for ApiError {
    fn from(err: csv::Error) -> Self {
        Self::Export(err.to_string())
    }
}

/// Translates a transport-level failure into a backend error.
///
/// Body decoding failures are reported as [`BackendError::Decode`]; every
/// other failure means no usable response arrived.
#[must_use]
pub fn translate_transport_error(err: &reqwest::Error) -> BackendError {
    if err.is_decode() {
        BackendError::Decode(err.to_string())
    } else {
        BackendError::Transport(err.to_string())
    }
}

/// Translates a non-success HTTP status into a backend error.
///
/// # Arguments
///
/// * `status` - The response status
/// * `message` - The envelope message, when the body carried one
#[must_use]
pub fn translate_status(status: StatusCode, message: Option<String>) -> BackendError {
    if status == StatusCode::UNAUTHORIZED {
        return BackendError::Unauthorized;
    }
    let message: String = message.unwrap_or_else(|| {
        status
            .canonical_reason()
            .map_or_else(|| status.as_str().to_string(), String::from)
    });
    BackendError::Rejected(format!("{} {message}", status.as_u16()))
}
