// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bearer token check for the reference server.
//!
//! The server has no accounts. When started with a token, every roster
//! request must present it as `Authorization: Bearer <token>`; otherwise
//! requests are accepted as is.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::{AppState, ErrorResponse};

/// Extractor that admits a request when the configured token matches.
pub struct Authorized;

impl FromRequestParts<AppState> for Authorized {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.token.as_deref() else {
            return Ok(Self);
        };

        let header: &str = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                debug!("Missing Authorization header");
                SessionError::MissingToken
            })?;
        let token: &str = header.strip_prefix("Bearer ").ok_or_else(|| {
            warn!("Malformed Authorization header");
            SessionError::InvalidToken
        })?;

        if token.trim() == expected {
            Ok(Self)
        } else {
            warn!("Rejected request with an unknown token");
            Err(SessionError::InvalidToken)
        }
    }
}

/// Why a request was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// No `Authorization` header.
    MissingToken,
    /// The header is malformed or the token does not match.
    InvalidToken,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let message: &str = match self {
            Self::MissingToken => "Authentication required",
            Self::InvalidToken => "Session is invalid or expired",
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                success: false,
                message: message.to_string(),
            }),
        )
            .into_response()
    }
}
