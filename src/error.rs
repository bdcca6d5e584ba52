// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error taxonomy for the staging service.
//!
//! Session errors are recovered by the request gate (redirect to `/`) and
//! never reach the client as error pages. Everything else indicates a
//! programmer or infrastructure fault.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::server::cookies::expire_session_cookie;
use crate::utils::mask_session_id;

#[derive(Debug, Error)]
pub enum StagingError {
    /// No session cookie on a gated route.
    #[error("no session cookie presented")]
    MissingSession,

    /// Session cookie present but unknown to the registry.
    #[error("session cookie is stale")]
    StaleSession,

    /// Submission against a session the registry does not hold.
    #[error("unknown session: {}", mask_session_id(.0))]
    UnknownSession(String),

    /// The OS random source failed.
    #[error("random source failure: {0}")]
    RandomSource(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl IntoResponse for StagingError {
    fn into_response(self) -> Response {
        match self {
            StagingError::MissingSession => {
                (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
            }
            StagingError::StaleSession => (
                StatusCode::FOUND,
                [
                    (header::LOCATION, "/".to_string()),
                    (header::SET_COOKIE, expire_session_cookie()),
                ],
            )
                .into_response(),
            other => {
                tracing::error!("REQUEST_FAILED | error={}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_session_message_is_masked() {
        let err = StagingError::UnknownSession("ABCDEFGHIJKLMNOPQRSTUVWXYZ".to_string());
        let msg = err.to_string();
        assert!(msg.contains("ABCD..."));
        assert!(!msg.contains("EFGH"));
    }

    #[test]
    fn test_missing_session_redirects() {
        let response = StagingError::MissingSession.into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[test]
    fn test_stale_session_redirects_and_expires_cookie() {
        let response = StagingError::StaleSession.into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("marine=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let response = StagingError::RandomSource("entropy pool gone".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
