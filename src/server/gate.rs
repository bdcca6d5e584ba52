// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Request gate for routes that need an established session.
//!
//! The gate resolves the session cookie against the registry, mints a fresh
//! [`SecretChallenge`] for the request and hands both to the handler as a
//! typed [`RequestContext`] request extension.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::StagingError;
use crate::security::SecretChallenge;
use crate::staging::{SessionId, StagingStore};
use crate::token;
use crate::utils::mask_session_id;

use super::cookies;
use super::AppState;

/// Request-scoped data bound by the gate.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The caller's validated session.
    pub session_id: SessionId,
    challenge: SecretChallenge,
}

impl RequestContext {
    pub fn new(session_id: SessionId, challenge: SecretChallenge) -> Self {
        Self {
            session_id,
            challenge,
        }
    }

    /// Disclosure bound to this request's challenge token.
    pub fn disclose(&self, guess: &str) -> String {
        self.challenge.disclose(guess)
    }
}

/// Resolve the session presented in `headers`.
pub fn resolve_session(
    store: &StagingStore,
    headers: &HeaderMap,
) -> Result<SessionId, StagingError> {
    let session_id = cookies::session_cookie(headers).ok_or(StagingError::MissingSession)?;

    if !token::is_well_formed(&session_id) || !store.contains(&session_id) {
        tracing::warn!("SESSION_STALE | session={}", mask_session_id(&session_id));
        return Err(StagingError::StaleSession);
    }
    Ok(session_id)
}

/// Middleware: redirect callers without a live session, otherwise bind a
/// [`RequestContext`] and run the wrapped handler.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let session_id = match resolve_session(&state.store, request.headers()) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };

    tracing::debug!(
        "GATE_PASSED | session={} path={}",
        mask_session_id(&session_id),
        request.uri().path()
    );

    let challenge = SecretChallenge::issue(Arc::clone(&state.secret));
    request
        .extensions_mut()
        .insert(RequestContext::new(session_id, challenge));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};
    use crate::security::PLACEHOLDER;

    fn cookie_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("marine={}", value)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_resolve_missing() {
        let store = StagingStore::default();
        let err = resolve_session(&store, &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, StagingError::MissingSession));
    }

    #[test]
    fn test_resolve_stale() {
        let store = StagingStore::default();
        store.create_session();

        let err = resolve_session(&store, &cookie_headers(&token::generate())).unwrap_err();
        assert!(matches!(err, StagingError::StaleSession));

        let err = resolve_session(&store, &cookie_headers("not-a-token")).unwrap_err();
        assert!(matches!(err, StagingError::StaleSession));
    }

    #[test]
    fn test_resolve_live() {
        let store = StagingStore::default();
        let id = store.create_session();
        assert_eq!(resolve_session(&store, &cookie_headers(&id)).unwrap(), id);
    }

    #[test]
    fn test_context_disclosure_is_per_request() {
        let secret: Arc<str> = Arc::from("s3cr3t");
        let first = RequestContext::new("A".into(), SecretChallenge::issue(Arc::clone(&secret)));
        let second = RequestContext::new("A".into(), SecretChallenge::issue(secret));

        assert_eq!(first.disclose(""), PLACEHOLDER);
        assert_eq!(first.disclose("s3cr3t"), PLACEHOLDER);
        assert_eq!(second.disclose("AAAAAAAAAAAAAAAAAAAAAAAAAA"), PLACEHOLDER);
    }
}
