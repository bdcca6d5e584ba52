// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Session cookie transport.

use axum::http::{header, HeaderMap};

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "marine";

/// Extract the session cookie value from the request headers.
///
/// All `Cookie` headers are scanned; the first `marine=` pair wins. An
/// empty value counts as no cookie.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let prefix = format!("{SESSION_COOKIE_NAME}=");
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| cookie.trim().strip_prefix(prefix.as_str()))
        .map(|value| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value issuing a session-lifetime cookie (no expiry).
pub fn issue_session_cookie(session_id: &str) -> String {
    format!("{SESSION_COOKIE_NAME}={session_id}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value clearing the session cookie with an already-passed expiry.
pub fn expire_session_cookie() -> String {
    format!(
        "{SESSION_COOKIE_NAME}=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0"
    )
}
