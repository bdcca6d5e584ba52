// Copyright (c) 2024-2025 Jesse Morgan
// Licensed under the MIT License. See LICENSE file for details.

//! Utility functions for jj.

/// Number of session ID characters kept visible in logs.
pub const SESSION_ID_VISIBLE_PREFIX: usize = 4;

/// Mask sensitive strings for logging, keeping only a short prefix.
///
/// # Examples
///
/// ```
/// use jj::utils::mask_sensitive;
///
/// assert_eq!(mask_sensitive("ABCDEFGHIJKLMNOPQRSTUVWXYZ", 4), "ABCD...");
/// ```
pub fn mask_sensitive(input: &str, visible_prefix: usize) -> String {
    // Short input is shown as a bare marker so nothing of it leaks
    if input.chars().count() <= visible_prefix {
        return "...".to_string();
    }

    let prefix: String = input.chars().take(visible_prefix).collect();
    format!("{}...", prefix)
}

/// Mask a session ID for log output.
pub fn mask_session_id(session_id: &str) -> String {
    mask_sensitive(session_id, SESSION_ID_VISIBLE_PREFIX)
}
