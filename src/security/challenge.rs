// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Per-request secret challenge.
//!
//! Every gated request gets a fresh token. The privileged message is only
//! disclosed to a caller presenting that exact token. The token has no
//! public accessor and is redacted from `Debug` output, so the only way to
//! pass the challenge is to already hold it.

use std::fmt;
use std::sync::Arc;

use subtle::ConstantTimeEq;

use crate::token;

/// Returned by [`SecretChallenge::disclose`] for any wrong guess.
pub const PLACEHOLDER: &str = "Jalesveva Jayamahe";

/// A single-request challenge bound to the privileged disclosure string.
#[derive(Clone)]
pub struct SecretChallenge {
    token: String,
    secret: Arc<str>,
}

impl SecretChallenge {
    /// Mint a challenge with a freshly generated token.
    pub fn issue(secret: Arc<str>) -> Self {
        Self {
            token: token::generate(),
            secret,
        }
    }

    /// Reveal the privileged message iff `guess` equals this challenge's token.
    pub fn disclose(&self, guess: &str) -> String {
        let matches: bool = self.token.as_bytes().ct_eq(guess.as_bytes()).into();
        if matches {
            format!("Flag is {}", self.secret)
        } else {
            PLACEHOLDER.to_string()
        }
    }
}

impl fmt::Debug for SecretChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretChallenge")
            .field("token", &"<redacted>")
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> Arc<str> {
        Arc::from("FLAG{staging}")
    }

    #[test]
    fn test_disclose_with_own_token() {
        let challenge = SecretChallenge::issue(secret());
        let token = challenge.token.clone();
        assert_eq!(challenge.disclose(&token), "Flag is FLAG{staging}");
    }

    #[test]
    fn test_disclose_rejects_wrong_guess() {
        let challenge = SecretChallenge::issue(secret());
        assert_eq!(challenge.disclose(""), PLACEHOLDER);
        assert_eq!(challenge.disclose("AAAAAAAAAAAAAAAAAAAAAAAAAA"), PLACEHOLDER);
        assert_eq!(challenge.disclose("FLAG{staging}"), PLACEHOLDER);
    }

    #[test]
    fn test_disclose_rejects_other_request_token() {
        let first = SecretChallenge::issue(secret());
        let second = SecretChallenge::issue(secret());
        assert_ne!(first.token, second.token);
        assert_eq!(first.disclose(&second.token), PLACEHOLDER);
        assert_eq!(second.disclose(&first.token), PLACEHOLDER);
    }

    #[test]
    fn test_disclose_rejects_prefix() {
        let challenge = SecretChallenge::issue(secret());
        let prefix = challenge.token[..25].to_string();
        assert_eq!(challenge.disclose(&prefix), PLACEHOLDER);
    }

    #[test]
    fn test_debug_redacts() {
        let challenge = SecretChallenge::issue(secret());
        let debug = format!("{:?}", challenge);
        assert!(!debug.contains(&challenge.token));
        assert!(!debug.contains("staging"));
    }
}
