// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Token generator for session IDs and per-request challenge tokens.
//!
//! Tokens are 26 characters drawn from the base32 alphabet `A-Z2-7`. Every
//! character comes from one byte of the OS random source; 256 is a multiple
//! of 32, so `byte % 32` keeps the draw uniform.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::StagingError;

/// Token length in characters.
pub const TOKEN_LEN: usize = 26;

/// The 32-symbol token alphabet.
pub const TOKEN_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Generate a token, reporting a failing random source as an error.
pub fn try_generate() -> Result<String, StagingError> {
    let mut bytes = [0u8; TOKEN_LEN];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| StagingError::RandomSource(e.to_string()))?;
    Ok(encode(&bytes))
}

/// Generate a token.
///
/// # Panics
///
/// Panics if the OS random source fails. Tokens double as session identity
/// and as access-control secrets, so a weak or empty token is never returned.
pub fn generate() -> String {
    let mut bytes = [0u8; TOKEN_LEN];
    OsRng.fill_bytes(&mut bytes);
    encode(&bytes)
}

fn encode(bytes: &[u8; TOKEN_LEN]) -> String {
    bytes
        .iter()
        .map(|b| TOKEN_ALPHABET[(*b % 32) as usize] as char)
        .collect()
}

/// Returns true if `candidate` has the shape of a generated token.
pub fn is_well_formed(candidate: &str) -> bool {
    candidate.len() == TOKEN_LEN && candidate.bytes().all(|b| TOKEN_ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_length_and_alphabet() {
        for _ in 0..100 {
            let token = generate();
            assert_eq!(token.len(), TOKEN_LEN);
            assert!(is_well_formed(&token), "bad token: {token}");
        }
    }

    #[test]
    fn test_try_generate() {
        let token = try_generate().unwrap();
        assert!(is_well_formed(&token));
    }

    #[test]
    fn test_tokens_are_distinct() {
        let tokens: HashSet<String> = (0..1000).map(|_| generate()).collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_encode_maps_bytes_mod_32() {
        let mut bytes = [0u8; TOKEN_LEN];
        bytes[0] = 0;
        bytes[1] = 25;
        bytes[2] = 26;
        bytes[3] = 31;
        bytes[4] = 32;
        bytes[5] = 255;
        let token = encode(&bytes);
        assert_eq!(&token[..6], "AZ27A7");
    }

    #[test]
    fn test_is_well_formed_rejects() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("abcdefghijklmnopqrstuvwxyz"));
        assert!(!is_well_formed("AAAAAAAAAAAAAAAAAAAAAAAAA1"));
        assert!(!is_well_formed("AAAAAAAAAAAAAAAAAAAAAAAAAAA"));
    }
}
