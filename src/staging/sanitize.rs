// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Brace stripping for pending items.
//!
//! Merged values end up inside page text, so `{` and `}` are replaced with
//! spaces before anything is merged. Those two bytes are the only ones
//! touched; length is preserved.

const OPEN_BRACE: u8 = b'{';
const CLOSE_BRACE: u8 = b'}';
const SPACE: u8 = b' ';

/// Replace every `{` and `}` in `bytes` with a space, in place.
#[inline]
pub fn sanitize_in_place(bytes: &mut [u8]) {
    for b in bytes.iter_mut() {
        if *b == OPEN_BRACE || *b == CLOSE_BRACE {
            *b = SPACE;
        }
    }
}

/// Owned variant of [`sanitize_in_place`].
pub fn sanitize(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    sanitize_in_place(&mut out);
    out
}
