// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Security primitives shared by the staging store and the request gate.
//!
//! - [`locks`]: poison-tolerant access to the global registry lock
//! - [`challenge`]: per-request secret challenge gating the privileged value

pub mod challenge;
pub mod locks;

pub use challenge::{SecretChallenge, PLACEHOLDER};
pub use locks::{resilient_read, resilient_write};
