// Copyright (c) 2024-2025 Jesse Morgan
// Licensed under the MIT License. See LICENSE file for details.

//! jj - session-scoped key/value staging service
//!
//! Clients submit key/value pairs over HTTP. Pairs wait in a per-session
//! queue until a background sweep strips `{`/`}` from them and merges them
//! into the session's visible store, which is then rendered back to the
//! same client.
//!
//! **Submit** -> **Pending queue** -> **Sweep (sanitize, merge)** -> **Store** -> **Render**
//!
//! # Core Modules
//!
//! - [`staging`] - Session registry, pending queues, stores and the sweep
//! - [`token`] - Base32 token generator for session IDs and challenges
//! - [`security`] - Secret challenge and poison-tolerant lock helpers
//! - [`server`] - HTTP surface, request gate, cookies and pages
//! - [`config`] - Service configuration
//! - [`error`] - Error taxonomy

pub mod config;
pub mod error;
pub mod security;
pub mod server;
pub mod staging;
pub mod token;
pub mod utils;

pub use config::ServiceConfig;
pub use error::StagingError;
pub use security::{SecretChallenge, PLACEHOLDER};
pub use server::{RequestContext, Server};
pub use staging::{
    PendingItem, SessionId, SessionStore, StagingStore, SweepHandle, SweepReport, SweepWorker,
};
pub use utils::mask_sensitive;
