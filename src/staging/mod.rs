// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Session-scoped staging store.
//!
//! Clients submit raw key/value pairs into a per-session pending queue. A
//! periodic sweep sanitizes every pending item and merges it into the
//! session's visible store, then clears the queue.
//!
//! ## Locking
//!
//! The whole registry (queues and stores of every session) sits behind one
//! `RwLock`:
//!
//! - writers: session creation, submission, the sweep
//! - readers: existence checks, store snapshots
//!
//! A sweep holds the write lock from start to finish, including the join of
//! its parallel sanitize phase. Readers therefore never see a queue that is
//! half sanitized or a store that is half merged.
//!
//! ## Example
//!
//! ```
//! use jj::staging::{PendingItem, StagingStore};
//!
//! let store = StagingStore::new(2);
//! let id = store.create_session();
//! store.submit(&id, PendingItem::new("a{1}", "v{2}")).unwrap();
//! store.sweep();
//! assert_eq!(
//!     store.snapshot(&id).unwrap(),
//!     vec![("a 1 ".to_string(), "v 2 ".to_string())]
//! );
//! ```

pub mod sanitize;
pub mod worker;

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Instant;

use indexmap::IndexMap;

use crate::error::StagingError;
use crate::security::locks::{resilient_read, resilient_write};
use crate::token;
use crate::utils::mask_session_id;

pub use worker::{SweepHandle, SweepWorker};

/// Opaque per-visitor identifier, also the session cookie value.
pub type SessionId = String;

/// Visible key/value map of one session. Iteration follows first insertion.
pub type SessionStore = IndexMap<String, String>;

/// A raw submission waiting for the next sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingItem {
    /// Key candidate.
    pub key: Vec<u8>,
    /// Value candidate.
    pub value: Vec<u8>,
}

impl PendingItem {
    pub fn new(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Strip braces from both halves in place.
    pub fn sanitize(&mut self) {
        sanitize::sanitize_in_place(&mut self.value);
        sanitize::sanitize_in_place(&mut self.key);
    }
}

/// Outcome of one sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Sessions that had at least one pending item.
    pub sessions: usize,
    /// Items passed through the sanitizer.
    pub sanitized: usize,
    /// Items written into a session store.
    pub merged: usize,
    /// Items discarded because their session has no store.
    pub dropped: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.sanitized == 0
    }
}

#[derive(Debug, Default)]
struct Registry {
    pending: HashMap<SessionId, Vec<PendingItem>>,
    stores: HashMap<SessionId, SessionStore>,
}

/// Registry of sessions with their pending queues and visible stores.
///
/// Constructed once at start-up and shared by handle (`Arc`) between the
/// HTTP layer and the sweep worker.
#[derive(Debug)]
pub struct StagingStore {
    registry: RwLock<Registry>,
    sanitize_workers: usize,
}

impl Default for StagingStore {
    fn default() -> Self {
        Self::new(1)
    }
}

impl StagingStore {
    /// Create an empty store. `sanitize_workers` bounds the number of threads
    /// used by the sanitize phase of a sweep (at least one).
    pub fn new(sanitize_workers: usize) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            sanitize_workers: sanitize_workers.max(1),
        }
    }

    /// Allocate a new session with an empty queue and an empty store.
    pub fn create_session(&self) -> SessionId {
        let mut registry = resilient_write(&self.registry);

        let mut id = token::generate();
        while registry.stores.contains_key(&id) {
            id = token::generate();
        }

        registry.pending.insert(id.clone(), Vec::new());
        registry.stores.insert(id.clone(), SessionStore::new());

        tracing::info!(
            "SESSION_CREATED | session={} sessions={}",
            mask_session_id(&id),
            registry.stores.len()
        );
        id
    }

    /// Whether `session_id` is a live session.
    pub fn contains(&self, session_id: &str) -> bool {
        resilient_read(&self.registry).stores.contains_key(session_id)
    }

    pub fn session_count(&self) -> usize {
        resilient_read(&self.registry).stores.len()
    }

    /// Queue a raw pair for the next sweep.
    ///
    /// The request gate guarantees the session exists; an unknown session
    /// here is a caller bug and is reported as [`StagingError::UnknownSession`].
    pub fn submit(&self, session_id: &str, item: PendingItem) -> Result<(), StagingError> {
        let mut registry = resilient_write(&self.registry);
        if !registry.stores.contains_key(session_id) {
            return Err(StagingError::UnknownSession(session_id.to_string()));
        }

        let queue = registry.pending.entry(session_id.to_string()).or_default();
        queue.push(item);
        tracing::debug!(
            "ITEM_QUEUED | session={} pending={}",
            mask_session_id(session_id),
            queue.len()
        );
        Ok(())
    }

    /// Number of items waiting for the next sweep.
    pub fn pending_len(&self, session_id: &str) -> Option<usize> {
        let registry = resilient_read(&self.registry);
        if !registry.stores.contains_key(session_id) {
            return None;
        }
        Some(registry.pending.get(session_id).map_or(0, Vec::len))
    }

    /// Copy of a session's visible store as ordered `(key, value)` rows.
    pub fn snapshot(&self, session_id: &str) -> Option<Vec<(String, String)>> {
        let registry = resilient_read(&self.registry);
        registry.stores.get(session_id).map(|store| {
            store
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
    }

    /// Run one sweep: sanitize every pending item of every session in
    /// parallel, then merge them into their stores and clear the queues.
    pub fn sweep(&self) -> SweepReport {
        let started = Instant::now();
        let mut registry = resilient_write(&self.registry);
        let Registry { pending, stores } = &mut *registry;

        let batch: Vec<&mut PendingItem> = pending.values_mut().flatten().collect();
        let sanitized = sanitize_batch(batch, self.sanitize_workers);

        let mut report = SweepReport {
            sanitized,
            ..SweepReport::default()
        };

        for (id, queue) in pending.iter_mut() {
            if queue.is_empty() {
                continue;
            }
            report.sessions += 1;

            match stores.get_mut(id) {
                Some(store) => {
                    for item in queue.drain(..) {
                        store.insert(
                            String::from_utf8_lossy(&item.key).into_owned(),
                            String::from_utf8_lossy(&item.value).into_owned(),
                        );
                        report.merged += 1;
                    }
                }
                None => {
                    tracing::warn!(
                        "PENDING_DROPPED | session={} items={} reason=no_store",
                        mask_session_id(id),
                        queue.len()
                    );
                    report.dropped += queue.len();
                    queue.clear();
                }
            }
        }

        if !report.is_empty() {
            tracing::debug!(
                "SWEEP_COMPLETE | sessions={} sanitized={} merged={} dropped={} elapsed_us={}",
                report.sessions,
                report.sanitized,
                report.merged,
                report.dropped,
                started.elapsed().as_micros()
            );
        }
        report
    }
}

/// Sanitize `items` on at most `workers` threads and wait for all of them.
fn sanitize_batch(mut items: Vec<&mut PendingItem>, workers: usize) -> usize {
    let total = items.len();
    if total == 0 {
        return 0;
    }

    let workers = workers.clamp(1, total);
    if workers == 1 {
        items.iter_mut().for_each(|item| item.sanitize());
        return total;
    }

    let chunk_size = total.div_ceil(workers);
    std::thread::scope(|scope| {
        for chunk in items.chunks_mut(chunk_size) {
            scope.spawn(move || chunk.iter_mut().for_each(|item| item.sanitize()));
        }
    });
    total
}
