// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Periodic sweep worker.
//!
//! Runs [`StagingStore::sweep`] on a fixed tick until told to stop. The
//! sweep itself blocks (it holds the registry's write lock and fans out over
//! scoped threads), so each tick runs it on the blocking pool.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::StagingStore;

/// Default sweep period.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(100);

/// Background task that sweeps a [`StagingStore`] on a fixed interval.
#[derive(Debug)]
pub struct SweepWorker {
    store: Arc<StagingStore>,
    interval: Duration,
}

impl SweepWorker {
    pub fn new(store: Arc<StagingStore>) -> Self {
        Self {
            store,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    /// Set the sweep period. Zero is bumped to one millisecond.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Start the worker on the current tokio runtime.
    ///
    /// The worker stops when [`SweepHandle::shutdown`] is called or the
    /// handle is dropped.
    pub fn spawn(self) -> SweepHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let sweeps = Arc::new(AtomicU64::new(0));
        let task = tokio::spawn(self.run(shutdown_rx, Arc::clone(&sweeps)));

        SweepHandle {
            shutdown: Some(shutdown_tx),
            task,
            sweeps,
        }
    }

    async fn run(self, mut shutdown: oneshot::Receiver<()>, sweeps: Arc<AtomicU64>) {
        tracing::info!(
            "SWEEP_WORKER_STARTED | interval_ms={}",
            self.interval.as_millis()
        );

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    let store = Arc::clone(&self.store);
                    match tokio::task::spawn_blocking(move || store.sweep()).await {
                        Ok(_) => {
                            sweeps.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => {
                            tracing::error!("SWEEP_FAILED | error={}", e);
                        }
                    }
                }
            }
        }

        tracing::info!(
            "SWEEP_WORKER_STOPPED | sweeps={}",
            sweeps.load(Ordering::Relaxed)
        );
    }
}

/// Handle to a running [`SweepWorker`].
#[derive(Debug)]
pub struct SweepHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    sweeps: Arc<AtomicU64>,
}

impl SweepHandle {
    /// Number of sweeps completed so far.
    pub fn sweeps(&self) -> u64 {
        self.sweeps.load(Ordering::Relaxed)
    }

    /// Stop the worker and wait for it to exit. A sweep already in progress
    /// runs to completion first.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::error!("SWEEP_WORKER_JOIN_FAILED | error={}", e);
        }
    }
}
