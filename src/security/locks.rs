// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Poison-tolerant access to the staging registry lock.
//!
//! A panic inside a sweep (say, in a sanitize thread) poisons the registry
//! `RwLock`. The maps stay structurally valid after such a panic: a sweep
//! only rewrites brace bytes in place and drains queues. So instead of
//! failing every later request, the guard is recovered and the event logged.

use std::sync::{LockResult, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared access, recovering the guard of a poisoned lock.
#[inline]
pub fn resilient_read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    recover(lock.read(), "LOCK_POISONED_READ")
}

/// Exclusive access, recovering the guard of a poisoned lock.
#[inline]
pub fn resilient_write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    recover(lock.write(), "LOCK_POISONED_WRITE")
}

fn recover<G>(result: LockResult<G>, event: &'static str) -> G {
    result.unwrap_or_else(|poisoned| {
        tracing::error!(
            target: "jj::locks",
            event = event,
            "registry lock poisoned by a panicked holder; continuing with its data"
        );
        poisoned.into_inner()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_after_panicked_writer() {
        let lock = RwLock::new(vec![b'{', b'}']);
        std::thread::scope(|s| {
            let result = s
                .spawn(|| {
                    let mut guard = lock.write().unwrap();
                    guard[0] = b' ';
                    panic!("sanitize worker died mid-sweep");
                })
                .join();
            assert!(result.is_err());
        });
        assert!(lock.is_poisoned());

        // Work done before the panic is kept
        assert_eq!(*resilient_read(&lock), vec![b' ', b'}']);
        resilient_write(&lock)[1] = b' ';
        assert_eq!(*resilient_read(&lock), vec![b' ', b' ']);
    }
}
