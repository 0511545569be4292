//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Small shared helpers: lock recovery, shutdown signalling, id suffixes.

use rand::Rng;
use rand::distributions::Alphanumeric;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

/// Locks a mutex, recovering the guard if a panicking holder poisoned it.
/// The guarded structures stay internally consistent because every critical
/// section is a plain field update.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One-shot shutdown signal shared by every task the manager spawns.
#[derive(Debug, Default)]
pub(crate) struct Shutdown {
    stopped: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    pub(crate) fn new() -> Shutdown {
        Shutdown::default()
    }

    /// Signals shutdown to every current and future waiter.
    pub(crate) fn trigger(&self) {
        self.stopped.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    pub(crate) fn is_triggered(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Completes once shutdown has been triggered.
    pub(crate) async fn wait(&self) {
        while !self.is_triggered() {
            let notified = self.notify.notified();
            // The flag may have flipped between the check and registering.
            if self.is_triggered() {
                break;
            }
            notified.await;
        }
    }
}

/// A random alphanumeric suffix for connection ids.
pub(crate) fn random_suffix(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_has_requested_length() {
        assert_eq!(random_suffix(10).len(), 10);
        assert_eq!(random_suffix(0).len(), 0);
    }

    #[test]
    fn suffix_is_alphanumeric() {
        assert!(random_suffix(64).chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[tokio::test]
    async fn shutdown_wakes_waiters() {
        let shutdown = std::sync::Arc::new(Shutdown::new());
        let waiter = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { shutdown.wait().await })
        };
        shutdown.trigger();
        waiter.await.expect("waiter completes");
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn wait_after_trigger_returns_immediately() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.wait().await;
    }
}
