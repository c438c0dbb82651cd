//! Per-store exclusive locks.
//!
//! A [`LockRegistry`] maps store identities to locks. Locks are created the
//! first time a store is opened and live as long as the registry. Holding a
//! [`StoreGuard`] is holding the lock; dropping it releases the store and
//! wakes one waiter.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::ledger::LedgerError;

/// Exclusive lock on one store.
#[derive(Debug, Default)]
pub struct StoreLock {
    held: Mutex<bool>,
    released: Condvar,
}

impl StoreLock {
    fn release(&self) {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        *held = false;
        drop(held);
        self.released.notify_one();
    }
}

/// Proof that the holder owns a store. Releases the store on drop.
#[derive(Debug)]
pub struct StoreGuard {
    store: String,
    lock: Arc<StoreLock>,
}

impl StoreGuard {
    /// Identity of the locked store.
    #[must_use]
    pub fn store(&self) -> &str {
        &self.store
    }
}

impl Drop for StoreGuard {
    fn drop(&mut self) {
        self.lock.release();
        info!(store = %self.store, "Store lock released");
    }
}

/// Process-owned table of store locks.
///
/// Cloning shares the table.
#[derive(Debug, Clone, Default)]
pub struct LockRegistry {
    locks: Arc<DashMap<String, Arc<StoreLock>>>,
}

impl LockRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stores that have been locked at least once.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Returns true if no store has been locked yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// Returns true if `store` is currently locked.
    #[must_use]
    pub fn is_locked(&self, store: &str) -> bool {
        self.locks
            .get(store)
            .is_some_and(|lock| *lock.held.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Blocks until `store` is free, then locks it.
    #[must_use]
    pub fn acquire(&self, store: &str) -> StoreGuard {
        let lock = self.lock_for(store);
        {
            let held = lock.held.lock().unwrap_or_else(PoisonError::into_inner);
            let mut held = lock
                .released
                .wait_while(held, |held| *held)
                .unwrap_or_else(PoisonError::into_inner);
            *held = true;
        }
        info!(store, "Store lock acquired");
        StoreGuard {
            store: store.to_string(),
            lock,
        }
    }

    /// Locks `store` if it is free.
    ///
    /// # Errors
    ///
    /// Returns `LockUnavailable` if another session holds the store.
    pub fn try_acquire(&self, store: &str) -> Result<StoreGuard, LedgerError> {
        let lock = self.lock_for(store);
        {
            let mut held = lock.held.lock().unwrap_or_else(PoisonError::into_inner);
            if *held {
                warn!(store, "Store is locked by another session");
                return Err(LedgerError::LockUnavailable(store.to_string()));
            }
            *held = true;
        }
        info!(store, "Store lock acquired");
        Ok(StoreGuard {
            store: store.to_string(),
            lock,
        })
    }

    /// Waits at most `timeout` for `store` to be free, then locks it.
    ///
    /// # Errors
    ///
    /// Returns `LockTimeout` if the store is still held when the wait ends.
    pub fn acquire_timeout(&self, store: &str, timeout: Duration) -> Result<StoreGuard, LedgerError> {
        let lock = self.lock_for(store);
        let started = Instant::now();
        {
            let held = lock.held.lock().unwrap_or_else(PoisonError::into_inner);
            let (mut held, result) = lock
                .released
                .wait_timeout_while(held, timeout, |held| *held)
                .unwrap_or_else(PoisonError::into_inner);
            if result.timed_out() && *held {
                let waited = started.elapsed();
                warn!(store, ?waited, "Timed out waiting for store lock");
                return Err(LedgerError::LockTimeout {
                    store: store.to_string(),
                    waited,
                });
            }
            *held = true;
        }
        info!(store, "Store lock acquired");
        Ok(StoreGuard {
            store: store.to_string(),
            lock,
        })
    }

    fn lock_for(&self, store: &str) -> Arc<StoreLock> {
        if let Some(lock) = self.locks.get(store) {
            return Arc::clone(lock.value());
        }
        let lock = self.locks.entry(store.to_string()).or_default();
        debug!(store, "Created store lock");
        Arc::clone(lock.value())
    }
}
