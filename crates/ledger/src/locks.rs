//! Per-account lock table
//!
//! Single-writer discipline per account instead of a global lock:
//! transactions touching disjoint accounts proceed fully in parallel,
//! transactions sharing an account serialize on that account only.
//!
//! Locks are always acquired in sorted account order, so two transactions
//! over overlapping account sets cannot deadlock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use finledger_core::AccountId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Guards held for the duration of one posting; released on drop
pub struct AccountLocks {
    _guards: Vec<OwnedMutexGuard<()>>,
}

/// Lazily populated map of per-account async mutexes
#[derive(Default)]
pub struct AccountLockTable {
    locks: Mutex<HashMap<AccountId, Arc<AsyncMutex<()>>>>,
}

impl AccountLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, id: &AccountId) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().expect("lock table poisoned");
        Arc::clone(locks.entry(id.clone()).or_default())
    }

    /// Acquire locks for all given accounts, in sorted deduplicated order.
    ///
    /// The returned guard set is released when dropped, on every exit path.
    pub async fn lock_accounts(&self, ids: &[AccountId]) -> AccountLocks {
        let mut sorted: Vec<AccountId> = ids.to_vec();
        sorted.sort();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for id in sorted {
            let lock = self.lock_for(&id);
            guards.push(lock.lock_owned().await);
        }

        AccountLocks { _guards: guards }
    }
}
