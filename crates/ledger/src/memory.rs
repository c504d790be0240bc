//! In-memory ledger store
//!
//! Reference implementation of `LedgerStore` used in tests and as the
//! default backing for the posting engine. Keeps running balances alongside
//! the entry log so `read_balance` is O(1); reconciliation verifies the two
//! agree.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use finledger_core::{AccountId, TransactionId};
use rust_decimal::Decimal;

use crate::account::Account;
use crate::entry::{LedgerEntry, Transaction};
use crate::error::StorageError;
use crate::store::{LedgerStore, LedgerWrite};

#[derive(Default)]
struct StoreInner {
    accounts: HashMap<AccountId, Account>,
    /// Entry log per account, in sequence order
    entries: HashMap<AccountId, Vec<LedgerEntry>>,
    /// Running balance per account (credits minus debits)
    balances: HashMap<AccountId, Decimal>,
    transactions: HashMap<TransactionId, Transaction>,
}

/// In-memory `LedgerStore` with fault-injection knobs for tests
#[derive(Default)]
pub struct InMemoryLedgerStore {
    inner: Arc<Mutex<StoreInner>>,
    /// Fail this many upcoming commits with a retryable error
    fail_commits: Arc<AtomicU32>,
    /// Fail this many upcoming transaction saves with a retryable error
    fail_saves: Arc<AtomicU32>,
    /// Fail every operation with a retryable error
    unavailable: Arc<AtomicBool>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` commits fail with a retryable storage error
    pub fn fail_next_commits(&self, n: u32) {
        self.fail_commits.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` `save_transaction` calls fail with a retryable
    /// storage error
    pub fn fail_next_saves(&self, n: u32) {
        self.fail_saves.store(n, Ordering::SeqCst);
    }

    /// Toggle whole-store availability
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Overwrite a stored balance, bypassing the entry log.
    ///
    /// Test-only corruption knob for exercising reconciliation.
    pub fn corrupt_balance(&self, id: &AccountId, balance: Decimal) {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.balances.insert(id.clone(), balance);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("store offline".to_string()));
        }
        Ok(())
    }
}

struct InMemoryWrite {
    inner: Arc<Mutex<StoreInner>>,
    fail_commits: Arc<AtomicU32>,
    staged_entries: Vec<LedgerEntry>,
    staged_transaction: Option<Transaction>,
}

#[async_trait]
impl LedgerWrite for InMemoryWrite {
    fn append_entries(&mut self, entries: &[LedgerEntry]) {
        self.staged_entries.extend_from_slice(entries);
    }

    fn stage_transaction(&mut self, transaction: &Transaction) {
        self.staged_transaction = Some(transaction.clone());
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        // Injected failure happens before any state is touched, so a failed
        // commit leaves nothing behind.
        let pending = self.fail_commits.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_commits.store(pending - 1, Ordering::SeqCst);
            return Err(StorageError::Unavailable(
                "injected commit failure".to_string(),
            ));
        }

        let mut inner = self.inner.lock().expect("store lock poisoned");

        // Verify sequence continuity before mutating anything
        let mut expected: HashMap<AccountId, u64> = HashMap::new();
        for entry in &self.staged_entries {
            let head = *expected.entry(entry.account_id.clone()).or_insert_with(|| {
                inner
                    .entries
                    .get(&entry.account_id)
                    .and_then(|log| log.last())
                    .map(|e| e.sequence)
                    .unwrap_or(0)
            });
            if entry.sequence != head + 1 {
                return Err(StorageError::Conflict(format!(
                    "sequence gap on {}: expected {}, got {}",
                    entry.account_id,
                    head + 1,
                    entry.sequence
                )));
            }
            expected.insert(entry.account_id.clone(), entry.sequence);
        }

        for entry in self.staged_entries {
            let delta = entry.signed_amount();
            *inner
                .balances
                .entry(entry.account_id.clone())
                .or_insert(Decimal::ZERO) += delta;
            inner
                .entries
                .entry(entry.account_id.clone())
                .or_default()
                .push(entry);
        }

        if let Some(transaction) = self.staged_transaction {
            inner.transactions.insert(transaction.id.clone(), transaction);
        }

        Ok(())
    }

    fn rollback(self: Box<Self>) {
        // Nothing was applied; staged state is simply dropped
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerWrite>, StorageError> {
        self.check_available()?;
        Ok(Box::new(InMemoryWrite {
            inner: Arc::clone(&self.inner),
            fail_commits: Arc::clone(&self.fail_commits),
            staged_entries: Vec::new(),
            staged_transaction: None,
        }))
    }

    async fn account(&self, id: &AccountId) -> Result<Option<Account>, StorageError> {
        self.check_available()?;
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner.accounts.get(id).cloned())
    }

    async fn read_balance(&self, id: &AccountId) -> Result<Decimal, StorageError> {
        self.check_available()?;
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner.balances.get(id).copied().unwrap_or(Decimal::ZERO))
    }

    async fn entries(&self, id: &AccountId) -> Result<Vec<LedgerEntry>, StorageError> {
        self.check_available()?;
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner.entries.get(id).cloned().unwrap_or_default())
    }

    async fn head_sequence(&self, id: &AccountId) -> Result<u64, StorageError> {
        self.check_available()?;
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner
            .entries
            .get(id)
            .and_then(|log| log.last())
            .map(|e| e.sequence)
            .unwrap_or(0))
    }

    async fn find_transaction(
        &self,
        id: &TransactionId,
    ) -> Result<Option<Transaction>, StorageError> {
        self.check_available()?;
        let inner = self.inner.lock().expect("store lock poisoned");
        Ok(inner.transactions.get(id).cloned())
    }

    async fn save_transaction(&self, transaction: &Transaction) -> Result<(), StorageError> {
        self.check_available()?;
        let pending = self.fail_saves.load(Ordering::SeqCst);
        if pending > 0 {
            self.fail_saves.store(pending - 1, Ordering::SeqCst);
            return Err(StorageError::Unavailable(
                "injected save failure".to_string(),
            ));
        }
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner
            .transactions
            .insert(transaction.id.clone(), transaction.clone());
        Ok(())
    }

    async fn account_ids(&self) -> Result<Vec<AccountId>, StorageError> {
        self.check_available()?;
        let inner = self.inner.lock().expect("store lock poisoned");
        let mut ids: Vec<AccountId> = inner.accounts.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn create_account(&self, account: Account) -> Result<(), StorageError> {
        self.check_available()?;
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.accounts.insert(account.id.clone(), account);
        Ok(())
    }
}
