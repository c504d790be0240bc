//! Ledger store seam
//!
//! The store is the single mutable source of truth. It must support atomic
//! multi-account writes: a committed write makes all staged entries visible
//! together, or none at all.

use async_trait::async_trait;
use finledger_core::{AccountId, TransactionId};
use rust_decimal::Decimal;

use crate::account::Account;
use crate::entry::{LedgerEntry, Transaction};
use crate::error::StorageError;

/// A transactional write in progress.
///
/// Staged state is invisible until `commit` succeeds. Dropping a write
/// without committing discards it.
#[async_trait]
pub trait LedgerWrite: Send {
    /// Stage entries for append. Sequence numbers must already be assigned
    /// and strictly increasing per account.
    fn append_entries(&mut self, entries: &[LedgerEntry]);

    /// Stage the transaction record itself
    fn stage_transaction(&mut self, transaction: &Transaction);

    /// Atomically commit everything staged
    async fn commit(self: Box<Self>) -> Result<(), StorageError>;

    /// Discard everything staged
    fn rollback(self: Box<Self>);
}

/// Durable ledger storage
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Begin a transactional write
    async fn begin(&self) -> Result<Box<dyn LedgerWrite>, StorageError>;

    /// Look up an account
    async fn account(&self, id: &AccountId) -> Result<Option<Account>, StorageError>;

    /// Current balance (credits minus debits over all posted entries)
    async fn read_balance(&self, id: &AccountId) -> Result<Decimal, StorageError>;

    /// Posted entries for one account, in sequence order
    async fn entries(&self, id: &AccountId) -> Result<Vec<LedgerEntry>, StorageError>;

    /// Highest sequence number assigned on an account (0 if none)
    async fn head_sequence(&self, id: &AccountId) -> Result<u64, StorageError>;

    /// Find a transaction by id, posted or recorded
    async fn find_transaction(
        &self,
        id: &TransactionId,
    ) -> Result<Option<Transaction>, StorageError>;

    /// Record a transaction without posting entries (held/rejected audit
    /// records)
    async fn save_transaction(&self, transaction: &Transaction) -> Result<(), StorageError>;

    /// All known account ids (reconciliation sweep)
    async fn account_ids(&self) -> Result<Vec<AccountId>, StorageError>;

    /// Create an account
    async fn create_account(&self, account: Account) -> Result<(), StorageError>;
}
