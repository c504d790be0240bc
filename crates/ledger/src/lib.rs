//! FinLedger Ledger - Double-entry posting core
//!
//! All financial state changes go through this crate. The ledger store is
//! the single mutable source of truth; balances are derived from entries
//! and reconciled, never trusted as free-standing state.
//!
//! # Key Types
//! - `Account` / `AccountStatus`: currency-typed accounts
//! - `LedgerEntry` / `Side`: atomic debit/credit with a per-account sequence
//! - `Transaction` / `TransactionStatus`: balanced entry set keyed by an
//!   idempotency id
//! - `LedgerStore`: durable storage seam (atomic multi-account writes)
//! - `PostingEngine`: validates and atomically commits transactions

pub mod account;
pub mod config;
pub mod entry;
pub mod error;
pub mod limits;
pub mod locks;
pub mod memory;
pub mod posting;
pub mod store;
pub mod validation;

pub use account::{Account, AccountStatus};
pub use config::PostingConfig;
pub use entry::{LedgerEntry, Side, Transaction, TransactionStatus};
pub use error::{LedgerError, StorageError};
pub use limits::DailyLimits;
pub use locks::AccountLockTable;
pub use memory::InMemoryLedgerStore;
pub use posting::{Leg, PostingEngine, PostingRequest};
pub use store::{LedgerStore, LedgerWrite};
