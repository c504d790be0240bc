//! FinLedger Core - Shared domain types
//!
//! This crate contains the fundamental types used across FinLedger:
//! - `Amount`: Non-negative decimal wrapper for monetary amounts
//! - `Currency`: Type-safe currency codes
//! - `AccountId`, `TransactionId`: identifiers (the transaction id doubles
//!   as the idempotency key)
//! - `SubjectKey`: fraud-signal subject addressing (account/device/merchant)
//! - `RiskDecision`: the immutable outcome of a fraud evaluation

pub mod amount;
pub mod currency;
pub mod decision;
pub mod ids;

pub use amount::{Amount, AmountError};
pub use currency::{Currency, CurrencyError};
pub use decision::{Decision, RiskDecision};
pub use ids::{AccountId, IdError, SubjectKey, SubjectKind, TransactionId};
