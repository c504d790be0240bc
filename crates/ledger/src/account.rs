//! Ledger accounts
//!
//! An account's balance is derived from its posted entries. The store keeps
//! a running balance for fast reads, but entries remain the source of truth
//! and reconciliation verifies the two agree.

use chrono::{DateTime, Utc};
use finledger_core::{AccountId, Currency};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Lifecycle status of an account
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// Accepts postings
    Active,
    /// Temporarily blocked; postings rejected
    Frozen,
    /// Permanently closed; postings rejected
    Closed,
}

/// A ledger account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub currency: Currency,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(id: AccountId, currency: Currency) -> Self {
        Self {
            id,
            currency,
            status: AccountStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}
