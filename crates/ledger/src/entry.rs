//! Ledger entries and transactions
//!
//! A `LedgerEntry` is the atomic unit of financial state change: one
//! debit or credit against one account, immutable once created, carrying a
//! per-account monotonically increasing sequence number. A `Transaction`
//! groups entries that balance to zero per currency.

use chrono::{DateTime, Utc};
use finledger_core::{AccountId, Amount, Currency, RiskDecision, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Debit or Credit
///
/// Accounts are modeled as user wallets (liabilities from the ledger's
/// perspective): credit increases the balance, debit decreases it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Debit,
    Credit,
}

impl Side {
    /// Sign applied to the amount magnitude: credit = +1, debit = -1
    pub fn sign(&self) -> Decimal {
        match self {
            Side::Credit => Decimal::ONE,
            Side::Debit => Decimal::NEGATIVE_ONE,
        }
    }
}

/// A single immutable debit/credit against one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub account_id: AccountId,
    pub side: Side,
    pub amount: Amount,
    pub currency: Currency,
    /// Monotonically increasing per account; 0 until posted
    pub sequence: u64,
}

impl LedgerEntry {
    pub fn new(account_id: AccountId, side: Side, amount: Amount, currency: Currency) -> Self {
        Self {
            account_id,
            side,
            amount,
            currency,
            sequence: 0,
        }
    }

    pub fn debit(account_id: AccountId, amount: Amount, currency: Currency) -> Self {
        Self::new(account_id, Side::Debit, amount, currency)
    }

    pub fn credit(account_id: AccountId, amount: Amount, currency: Currency) -> Self {
        Self::new(account_id, Side::Credit, amount, currency)
    }

    /// Signed view of the amount: credit positive, debit negative
    pub fn signed_amount(&self) -> Decimal {
        self.side.sign() * self.amount.value()
    }
}

/// Transaction lifecycle status
///
/// `Posted` and `Rejected` are terminal. `Held` awaits external
/// adjudication, which may later post or reject it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Scored,
    Posted,
    Held,
    Rejected,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Posted | TransactionStatus::Rejected)
    }

    /// Exhaustive legal-transition table
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        use TransactionStatus::*;
        match (self, next) {
            (Pending, Scored) => true,
            (Scored, Posted) | (Scored, Held) | (Scored, Rejected) => true,
            // External adjudication resolves held transactions
            (Held, Posted) | (Held, Rejected) => true,
            _ => false,
        }
    }
}

/// A balanced set of entries keyed by an idempotency id.
///
/// Created once, status-transitioned by the posting engine, never deleted:
/// rejected and held transactions are retained for audit with their
/// `RiskDecision` attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub description: String,
    pub entries: Vec<LedgerEntry>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    /// Fraud evaluation outcome, attached for audit
    pub decision: Option<RiskDecision>,
}

impl Transaction {
    pub fn new(id: TransactionId, description: impl Into<String>, entries: Vec<LedgerEntry>) -> Self {
        Self {
            id,
            description: description.into(),
            entries,
            status: TransactionStatus::Pending,
            created_at: Utc::now(),
            decision: None,
        }
    }

    /// Accounts touched by this transaction, deduplicated
    pub fn account_ids(&self) -> Vec<AccountId> {
        let mut ids: Vec<AccountId> = self.entries.iter().map(|e| e.account_id.clone()).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// True if the other entry set is the same ignoring sequence numbers.
    ///
    /// Used by the idempotency check: a resubmission is identical when the
    /// accounts, sides, amounts, and currencies all match in order.
    pub fn same_entries(&self, other: &[LedgerEntry]) -> bool {
        self.entries.len() == other.len()
            && self.entries.iter().zip(other.iter()).all(|(a, b)| {
                a.account_id == b.account_id
                    && a.side == b.side
                    && a.amount == b.amount
                    && a.currency == b.currency
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn amount(value: Decimal) -> Amount {
        Amount::new(value).unwrap()
    }

    #[test]
    fn test_signed_amount() {
        let debit = LedgerEntry::debit("a".into(), amount(dec!(30)), Currency::Usd);
        let credit = LedgerEntry::credit("b".into(), amount(dec!(30)), Currency::Usd);
        assert_eq!(debit.signed_amount(), dec!(-30));
        assert_eq!(credit.signed_amount(), dec!(30));
    }

    #[test]
    fn test_status_transitions() {
        use TransactionStatus::*;
        assert!(Pending.can_transition_to(Scored));
        assert!(Scored.can_transition_to(Posted));
        assert!(Scored.can_transition_to(Held));
        assert!(Scored.can_transition_to(Rejected));
        assert!(Held.can_transition_to(Rejected));
        assert!(!Posted.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Posted));
        assert!(!Pending.can_transition_to(Posted));
    }

    #[test]
    fn test_terminal_states() {
        assert!(TransactionStatus::Posted.is_terminal());
        assert!(TransactionStatus::Rejected.is_terminal());
        assert!(!TransactionStatus::Held.is_terminal());
        assert!(!TransactionStatus::Pending.is_terminal());
    }

    #[test]
    fn test_account_ids_deduplicated() {
        let tx = Transaction::new(
            TransactionId::of("tx-1").unwrap(),
            "transfer",
            vec![
                LedgerEntry::debit("a".into(), amount(dec!(10)), Currency::Usd),
                LedgerEntry::credit("b".into(), amount(dec!(5)), Currency::Usd),
                LedgerEntry::credit("a".into(), amount(dec!(5)), Currency::Usd),
            ],
        );
        assert_eq!(tx.account_ids(), vec!["a".into(), "b".into()]);
    }

    #[test]
    fn test_same_entries_ignores_sequence() {
        let entries = vec![
            LedgerEntry::debit("a".into(), amount(dec!(30)), Currency::Usd),
            LedgerEntry::credit("b".into(), amount(dec!(30)), Currency::Usd),
        ];
        let mut tx = Transaction::new(TransactionId::of("tx-1").unwrap(), "t", entries.clone());
        for (i, entry) in tx.entries.iter_mut().enumerate() {
            entry.sequence = (i + 1) as u64;
        }
        assert!(tx.same_entries(&entries));

        let different = vec![
            LedgerEntry::debit("a".into(), amount(dec!(31)), Currency::Usd),
            LedgerEntry::credit("b".into(), amount(dec!(31)), Currency::Usd),
        ];
        assert!(!tx.same_entries(&different));
    }
}
