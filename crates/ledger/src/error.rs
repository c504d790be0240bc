//! Ledger errors

use finledger_core::{AccountId, TransactionId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors from validation and posting
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Transaction must have between {min} and {max} entries, got {actual}")]
    InvalidEntryCount { min: usize, max: usize, actual: usize },

    #[error("Entry amount must be positive and at most {max}: {amount}")]
    AmountOutOfRange { amount: Decimal, max: Decimal },

    #[error("Invalid description: {0}")]
    InvalidDescription(String),

    #[error("Entries unbalanced for currency {currency}: imbalance {imbalance}")]
    ImbalancedEntries { currency: String, imbalance: Decimal },

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Account is frozen: {0}")]
    AccountFrozen(AccountId),

    #[error("Account is closed: {0}")]
    AccountClosed(AccountId),

    #[error("Currency mismatch on {account}: account holds {expected}, entry uses {actual}")]
    CurrencyMismatch {
        account: AccountId,
        expected: String,
        actual: String,
    },

    #[error("Insufficient funds on {account}: balance would be {projected}")]
    InsufficientFunds {
        account: AccountId,
        projected: Decimal,
    },

    #[error("Transaction {0} already posted with different entries")]
    DuplicateTransaction(TransactionId),

    #[error("Daily transaction limit exceeded for {initiator}: {kind} limit {limit}")]
    LimitExceeded {
        initiator: String,
        kind: &'static str,
        limit: String,
    },

    #[error("Posting halted: reconciliation mismatch on {account}: stored {stored}, computed {computed}")]
    ReconciliationMismatch {
        account: AccountId,
        stored: Decimal,
        computed: Decimal,
    },

    #[error("Posting is halted pending reconciliation review")]
    SystemHalted,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl LedgerError {
    /// Validation errors are rejected synchronously and never retried
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidEntryCount { .. }
                | LedgerError::AmountOutOfRange { .. }
                | LedgerError::InvalidDescription(_)
                | LedgerError::ImbalancedEntries { .. }
        )
    }
}

/// Errors from the durable store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Stored state is corrupt: {0}")]
    Corrupt(String),
}

impl StorageError {
    /// Whether a retry with backoff may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Unavailable(_) | StorageError::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        let err = LedgerError::ImbalancedEntries {
            currency: "USD".into(),
            imbalance: Decimal::ONE,
        };
        assert!(err.is_validation());

        let err = LedgerError::AccountNotFound("a".into());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_storage_retryability() {
        assert!(StorageError::Unavailable("down".into()).is_retryable());
        assert!(StorageError::Conflict("seq".into()).is_retryable());
        assert!(!StorageError::Corrupt("bad".into()).is_retryable());
    }
}
