//! Orchestrator errors

use finledger_core::TransactionId;
use finledger_ledger::LedgerError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestratorError {
    /// Malformed request, rejected before scoring; never retried
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Posting refused by the ledger (frozen account, insufficient funds, ...)
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Storage stayed unavailable through every retry. Nothing was
    /// committed; the same id may be resubmitted.
    #[error("Posting failed after {attempts} attempts; resubmission is safe")]
    RetryableFailure { attempts: u32 },

    /// Cancelled before posting began
    #[error("Transaction {0} was cancelled")]
    Cancelled(TransactionId),
}
