//! Submission outcomes

use finledger_core::RiskDecision;
use finledger_ledger::Transaction;

/// The single terminal answer every successful submission resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutcome {
    /// Committed to the ledger
    Posted(Transaction),
    /// Parked for manual adjudication, decision attached
    Held(RiskDecision),
    /// Refused, decision attached; never posted
    Rejected(RiskDecision),
}

impl TransactionOutcome {
    pub fn is_posted(&self) -> bool {
        matches!(self, TransactionOutcome::Posted(_))
    }

    pub fn is_held(&self) -> bool {
        matches!(self, TransactionOutcome::Held(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, TransactionOutcome::Rejected(_))
    }
}
