//! Evaluation context
//!
//! Everything the rules may observe about a proposed transaction. Built by
//! the orchestrator before scoring; immutable during evaluation.

use chrono::{DateTime, Utc};
use finledger_core::{AccountId, SubjectKey, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationContext {
    pub transaction_id: TransactionId,
    /// Account the funds move out of
    pub source_account: AccountId,
    pub amount: Decimal,
    pub currency: String,
    pub device_id: Option<String>,
    pub merchant_id: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl EvaluationContext {
    pub fn new(
        transaction_id: TransactionId,
        source_account: AccountId,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id,
            source_account,
            amount,
            currency: currency.into(),
            device_id: None,
            merchant_id: None,
            submitted_at: Utc::now(),
        }
    }

    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn with_merchant(mut self, merchant_id: impl Into<String>) -> Self {
        self.merchant_id = Some(merchant_id.into());
        self
    }

    /// Signal subjects involved in this transaction
    pub fn subjects(&self) -> Vec<SubjectKey> {
        let mut subjects = vec![SubjectKey::account(self.source_account.as_str())];
        if let Some(device) = &self.device_id {
            subjects.push(SubjectKey::device(device));
        }
        if let Some(merchant) = &self.merchant_id {
            subjects.push(SubjectKey::merchant(merchant));
        }
        subjects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finledger_core::SubjectKind;
    use rust_decimal_macros::dec;

    #[test]
    fn test_subjects_cover_present_dimensions() {
        let ctx = EvaluationContext::new(
            TransactionId::of("tx-1").unwrap(),
            "alice".into(),
            dec!(30),
            "USD",
        )
        .with_device("fp-19c3");

        let subjects = ctx.subjects();
        assert_eq!(subjects.len(), 2);
        assert_eq!(subjects[0].kind, SubjectKind::Account);
        assert_eq!(subjects[1].kind, SubjectKind::Device);
    }
}
