//! Inbound transaction requests

use finledger_core::{AccountId, Amount, Currency, TransactionId};
use finledger_fraud::EvaluationContext;
use finledger_ledger::{Leg, PostingRequest, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::OrchestratorError;

/// One requested debit or credit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegRequest {
    pub account_id: AccountId,
    pub side: Side,
    pub amount: Decimal,
    pub currency: Currency,
}

impl LegRequest {
    pub fn debit(account_id: AccountId, amount: Decimal, currency: Currency) -> Self {
        Self {
            account_id,
            side: Side::Debit,
            amount,
            currency,
        }
    }

    pub fn credit(account_id: AccountId, amount: Decimal, currency: Currency) -> Self {
        Self {
            account_id,
            side: Side::Credit,
            amount,
            currency,
        }
    }
}

/// A caller-facing transaction submission.
///
/// The id doubles as the idempotency key: resubmitting a completed id
/// returns the recorded outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub id: TransactionId,
    pub description: String,
    pub legs: Vec<LegRequest>,
    pub initiator: Option<String>,
    pub device_id: Option<String>,
    pub merchant_id: Option<String>,
}

impl TransactionRequest {
    pub fn new(id: TransactionId, description: impl Into<String>, legs: Vec<LegRequest>) -> Self {
        Self {
            id,
            description: description.into(),
            legs,
            initiator: None,
            device_id: None,
            merchant_id: None,
        }
    }

    /// Two-leg transfer between same-currency accounts
    pub fn transfer(
        id: TransactionId,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        currency: Currency,
    ) -> Self {
        Self::new(
            id,
            format!("transfer {from} -> {to}"),
            vec![
                LegRequest::debit(from, amount, currency.clone()),
                LegRequest::credit(to, amount, currency),
            ],
        )
    }

    pub fn with_initiator(mut self, initiator: impl Into<String>) -> Self {
        self.initiator = Some(initiator.into());
        self
    }

    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn with_merchant(mut self, merchant_id: impl Into<String>) -> Self {
        self.merchant_id = Some(merchant_id.into());
        self
    }

    /// Convert into the posting engine's request shape.
    ///
    /// Fails on negative amounts; all further validation happens in the
    /// posting engine.
    pub fn posting_request(&self) -> Result<PostingRequest, OrchestratorError> {
        let mut legs = Vec::with_capacity(self.legs.len());
        for leg in &self.legs {
            let amount = Amount::new(leg.amount)
                .map_err(|err| OrchestratorError::Validation(err.to_string()))?;
            legs.push(Leg {
                account_id: leg.account_id.clone(),
                side: leg.side,
                amount,
                currency: leg.currency.clone(),
            });
        }
        Ok(PostingRequest {
            id: self.id.clone(),
            description: self.description.clone(),
            legs,
            initiator: self.initiator.clone(),
            decision: None,
        })
    }

    /// What the fraud rules get to see.
    ///
    /// The scored amount is the total debited; the scored account is the
    /// first debit leg's account.
    pub fn evaluation_context(&self) -> Result<EvaluationContext, OrchestratorError> {
        let source = self
            .legs
            .iter()
            .find(|leg| leg.side == Side::Debit)
            .ok_or_else(|| {
                OrchestratorError::Validation("transaction has no debit leg".to_string())
            })?;
        let total_debited: Decimal = self
            .legs
            .iter()
            .filter(|leg| leg.side == Side::Debit)
            .map(|leg| leg.amount)
            .sum();

        let mut ctx = EvaluationContext::new(
            self.id.clone(),
            source.account_id.clone(),
            total_debited,
            source.currency.code(),
        );
        if let Some(device) = &self.device_id {
            ctx = ctx.with_device(device);
        }
        if let Some(merchant) = &self.merchant_id {
            ctx = ctx.with_merchant(merchant);
        }
        Ok(ctx)
    }
}
