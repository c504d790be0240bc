//! Amount outlier rule: transaction far above the account's recent mean

use async_trait::async_trait;
use finledger_core::SubjectKey;
use rust_decimal::prelude::ToPrimitive;

use crate::context::EvaluationContext;
use crate::rule::{FraudRule, RuleError, RuleScore, SignalView};

pub struct AmountOutlierRule {
    /// Multiple of the recent mean at which the rule fires
    multiplier: f64,
}

impl AmountOutlierRule {
    pub fn new(multiplier: f64) -> Self {
        Self { multiplier }
    }
}

impl Default for AmountOutlierRule {
    fn default() -> Self {
        Self::new(5.0)
    }
}

#[async_trait]
impl FraudRule for AmountOutlierRule {
    fn id(&self) -> &'static str {
        "amount_outlier"
    }

    async fn evaluate(
        &self,
        ctx: &EvaluationContext,
        signals: &SignalView,
    ) -> Result<RuleScore, RuleError> {
        let subject = SubjectKey::account(ctx.source_account.as_str());
        let mean = signals
            .for_subject(&subject)
            .and_then(|snapshot| snapshot.mean_amount());

        // No history yet: nothing to compare against
        let Some(mean) = mean else {
            return Ok(RuleScore::clear());
        };
        let mean = mean
            .to_f64()
            .ok_or_else(|| RuleError::Evaluation("mean out of f64 range".to_string()))?;
        let amount = ctx
            .amount
            .to_f64()
            .ok_or_else(|| RuleError::Evaluation("amount out of f64 range".to_string()))?;
        if mean <= 0.0 {
            return Ok(RuleScore::clear());
        }

        let ratio = amount / mean;
        if ratio >= self.multiplier {
            // Scale so firing at exactly the multiplier scores 0.5 and
            // doubling it saturates at 1.0
            Ok(RuleScore::fired(ratio / (2.0 * self.multiplier)))
        } else {
            Ok(RuleScore::clear())
        }
    }
}
