//! Velocity rule: too many transactions from one account in the window

use async_trait::async_trait;
use finledger_core::SubjectKey;

use crate::context::EvaluationContext;
use crate::rule::{FraudRule, RuleError, RuleScore, SignalView};

pub struct VelocityRule {
    /// Transactions in the window at which the rule fires outright
    max_count: u64,
}

impl VelocityRule {
    pub fn new(max_count: u64) -> Self {
        Self { max_count }
    }
}

impl Default for VelocityRule {
    fn default() -> Self {
        Self::new(10)
    }
}

#[async_trait]
impl FraudRule for VelocityRule {
    fn id(&self) -> &'static str {
        "velocity"
    }

    async fn evaluate(
        &self,
        ctx: &EvaluationContext,
        signals: &SignalView,
    ) -> Result<RuleScore, RuleError> {
        let subject = SubjectKey::account(ctx.source_account.as_str());
        let count = signals
            .for_subject(&subject)
            .map(|snapshot| snapshot.count)
            .unwrap_or(0);

        let score = (count as f64 / self.max_count as f64).min(1.0);
        if count >= self.max_count {
            Ok(RuleScore::fired(score))
        } else {
            Ok(RuleScore {
                score,
                fired: false,
            })
        }
    }
}
