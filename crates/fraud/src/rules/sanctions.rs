//! Sanction list rule: hard match against a blocked-party list

use std::collections::HashSet;

use async_trait::async_trait;

use crate::context::EvaluationContext;
use crate::rule::{FraudRule, RuleError, RuleScore, SignalView};

/// A match is absolute: maximum score, no partial credit.
pub struct SanctionListRule {
    blocked: HashSet<String>,
}

impl SanctionListRule {
    pub fn new(blocked: impl IntoIterator<Item = String>) -> Self {
        Self {
            blocked: blocked.into_iter().collect(),
        }
    }
}

#[async_trait]
impl FraudRule for SanctionListRule {
    fn id(&self) -> &'static str {
        "sanction_list"
    }

    async fn evaluate(
        &self,
        ctx: &EvaluationContext,
        _signals: &SignalView,
    ) -> Result<RuleScore, RuleError> {
        let account_blocked = self.blocked.contains(ctx.source_account.as_str());
        let merchant_blocked = ctx
            .merchant_id
            .as_deref()
            .map(|merchant| self.blocked.contains(merchant))
            .unwrap_or(false);

        if account_blocked || merchant_blocked {
            tracing::warn!(
                transaction_id = %ctx.transaction_id,
                account = %ctx.source_account,
                "Sanction list match"
            );
            Ok(RuleScore::fired(1.0))
        } else {
            Ok(RuleScore::clear())
        }
    }
}
