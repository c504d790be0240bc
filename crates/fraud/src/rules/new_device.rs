//! New device rule: first transaction seen from this device fingerprint

use async_trait::async_trait;
use finledger_core::SubjectKey;

use crate::context::EvaluationContext;
use crate::rule::{FraudRule, RuleError, RuleScore, SignalView};

pub struct NewDeviceRule {
    /// Score contributed when the device has no history
    score: f64,
}

impl NewDeviceRule {
    pub fn new(score: f64) -> Self {
        Self { score }
    }
}

impl Default for NewDeviceRule {
    fn default() -> Self {
        Self::new(0.6)
    }
}

#[async_trait]
impl FraudRule for NewDeviceRule {
    fn id(&self) -> &'static str {
        "new_device"
    }

    async fn evaluate(
        &self,
        ctx: &EvaluationContext,
        signals: &SignalView,
    ) -> Result<RuleScore, RuleError> {
        // No device fingerprint on the request: nothing to judge
        let Some(device_id) = &ctx.device_id else {
            return Ok(RuleScore::clear());
        };

        let subject = SubjectKey::device(device_id);
        let seen = signals
            .for_subject(&subject)
            .map(|snapshot| snapshot.count > 0)
            .unwrap_or(false);

        if seen {
            Ok(RuleScore::clear())
        } else {
            Ok(RuleScore::fired(self.score))
        }
    }
}
