//! Scoring engine
//!
//! Runs all registered rules concurrently against prefetched signals,
//! aggregates their scores, and maps the aggregate onto Allow/Hold/Reject.
//! Signal-cache trouble and misbehaving rules degrade per the fail policy;
//! `evaluate` itself never fails and never exceeds the overall deadline.

use std::sync::Arc;
use std::time::Duration;

use finledger_core::{Decision, RiskDecision};
use finledger_signals::{SignalCache, SignalCacheConfig, SignalDelta};
use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::config::{FailPolicy, ScoringConfig};
use crate::context::EvaluationContext;
use crate::rule::{FraudRule, SignalView};

pub struct ScoringEngine {
    rules: Vec<Arc<dyn FraudRule>>,
    cache: Arc<dyn SignalCache>,
    config: ScoringConfig,
    /// Bound on each cache get/apply, from the cache's own config
    cache_op_timeout: Duration,
}

impl ScoringEngine {
    pub fn new(cache: Arc<dyn SignalCache>, config: ScoringConfig) -> Self {
        Self {
            rules: Vec::new(),
            cache,
            config,
            cache_op_timeout: SignalCacheConfig::default().op_timeout(),
        }
    }

    /// Use the op timeout of the cache this engine talks to
    pub fn with_cache_timeout(mut self, timeout: Duration) -> Self {
        self.cache_op_timeout = timeout;
        self
    }

    pub fn with_rule(mut self, rule: Arc<dyn FraudRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score one transaction.
    ///
    /// Always returns within the overall deadline. After scoring, the
    /// subjects' snapshots are updated exactly once for this evaluation,
    /// whatever the decision was.
    pub async fn evaluate(&self, ctx: &EvaluationContext) -> RiskDecision {
        let decision = match timeout(self.config.overall_deadline(), self.score(ctx)).await {
            Ok(decision) => decision,
            Err(_) => {
                tracing::warn!(
                    transaction_id = %ctx.transaction_id,
                    deadline_ms = self.config.overall_deadline_ms,
                    "Scoring deadline exceeded"
                );
                self.degraded("deadline_exceeded")
            }
        };

        self.record_observation(ctx).await;

        tracing::info!(
            transaction_id = %ctx.transaction_id,
            score = decision.score,
            decision = ?decision.decision,
            fired = ?decision.fired_rules,
            "Fraud evaluation complete"
        );
        decision
    }

    async fn score(&self, ctx: &EvaluationContext) -> RiskDecision {
        let view = match self.prefetch(ctx).await {
            Ok(view) => view,
            Err(reason) => match self.config.fail_policy {
                FailPolicy::FailOpen => {
                    tracing::warn!(
                        transaction_id = %ctx.transaction_id,
                        %reason,
                        "Signal cache degraded, scoring with baseline signals"
                    );
                    SignalView::empty()
                }
                FailPolicy::FailClosed => {
                    tracing::warn!(
                        transaction_id = %ctx.transaction_id,
                        %reason,
                        "Signal cache degraded, rejecting"
                    );
                    return self.degraded("signals_unavailable");
                }
            },
        };

        let ctx_shared = Arc::new(ctx.clone());
        let view = Arc::new(view);
        let rule_timeout = self.config.rule_timeout();

        let mut tasks = JoinSet::new();
        for rule in &self.rules {
            let rule = Arc::clone(rule);
            let ctx = Arc::clone(&ctx_shared);
            let view = Arc::clone(&view);
            tasks.spawn(async move {
                let outcome = timeout(rule_timeout, rule.evaluate(&ctx, &view)).await;
                (rule.id(), outcome)
            });
        }

        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        let mut fired = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            let (rule_id, outcome) = match joined {
                Ok(result) => result,
                Err(join_error) => {
                    tracing::error!(error = %join_error, "Rule task panicked, abstaining");
                    continue;
                }
            };
            let weight = self.config.weight_for(rule_id);

            match outcome {
                Ok(Ok(score)) => {
                    weighted_sum += weight * score.score;
                    weight_total += weight;
                    if score.fired {
                        fired.push(rule_id.to_string());
                    }
                }
                Ok(Err(error)) => {
                    // Abstain: the rule contributes neither score nor weight
                    tracing::warn!(rule = rule_id, %error, "Rule failed, abstaining");
                }
                Err(_) => {
                    let fallback = self.config.fail_policy.timeout_score();
                    tracing::warn!(
                        rule = rule_id,
                        timeout_ms = self.config.rule_timeout_ms,
                        fallback,
                        "Rule timed out"
                    );
                    weighted_sum += weight * fallback;
                    weight_total += weight;
                    if fallback > 0.0 {
                        fired.push(rule_id.to_string());
                    }
                }
            }
        }

        let score = if weight_total > 0.0 {
            weighted_sum / weight_total
        } else {
            0.0
        };
        fired.sort();

        RiskDecision::new(score, self.map_thresholds(score), fired)
    }

    fn map_thresholds(&self, score: f64) -> Decision {
        if score < self.config.t1 {
            Decision::Allow
        } else if score < self.config.t2 {
            Decision::Hold
        } else {
            Decision::Reject
        }
    }

    /// Decision for a degraded evaluation, per fail policy
    fn degraded(&self, marker: &str) -> RiskDecision {
        match self.config.fail_policy {
            FailPolicy::FailOpen => RiskDecision::new(0.0, Decision::Allow, vec![marker.to_string()]),
            FailPolicy::FailClosed => {
                RiskDecision::new(1.0, Decision::Reject, vec![marker.to_string()])
            }
        }
    }

    async fn prefetch(&self, ctx: &EvaluationContext) -> Result<SignalView, String> {
        let op_timeout = self.cache_op_timeout;
        let mut view = SignalView::empty();
        for subject in ctx.subjects() {
            match timeout(op_timeout, self.cache.get(&subject)).await {
                Ok(Ok(Some(snapshot))) => view.insert(subject, snapshot),
                // Cold subject: baseline, nothing to insert
                Ok(Ok(None)) => {}
                Ok(Err(error)) => return Err(error.to_string()),
                Err(_) => return Err(format!("signal fetch for {subject} timed out")),
            }
        }
        Ok(view)
    }

    /// Fold this transaction into the subjects' snapshots.
    ///
    /// Runs exactly once per evaluation. Failures are logged and dropped:
    /// signals are advisory, so a missed update degrades future scoring
    /// quality but must not affect this transaction's outcome.
    async fn record_observation(&self, ctx: &EvaluationContext) {
        let op_timeout = self.cache_op_timeout;
        for subject in ctx.subjects() {
            let delta = SignalDelta::observation(ctx.amount);
            match timeout(op_timeout, self.cache.apply(&subject, delta)).await {
                Ok(Ok(_)) => {}
                Ok(Err(error)) => {
                    tracing::warn!(%subject, %error, "Signal update dropped");
                }
                Err(_) => {
                    tracing::warn!(%subject, "Signal update timed out, dropped");
                }
            }
        }
    }
}
