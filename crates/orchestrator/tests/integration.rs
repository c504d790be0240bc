//! End-to-end flows: submission through scoring, posting, replay,
//! cancellation, and retry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use finledger_core::{Amount, Currency, TransactionId};
use finledger_fraud::{
    EvaluationContext, FailPolicy, FraudRule, RuleError, RuleScore, ScoringConfig, ScoringEngine,
    SignalView,
};
use finledger_fraud::rules::VelocityRule;
use finledger_ledger::{
    Account, InMemoryLedgerStore, Leg, LedgerStore, PostingConfig, PostingEngine, PostingRequest,
    TransactionStatus,
};
use finledger_orchestrator::{
    Orchestrator, OrchestratorError, RetryConfig, TransactionOutcome, TransactionRequest,
};
use finledger_signals::{InMemorySignalCache, SignalCache, SignalCacheConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Rule with a constant score, for steering decisions in tests
struct StaticRule {
    score: f64,
}

#[async_trait]
impl FraudRule for StaticRule {
    fn id(&self) -> &'static str {
        "static"
    }

    async fn evaluate(
        &self,
        _ctx: &EvaluationContext,
        _signals: &SignalView,
    ) -> Result<RuleScore, RuleError> {
        Ok(if self.score > 0.0 {
            RuleScore::fired(self.score)
        } else {
            RuleScore::clear()
        })
    }
}

struct Harness {
    orchestrator: Orchestrator,
    ledger: Arc<PostingEngine>,
    store: Arc<InMemoryLedgerStore>,
    cache: Arc<InMemorySignalCache>,
}

async fn harness_with(
    fail_policy: FailPolicy,
    rules: Vec<Arc<dyn FraudRule>>,
) -> Harness {
    init_tracing();
    let store = Arc::new(InMemoryLedgerStore::new());
    for id in ["vault", "alice", "bob", "carol"] {
        store
            .create_account(Account::new(id.into(), Currency::Usd))
            .await
            .unwrap();
    }
    // External float backing funding debits
    store.corrupt_balance(&"vault".into(), dec!(1_000_000));

    let ledger = Arc::new(PostingEngine::new(
        store.clone() as Arc<dyn LedgerStore>,
        PostingConfig::default(),
    ));
    let cache_config = SignalCacheConfig::default();
    let cache = Arc::new(InMemorySignalCache::new(cache_config.clone()));

    let config = ScoringConfig {
        fail_policy,
        ..ScoringConfig::default()
    };
    let mut scoring =
        ScoringEngine::new(cache.clone(), config).with_cache_timeout(cache_config.op_timeout());
    for rule in rules {
        scoring = scoring.with_rule(rule);
    }

    let orchestrator = Orchestrator::new(
        ledger.clone(),
        Arc::new(scoring),
        RetryConfig {
            max_attempts: 3,
            base_backoff_ms: 1,
        },
    );

    Harness {
        orchestrator,
        ledger,
        store,
        cache,
    }
}

async fn harness(score: f64) -> Harness {
    harness_with(
        FailPolicy::FailClosed,
        vec![Arc::new(StaticRule { score })],
    )
    .await
}

async fn fund(harness: &Harness, account: &str, value: Decimal) {
    harness
        .ledger
        .post(PostingRequest {
            id: TransactionId::generate(),
            description: format!("fund {account}"),
            legs: vec![
                Leg::debit("vault".into(), Amount::new(value).unwrap(), Currency::Usd),
                Leg::credit(account.into(), Amount::new(value).unwrap(), Currency::Usd),
            ],
            initiator: None,
            decision: None,
        })
        .await
        .unwrap();
}

fn transfer(id: &str, from: &str, to: &str, value: Decimal) -> TransactionRequest {
    TransactionRequest::transfer(
        TransactionId::of(id).unwrap(),
        from.into(),
        to.into(),
        value,
        Currency::Usd,
    )
}

async fn balance(harness: &Harness, account: &str) -> Decimal {
    harness.store.read_balance(&account.into()).await.unwrap()
}

#[tokio::test]
async fn test_allowed_transaction_posts_and_moves_funds() -> anyhow::Result<()> {
    let h = harness(0.0).await;
    fund(&h, "alice", dec!(100)).await;

    let outcome = h
        .orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(30)))
        .await?;

    assert!(outcome.is_posted());
    assert_eq!(balance(&h, "alice").await, dec!(70));
    assert_eq!(balance(&h, "bob").await, dec!(30));

    let stored = h
        .store
        .find_transaction(&TransactionId::of("tx-1")?)
        .await?
        .expect("posted transaction is recorded");
    assert_eq!(stored.status, TransactionStatus::Posted);
    assert!(stored.decision.is_some());
    Ok(())
}

#[tokio::test]
async fn test_high_score_rejects_and_never_posts() {
    let h = harness(0.9).await;
    fund(&h, "alice", dec!(100)).await;

    let outcome = h
        .orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(30)))
        .await
        .unwrap();

    let TransactionOutcome::Rejected(decision) = outcome else {
        panic!("expected rejection");
    };
    assert!(decision.score >= 0.8);
    assert_eq!(decision.fired_rules, vec!["static".to_string()]);

    // No movement, and the rejection is retained for audit
    assert_eq!(balance(&h, "alice").await, dec!(100));
    assert_eq!(balance(&h, "bob").await, dec!(0));
    let stored = h
        .store
        .find_transaction(&TransactionId::of("tx-1").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, TransactionStatus::Rejected);
}

#[tokio::test]
async fn test_mid_score_holds_without_posting() {
    let h = harness(0.6).await;
    fund(&h, "alice", dec!(100)).await;

    let outcome = h
        .orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(30)))
        .await
        .unwrap();

    assert!(outcome.is_held());
    assert_eq!(balance(&h, "alice").await, dec!(100));
    let stored = h
        .store
        .find_transaction(&TransactionId::of("tx-1").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, TransactionStatus::Held);
    assert!(stored.decision.is_some());
}

#[tokio::test]
async fn test_cache_outage_fail_open_still_decides() {
    let h = harness_with(FailPolicy::FailOpen, vec![Arc::new(VelocityRule::default())]).await;
    fund(&h, "alice", dec!(100)).await;
    h.cache.set_unavailable(true);

    let outcome = h
        .orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(30)))
        .await
        .unwrap();

    // Baseline signals: velocity sees a cold account and allows
    assert!(outcome.is_posted());
    assert_eq!(balance(&h, "bob").await, dec!(30));
}

#[tokio::test]
async fn test_cache_outage_fail_closed_rejects() {
    let h = harness_with(
        FailPolicy::FailClosed,
        vec![Arc::new(VelocityRule::default())],
    )
    .await;
    fund(&h, "alice", dec!(100)).await;
    h.cache.set_unavailable(true);

    let outcome = h
        .orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(30)))
        .await
        .unwrap();

    let TransactionOutcome::Rejected(decision) = outcome else {
        panic!("expected rejection");
    };
    assert_eq!(decision.fired_rules, vec!["signals_unavailable".to_string()]);
    assert_eq!(balance(&h, "alice").await, dec!(100));
}

#[tokio::test]
async fn test_completed_id_replays_without_rescoring() {
    let h = harness(0.0).await;
    fund(&h, "alice", dec!(100)).await;

    let first = h
        .orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(30)))
        .await
        .unwrap();
    let second = h
        .orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(30)))
        .await
        .unwrap();

    assert_eq!(first, second);
    // Posted once, and the replay moved no further signals
    assert_eq!(balance(&h, "alice").await, dec!(70));
    let snapshot = h
        .cache
        .get(&finledger_core::SubjectKey::account("alice"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.count, 1);
}

#[tokio::test]
async fn test_concurrent_duplicates_resolve_to_one_outcome() {
    let h = Arc::new(harness(0.0).await);
    fund(&h, "alice", dec!(100)).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let h = Arc::clone(&h);
        handles.push(tokio::spawn(async move {
            h.orchestrator
                .submit(transfer("tx-1", "alice", "bob", dec!(30)))
                .await
                .unwrap()
        }));
    }

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap());
    }

    assert!(outcomes.iter().all(|o| o.is_posted()));
    // Applied exactly once despite eight submissions
    assert_eq!(balance(&h, "alice").await, dec!(70));
    assert_eq!(balance(&h, "bob").await, dec!(30));
}

#[tokio::test]
async fn test_transient_storage_error_is_retried() {
    let h = harness(0.0).await;
    fund(&h, "alice", dec!(100)).await;
    h.store.fail_next_commits(2);

    let outcome = h
        .orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(30)))
        .await
        .unwrap();

    assert!(outcome.is_posted());
    assert_eq!(balance(&h, "bob").await, dec!(30));
}

#[tokio::test]
async fn test_retry_exhaustion_leaves_id_reusable() {
    let h = harness(0.0).await;
    fund(&h, "alice", dec!(100)).await;
    h.store.fail_next_commits(10);

    let result = h
        .orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(30)))
        .await;
    assert!(matches!(
        result,
        Err(OrchestratorError::RetryableFailure { attempts: 3 })
    ));
    assert_eq!(balance(&h, "alice").await, dec!(100));

    // Storage recovers; the same id now succeeds
    h.store.fail_next_commits(0);
    let outcome = h
        .orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(30)))
        .await
        .unwrap();
    assert!(outcome.is_posted());
    assert_eq!(balance(&h, "alice").await, dec!(70));
}

#[tokio::test]
async fn test_held_recording_retries_transient_save_error() {
    let h = harness(0.6).await;
    fund(&h, "alice", dec!(100)).await;
    h.store.fail_next_saves(1);

    let outcome = h
        .orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(30)))
        .await
        .unwrap();

    assert!(outcome.is_held());
    let stored = h
        .store
        .find_transaction(&TransactionId::of("tx-1").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, TransactionStatus::Held);
}

#[tokio::test]
async fn test_held_recording_exhaustion_surfaces_retryable_failure() {
    let h = harness(0.6).await;
    fund(&h, "alice", dec!(100)).await;
    h.store.fail_next_saves(10);

    let result = h
        .orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(30)))
        .await;
    assert!(matches!(
        result,
        Err(OrchestratorError::RetryableFailure { attempts: 3 })
    ));

    // Storage recovers; the same id records its hold
    h.store.fail_next_saves(0);
    let outcome = h
        .orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(30)))
        .await
        .unwrap();
    assert!(outcome.is_held());
}

#[tokio::test]
async fn test_commit_retry_charges_daily_limit_once() {
    init_tracing();
    let store = Arc::new(InMemoryLedgerStore::new());
    for id in ["vault", "alice", "bob"] {
        store
            .create_account(Account::new(id.into(), Currency::Usd))
            .await
            .unwrap();
    }
    store.corrupt_balance(&"vault".into(), dec!(1_000_000));
    let ledger = Arc::new(PostingEngine::new(
        store.clone() as Arc<dyn LedgerStore>,
        PostingConfig {
            daily_count_limit: 2,
            ..PostingConfig::default()
        },
    ));
    let cache = Arc::new(InMemorySignalCache::new(SignalCacheConfig::default()));
    let scoring = Arc::new(
        ScoringEngine::new(cache, ScoringConfig::default())
            .with_rule(Arc::new(StaticRule { score: 0.0 })),
    );
    let orchestrator = Orchestrator::new(
        ledger.clone(),
        scoring,
        RetryConfig {
            max_attempts: 3,
            base_backoff_ms: 1,
        },
    );

    ledger
        .post(PostingRequest {
            id: TransactionId::generate(),
            description: "fund alice".to_string(),
            legs: vec![
                Leg::debit("vault".into(), Amount::new(dec!(100)).unwrap(), Currency::Usd),
                Leg::credit("alice".into(), Amount::new(dec!(100)).unwrap(), Currency::Usd),
            ],
            initiator: None,
            decision: None,
        })
        .await
        .unwrap();

    // First transaction needs a retry; the failed attempt must not eat
    // into alice's daily count
    store.fail_next_commits(1);
    let first = orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(10)).with_initiator("alice"))
        .await
        .unwrap();
    assert!(first.is_posted());

    let second = orchestrator
        .submit(transfer("tx-2", "alice", "bob", dec!(10)).with_initiator("alice"))
        .await
        .unwrap();
    assert!(second.is_posted());

    // The third hits the genuine ceiling of two
    let third = orchestrator
        .submit(transfer("tx-3", "alice", "bob", dec!(10)).with_initiator("alice"))
        .await;
    assert!(matches!(
        third,
        Err(OrchestratorError::Ledger(
            finledger_ledger::LedgerError::LimitExceeded { .. }
        ))
    ));
}

#[tokio::test]
async fn test_reused_id_with_different_legs_is_refused() {
    let h = harness(0.0).await;
    fund(&h, "alice", dec!(100)).await;

    let first = h
        .orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(30)))
        .await
        .unwrap();
    assert!(first.is_posted());

    // Same id, different amount: a distinct transaction reusing a spent
    // key, not a replay
    let result = h
        .orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(40)))
        .await;
    assert!(matches!(
        result,
        Err(OrchestratorError::Ledger(
            finledger_ledger::LedgerError::DuplicateTransaction(_)
        ))
    ));
    assert_eq!(balance(&h, "alice").await, dec!(70));
}

#[tokio::test]
async fn test_cancel_before_posting_takes_effect() {
    let h = harness(0.0).await;
    fund(&h, "alice", dec!(100)).await;

    let id = TransactionId::of("tx-1").unwrap();
    assert!(h.orchestrator.cancel(&id).await);

    let result = h
        .orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(30)))
        .await;
    assert!(matches!(result, Err(OrchestratorError::Cancelled(_))));
    assert_eq!(balance(&h, "alice").await, dec!(100));

    // The mark is consumed; a fresh submission proceeds normally
    let outcome = h
        .orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(30)))
        .await
        .unwrap();
    assert!(outcome.is_posted());
}

#[tokio::test(start_paused = true)]
async fn test_stale_cancel_mark_does_not_block_resubmission() {
    let h = harness(0.0).await;
    fund(&h, "alice", dec!(100)).await;

    let id = TransactionId::of("tx-1").unwrap();
    assert!(h.orchestrator.cancel(&id).await);

    // The cancelled submission never arrives; much later the id comes back
    tokio::time::advance(Orchestrator::CANCEL_MARK_TTL + Duration::from_secs(1)).await;

    let outcome = h
        .orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(30)))
        .await
        .unwrap();
    assert!(outcome.is_posted());
}

#[tokio::test]
async fn test_cancel_after_completion_is_refused() {
    let h = harness(0.0).await;
    fund(&h, "alice", dec!(100)).await;

    h.orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(30)))
        .await
        .unwrap();

    let id = TransactionId::of("tx-1").unwrap();
    assert!(!h.orchestrator.cancel(&id).await);
    assert_eq!(balance(&h, "bob").await, dec!(30));
}

#[tokio::test]
async fn test_imbalanced_request_fails_before_scoring() {
    let h = harness(0.0).await;
    fund(&h, "alice", dec!(100)).await;

    let mut request = transfer("tx-1", "alice", "bob", dec!(30));
    request.legs[1].amount = dec!(20);

    let result = h.orchestrator.submit(request).await;
    assert!(matches!(result, Err(OrchestratorError::Ledger(_))));

    // Rejected synchronously: no signals were recorded for the subject
    let snapshot = h
        .cache
        .get(&finledger_core::SubjectKey::account("alice"))
        .await
        .unwrap();
    assert!(snapshot.is_none());
}

#[tokio::test]
async fn test_insufficient_funds_surfaces_ledger_error() {
    let h = harness(0.0).await;
    fund(&h, "alice", dec!(10)).await;

    let result = h
        .orchestrator
        .submit(transfer("tx-1", "alice", "bob", dec!(30)))
        .await;
    assert!(matches!(
        result,
        Err(OrchestratorError::Ledger(
            finledger_ledger::LedgerError::InsufficientFunds { .. }
        ))
    ));
}

#[tokio::test]
async fn test_velocity_buildup_escalates_decisions() {
    // Tight velocity threshold so repeated transfers trip it
    let h = harness_with(
        FailPolicy::FailClosed,
        vec![Arc::new(VelocityRule::new(4))],
    )
    .await;
    fund(&h, "alice", dec!(1000)).await;

    let mut last = None;
    for i in 0..6 {
        let request = transfer(&format!("tx-{i}"), "alice", "bob", dec!(10));
        last = Some(h.orchestrator.submit(request).await.unwrap());
    }

    // Early transfers post; by the sixth the window count pushes the score
    // past the hold threshold
    assert!(!last.unwrap().is_posted());
}
