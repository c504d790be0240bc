//! The orchestrator proper
//!
//! Serializes work per transaction id, replays recorded outcomes for
//! completed ids, and drives new submissions through
//! `Received -> Scoring -> (Allowed -> Posting -> Posted) | Held | Rejected`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use finledger_core::{RiskDecision, TransactionId};
use finledger_fraud::ScoringEngine;
use finledger_ledger::{
    validation, LedgerEntry, LedgerError, PostingEngine, Transaction, TransactionStatus,
};
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;

use crate::config::RetryConfig;
use crate::error::OrchestratorError;
use crate::outcome::TransactionOutcome;
use crate::request::TransactionRequest;
use crate::state::OrchestrationState;

pub struct Orchestrator {
    ledger: Arc<PostingEngine>,
    scoring: Arc<ScoringEngine>,
    retry: RetryConfig,
    /// One async mutex per id currently being worked on
    in_flight: StdMutex<HashMap<TransactionId, Arc<AsyncMutex<()>>>>,
    /// Ids cancelled before their posting phase began, with the mark's
    /// placement time
    cancelled: StdMutex<HashMap<TransactionId, Instant>>,
}

impl Orchestrator {
    /// How long a cancellation mark stays effective. A mark whose
    /// transaction never arrives must not refuse an unrelated future
    /// submission reusing the id.
    pub const CANCEL_MARK_TTL: Duration = Duration::from_secs(600);

    pub fn new(ledger: Arc<PostingEngine>, scoring: Arc<ScoringEngine>, retry: RetryConfig) -> Self {
        Self {
            ledger,
            scoring,
            retry,
            in_flight: StdMutex::new(HashMap::new()),
            cancelled: StdMutex::new(HashMap::new()),
        }
    }

    /// Submit a transaction and drive it to its terminal outcome.
    ///
    /// Exactly one of `Posted`, `Held`, or `Rejected` comes back on
    /// success. Concurrent submissions with the same id serialize here and
    /// all observe the same outcome.
    pub async fn submit(
        &self,
        request: TransactionRequest,
    ) -> Result<TransactionOutcome, OrchestratorError> {
        let id = request.id.clone();
        let id_lock = self.acquire_id(&id).await;

        let result = self.run(request).await;

        drop(id_lock);
        self.release_id(&id);
        result
    }

    /// Request cancellation. Effective only while the transaction has not
    /// entered its posting phase; returns whether the mark was placed.
    pub async fn cancel(&self, id: &TransactionId) -> bool {
        match self.ledger.store().find_transaction(id).await {
            Ok(Some(_)) => false,
            _ => {
                tracing::info!(transaction_id = %id, "Cancellation requested");
                let mut marks = self.cancelled.lock().expect("cancel map lock poisoned");
                marks.retain(|_, placed_at| placed_at.elapsed() < Self::CANCEL_MARK_TTL);
                marks.insert(id.clone(), Instant::now()).is_none()
            }
        }
    }

    async fn run(
        &self,
        request: TransactionRequest,
    ) -> Result<TransactionOutcome, OrchestratorError> {
        let id = request.id.clone();

        let mut posting = request.posting_request()?;
        let draft_entries = posting
            .legs
            .iter()
            .map(|leg| {
                LedgerEntry::new(
                    leg.account_id.clone(),
                    leg.side,
                    leg.amount,
                    leg.currency.clone(),
                )
            })
            .collect::<Vec<_>>();

        // Completed ids replay their recorded outcome; nothing is re-scored
        // and no signals move.
        if let Some(outcome) = self.replay(&id, &draft_entries).await? {
            tracing::debug!(transaction_id = %id, "Replaying recorded outcome");
            return Ok(outcome);
        }

        let mut state = OrchestrationState::Received;

        // Sync validation happens before any scoring or signal update
        validation::validate_shape(&draft_entries, &posting.description, self.ledger.config())
            .map_err(OrchestratorError::Ledger)?;
        validation::validate_balance(&draft_entries).map_err(OrchestratorError::Ledger)?;

        if self.take_cancel_mark(&id) {
            return Err(OrchestratorError::Cancelled(id));
        }

        self.advance(&id, &mut state, OrchestrationState::Scoring);
        let ctx = request.evaluation_context()?;
        let decision = self.scoring.evaluate(&ctx).await;

        if decision.is_rejected() {
            self.advance(&id, &mut state, OrchestrationState::Rejected);
            self.record(&request, draft_entries, TransactionStatus::Rejected, &decision)
                .await?;
            return Ok(TransactionOutcome::Rejected(decision));
        }
        if decision.is_held() {
            self.advance(&id, &mut state, OrchestrationState::Held);
            self.record(&request, draft_entries, TransactionStatus::Held, &decision)
                .await?;
            return Ok(TransactionOutcome::Held(decision));
        }

        self.advance(&id, &mut state, OrchestrationState::Allowed);

        // Last cancellation window: once posting starts, the commit runs to
        // completion.
        if self.take_cancel_mark(&id) {
            return Err(OrchestratorError::Cancelled(id));
        }

        self.advance(&id, &mut state, OrchestrationState::Posting);
        posting.decision = Some(decision);
        let transaction = self
            .with_retries(&id, "post", || self.ledger.post(posting.clone()))
            .await?;
        self.advance(&id, &mut state, OrchestrationState::Posted);

        Ok(TransactionOutcome::Posted(transaction))
    }

    /// Recorded outcome for an id that already finished, if any.
    ///
    /// A resubmission is only a replay when its legs match the recorded
    /// transaction; the same id with different legs is a distinct
    /// transaction reusing a spent key and fails as a duplicate.
    async fn replay(
        &self,
        id: &TransactionId,
        entries: &[LedgerEntry],
    ) -> Result<Option<TransactionOutcome>, OrchestratorError> {
        let existing = self
            .ledger
            .store()
            .find_transaction(id)
            .await
            .map_err(LedgerError::from)?;

        let Some(transaction) = existing else {
            return Ok(None);
        };
        if !matches!(
            transaction.status,
            TransactionStatus::Posted | TransactionStatus::Held | TransactionStatus::Rejected
        ) {
            return Ok(None);
        }
        if !transaction.same_entries(entries) {
            return Err(LedgerError::DuplicateTransaction(id.clone()).into());
        }

        let decision = transaction
            .decision
            .clone()
            .unwrap_or_else(RiskDecision::allow);
        Ok(Some(match transaction.status {
            TransactionStatus::Posted => TransactionOutcome::Posted(transaction),
            TransactionStatus::Held => TransactionOutcome::Held(decision),
            _ => TransactionOutcome::Rejected(decision),
        }))
    }

    /// Run a storage-backed operation with bounded retries.
    ///
    /// Retryable storage errors back off and try again up to the configured
    /// attempt ceiling, then surface as `RetryableFailure`; anything else
    /// surfaces immediately.
    async fn with_retries<T, F, Fut>(
        &self,
        id: &TransactionId,
        operation: &'static str,
        mut op: F,
    ) -> Result<T, OrchestratorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(LedgerError::Storage(err)) if err.is_retryable() => {
                    if attempt >= self.retry.max_attempts {
                        tracing::warn!(
                            transaction_id = %id,
                            operation,
                            attempts = attempt,
                            error = %err,
                            "Storage retries exhausted"
                        );
                        return Err(OrchestratorError::RetryableFailure { attempts: attempt });
                    }
                    let backoff = self.retry.backoff(attempt);
                    tracing::debug!(
                        transaction_id = %id,
                        operation,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "Retrying after storage error"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Persist a held or rejected transaction with its decision for audit
    async fn record(
        &self,
        request: &TransactionRequest,
        entries: Vec<LedgerEntry>,
        status: TransactionStatus,
        decision: &RiskDecision,
    ) -> Result<(), OrchestratorError> {
        let mut transaction =
            Transaction::new(request.id.clone(), request.description.clone(), entries);
        transaction.status = status;
        transaction.decision = Some(decision.clone());
        self.with_retries(&request.id, "record", || async {
            self.ledger
                .store()
                .save_transaction(&transaction)
                .await
                .map_err(LedgerError::from)
        })
        .await
    }

    fn advance(
        &self,
        id: &TransactionId,
        state: &mut OrchestrationState,
        next: OrchestrationState,
    ) {
        debug_assert!(state.can_transition_to(next), "{state:?} -> {next:?}");
        tracing::debug!(transaction_id = %id, from = ?state, to = ?next, "State transition");
        *state = next;
    }

    fn take_cancel_mark(&self, id: &TransactionId) -> bool {
        self.cancelled
            .lock()
            .expect("cancel map lock poisoned")
            .remove(id)
            .is_some_and(|placed_at| placed_at.elapsed() < Self::CANCEL_MARK_TTL)
    }

    async fn acquire_id(&self, id: &TransactionId) -> tokio::sync::OwnedMutexGuard<()> {
        let cell = {
            let mut map = self.in_flight.lock().expect("in-flight lock poisoned");
            Arc::clone(
                map.entry(id.clone())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        cell.lock_owned().await
    }

    fn release_id(&self, id: &TransactionId) {
        let mut map = self.in_flight.lock().expect("in-flight lock poisoned");
        if let Some(cell) = map.get(id) {
            // Only the map holds it: no waiter is queued behind us
            if Arc::strong_count(cell) == 1 {
                map.remove(id);
            }
        }
    }
}
