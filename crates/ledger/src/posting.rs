//! Double-entry posting engine
//!
//! Validates and atomically commits balanced transactions against the
//! ledger store. Per-account serialization is a lock table keyed by account
//! id; a global lock is never taken.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use finledger_core::{AccountId, Amount, Currency, RiskDecision, TransactionId};
use rust_decimal::Decimal;

use crate::account::AccountStatus;
use crate::config::PostingConfig;
use crate::entry::{LedgerEntry, Side, Transaction, TransactionStatus};
use crate::error::LedgerError;
use crate::limits::DailyLimits;
use crate::locks::AccountLockTable;
use crate::store::LedgerStore;
use crate::validation::{validate_balance, validate_shape};

/// One debit or credit requested against an account
#[derive(Debug, Clone)]
pub struct Leg {
    pub account_id: AccountId,
    pub side: Side,
    pub amount: Amount,
    pub currency: Currency,
}

impl Leg {
    pub fn debit(account_id: AccountId, amount: Amount, currency: Currency) -> Self {
        Self {
            account_id,
            side: Side::Debit,
            amount,
            currency,
        }
    }

    pub fn credit(account_id: AccountId, amount: Amount, currency: Currency) -> Self {
        Self {
            account_id,
            side: Side::Credit,
            amount,
            currency,
        }
    }
}

/// A posting request: idempotency id plus the legs to commit
#[derive(Debug, Clone)]
pub struct PostingRequest {
    pub id: TransactionId,
    pub description: String,
    pub legs: Vec<Leg>,
    /// Initiating user, if known; enables daily limit enforcement
    pub initiator: Option<String>,
    /// Fraud evaluation outcome to attach to the committed transaction
    pub decision: Option<RiskDecision>,
}

/// Double-entry posting engine
///
/// Posting is atomic across all entries of a transaction: either all
/// entries become visible to subsequent balance reads, or none do.
pub struct PostingEngine {
    store: Arc<dyn LedgerStore>,
    locks: AccountLockTable,
    limits: DailyLimits,
    config: PostingConfig,
    halted: AtomicBool,
}

impl PostingEngine {
    pub fn new(store: Arc<dyn LedgerStore>, config: PostingConfig) -> Self {
        Self {
            store,
            locks: AccountLockTable::new(),
            limits: DailyLimits::new(),
            config,
            halted: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    pub fn config(&self) -> &PostingConfig {
        &self.config
    }

    /// True once reconciliation has detected a mismatch
    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    /// Clear the halt flag after operator review
    pub fn clear_halt(&self) {
        self.halted.store(false, Ordering::SeqCst);
    }

    /// Validate and atomically commit a transaction.
    ///
    /// Idempotent: resubmitting an already-posted id with identical legs
    /// returns the prior result; the same id with different legs fails with
    /// `DuplicateTransaction`.
    pub async fn post(&self, request: PostingRequest) -> Result<Transaction, LedgerError> {
        if self.is_halted() {
            return Err(LedgerError::SystemHalted);
        }

        let entries: Vec<LedgerEntry> = request
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
            .collect();

        validate_shape(&entries, &request.description, &self.config)?;
        validate_balance(&entries)?;

        // Cheap pre-lock idempotency peek; rechecked under the locks
        if let Some(prior) = self.idempotency_hit(&request.id, &entries).await? {
            return Ok(prior);
        }

        // Reserved now, charged only on commit: any failure below returns
        // the budget when the reservation drops.
        let limit_reservation = match &request.initiator {
            Some(initiator) => {
                let debit_total: Decimal = entries
                    .iter()
                    .filter(|e| e.side == Side::Debit)
                    .map(|e| e.amount.value())
                    .sum();
                let currency = &entries[0].currency;
                Some(
                    self.limits
                        .reserve(initiator, currency, debit_total, &self.config)?,
                )
            }
            None => None,
        };

        let account_ids: Vec<AccountId> = {
            let mut ids: Vec<AccountId> = entries.iter().map(|e| e.account_id.clone()).collect();
            ids.sort();
            ids.dedup();
            ids
        };

        let _locks = self.locks.lock_accounts(&account_ids).await;

        // A concurrent duplicate may have committed while we waited
        if let Some(prior) = self.idempotency_hit(&request.id, &entries).await? {
            return Ok(prior);
        }

        self.check_accounts(&account_ids, &entries).await?;
        self.pre_flight(&account_ids, &entries).await?;

        let entries = self.assign_sequences(&account_ids, entries).await?;

        let mut transaction = Transaction::new(request.id, request.description, entries);
        transaction.decision = request.decision;
        transaction.status = TransactionStatus::Posted;

        let mut write = self.store.begin().await?;
        write.append_entries(&transaction.entries);
        write.stage_transaction(&transaction);
        write.commit().await?;

        if let Some(reservation) = limit_reservation {
            reservation.commit();
        }

        tracing::info!(
            transaction_id = %transaction.id,
            entries = transaction.entries.len(),
            accounts = account_ids.len(),
            "Transaction committed"
        );

        Ok(transaction)
    }

    /// Verify every account's stored balance against the sum of its entries.
    ///
    /// A mismatch halts posting until an operator clears the flag; this
    /// mirrors the dedicated reconciliation sweep of the upstream design.
    pub async fn reconcile(&self) -> Result<usize, LedgerError> {
        tracing::info!("Starting reconciliation sweep");
        let ids = self.store.account_ids().await?;

        for id in &ids {
            let stored = self.store.read_balance(id).await?;
            let computed: Decimal = self
                .store
                .entries(id)
                .await?
                .iter()
                .map(|e| e.signed_amount())
                .sum();

            if stored != computed {
                self.halted.store(true, Ordering::SeqCst);
                tracing::error!(
                    account = %id,
                    %stored,
                    %computed,
                    "Reconciliation mismatch - halting posting"
                );
                return Err(LedgerError::ReconciliationMismatch {
                    account: id.clone(),
                    stored,
                    computed,
                });
            }
        }

        tracing::info!(accounts = ids.len(), "Reconciliation passed");
        Ok(ids.len())
    }

    async fn idempotency_hit(
        &self,
        id: &TransactionId,
        entries: &[LedgerEntry],
    ) -> Result<Option<Transaction>, LedgerError> {
        match self.store.find_transaction(id).await? {
            Some(prior) if prior.status == TransactionStatus::Posted => {
                if prior.same_entries(entries) {
                    tracing::debug!(transaction_id = %id, "Idempotent resubmission, returning prior result");
                    Ok(Some(prior))
                } else {
                    Err(LedgerError::DuplicateTransaction(id.clone()))
                }
            }
            Some(_) => Err(LedgerError::DuplicateTransaction(id.clone())),
            None => Ok(None),
        }
    }

    async fn check_accounts(
        &self,
        account_ids: &[AccountId],
        entries: &[LedgerEntry],
    ) -> Result<(), LedgerError> {
        for id in account_ids {
            let account = self
                .store
                .account(id)
                .await?
                .ok_or_else(|| LedgerError::AccountNotFound(id.clone()))?;

            match account.status {
                AccountStatus::Active => {}
                AccountStatus::Frozen => return Err(LedgerError::AccountFrozen(id.clone())),
                AccountStatus::Closed => return Err(LedgerError::AccountClosed(id.clone())),
            }

            for entry in entries.iter().filter(|e| &e.account_id == id) {
                if entry.currency != account.currency {
                    return Err(LedgerError::CurrencyMismatch {
                        account: id.clone(),
                        expected: account.currency.code().to_string(),
                        actual: entry.currency.code().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Simulate the transaction against current balances without mutating
    /// anything; no account may go negative.
    async fn pre_flight(
        &self,
        account_ids: &[AccountId],
        entries: &[LedgerEntry],
    ) -> Result<(), LedgerError> {
        let mut simulated: HashMap<&AccountId, Decimal> = HashMap::new();
        for id in account_ids {
            simulated.insert(id, self.store.read_balance(id).await?);
        }

        for entry in entries {
            let balance = simulated
                .get_mut(&entry.account_id)
                .expect("pre-flight covers all touched accounts");
            *balance += entry.signed_amount();
        }

        for (id, projected) in simulated {
            if projected < Decimal::ZERO {
                return Err(LedgerError::InsufficientFunds {
                    account: id.clone(),
                    projected,
                });
            }
        }

        Ok(())
    }

    /// Assign strictly increasing per-account sequence numbers, preserving
    /// entry order within the transaction.
    async fn assign_sequences(
        &self,
        account_ids: &[AccountId],
        mut entries: Vec<LedgerEntry>,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut heads: HashMap<&AccountId, u64> = HashMap::new();
        for id in account_ids {
            heads.insert(id, self.store.head_sequence(id).await?);
        }

        for entry in &mut entries {
            let head = heads
                .get_mut(&entry.account_id)
                .expect("sequence heads cover all touched accounts");
            *head += 1;
            entry.sequence = *head;
        }

        Ok(entries)
    }
}
