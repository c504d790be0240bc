//! Per-initiator daily transaction limits
//!
//! Tracks a daily count and total amount per (initiator, currency) and
//! refuses postings that would exceed the configured ceilings. Budget is
//! reserved up front and only charged once the posting commits: dropping an
//! uncommitted reservation returns the budget, so failed or retried
//! attempts never eat the initiator's limit.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use finledger_core::Currency;
use rust_decimal::Decimal;

use crate::config::PostingConfig;
use crate::error::LedgerError;

#[derive(Debug, Default, Clone)]
struct LimitUsage {
    count: u32,
    total: Decimal,
}

type LimitKey = (String, NaiveDate, String);

/// In-memory daily usage tracker
#[derive(Default)]
pub struct DailyLimits {
    usage: Mutex<HashMap<LimitKey, LimitUsage>>,
}

/// A slice of daily budget held for one in-flight posting.
///
/// Returned on drop unless `commit` is called, mirroring how the rest of a
/// failed posting leaves no trace behind.
#[must_use = "an unheld reservation reserves nothing"]
pub struct LimitReservation<'a> {
    limits: &'a DailyLimits,
    key: LimitKey,
    amount: Decimal,
    committed: bool,
}

impl LimitReservation<'_> {
    /// Make the reserved usage permanent
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for LimitReservation<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let mut usage = self.limits.usage.lock().expect("limits lock poisoned");
        if let Some(entry) = usage.get_mut(&self.key) {
            entry.count = entry.count.saturating_sub(1);
            entry.total -= self.amount;
            tracing::debug!(
                initiator = %self.key.0,
                count = entry.count,
                total = %entry.total,
                "Returned unused daily limit reservation"
            );
        }
    }
}

impl DailyLimits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the initiator's limits and reserve the usage if allowed.
    ///
    /// The check and the reservation happen under one lock, so concurrent
    /// postings from the same initiator cannot both slip under the ceiling.
    /// Call `commit` on the reservation once the posting is durable.
    pub fn reserve(
        &self,
        initiator: &str,
        currency: &Currency,
        amount: Decimal,
        config: &PostingConfig,
    ) -> Result<LimitReservation<'_>, LedgerError> {
        self.reserve_on(Utc::now().date_naive(), initiator, currency, amount, config)
    }

    fn reserve_on(
        &self,
        today: NaiveDate,
        initiator: &str,
        currency: &Currency,
        amount: Decimal,
        config: &PostingConfig,
    ) -> Result<LimitReservation<'_>, LedgerError> {
        let key = (
            initiator.to_string(),
            today,
            currency.code().to_string(),
        );

        let mut usage = self.usage.lock().expect("limits lock poisoned");
        // Keys from previous days are dead weight once the day rolls over
        usage.retain(|(_, date, _), _| *date == today);

        let entry = usage.entry(key.clone()).or_default();

        if entry.count >= config.daily_count_limit {
            return Err(LedgerError::LimitExceeded {
                initiator: initiator.to_string(),
                kind: "count",
                limit: config.daily_count_limit.to_string(),
            });
        }

        let new_total = entry.total + amount;
        if new_total > config.daily_amount_limit {
            return Err(LedgerError::LimitExceeded {
                initiator: initiator.to_string(),
                kind: "amount",
                limit: config.daily_amount_limit.to_string(),
            });
        }

        entry.count += 1;
        entry.total = new_total;

        tracing::debug!(
            initiator,
            count = entry.count,
            total = %entry.total,
            currency = %currency,
            "Reserved daily transaction limits"
        );

        Ok(LimitReservation {
            limits: self,
            key,
            amount,
            committed: false,
        })
    }
}
