//! Transaction validation
//!
//! Structural checks performed before any lock is taken or any account is
//! loaded. All failures here are `ValidationError`-class: rejected
//! synchronously and never retried.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::config::PostingConfig;
use crate::entry::LedgerEntry;
use crate::error::LedgerError;

/// Minimum entries for double-entry
pub const MIN_ENTRIES: usize = 2;

/// Validate entry count, amounts, and description bounds
pub fn validate_shape(
    entries: &[LedgerEntry],
    description: &str,
    config: &PostingConfig,
) -> Result<(), LedgerError> {
    if entries.len() < MIN_ENTRIES || entries.len() > config.max_entries {
        return Err(LedgerError::InvalidEntryCount {
            min: MIN_ENTRIES,
            max: config.max_entries,
            actual: entries.len(),
        });
    }

    for entry in entries {
        let value = entry.amount.value();
        if value <= Decimal::ZERO || value > config.max_amount {
            return Err(LedgerError::AmountOutOfRange {
                amount: value,
                max: config.max_amount,
            });
        }
    }

    if description.trim().is_empty() {
        return Err(LedgerError::InvalidDescription(
            "description cannot be empty".to_string(),
        ));
    }
    if description.len() > config.max_description_len {
        return Err(LedgerError::InvalidDescription(format!(
            "description exceeds {} characters",
            config.max_description_len
        )));
    }

    Ok(())
}

/// Validate the double-entry invariant: signed amounts sum to zero per
/// currency across all entries.
pub fn validate_balance(entries: &[LedgerEntry]) -> Result<(), LedgerError> {
    let mut sums: HashMap<&str, Decimal> = HashMap::new();

    for entry in entries {
        *sums.entry(entry.currency.code()).or_insert(Decimal::ZERO) += entry.signed_amount();
    }

    for (currency, imbalance) in sums {
        if !imbalance.is_zero() {
            return Err(LedgerError::ImbalancedEntries {
                currency: currency.to_string(),
                imbalance,
            });
        }
    }

    Ok(())
}
