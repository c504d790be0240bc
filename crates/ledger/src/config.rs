//! Posting configuration with configurable bounds
//!
//! All bounds are configurable via file/env, not hardcoded.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Configuration for the posting engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingConfig {
    /// Maximum amount per entry
    #[serde(default = "default_max_amount")]
    pub max_amount: Decimal,

    /// Maximum number of entries per transaction
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Maximum description length
    #[serde(default = "default_max_description_len")]
    pub max_description_len: usize,

    /// Daily transaction count limit per initiator
    #[serde(default = "default_daily_count_limit")]
    pub daily_count_limit: u32,

    /// Daily transaction amount limit per initiator and currency
    #[serde(default = "default_daily_amount_limit")]
    pub daily_amount_limit: Decimal,
}

fn default_max_amount() -> Decimal {
    // ~1 trillion
    Decimal::new(99_999_999_999_999, 2)
}

fn default_max_entries() -> usize {
    100
}

fn default_max_description_len() -> usize {
    500
}

fn default_daily_count_limit() -> u32 {
    100
}

fn default_daily_amount_limit() -> Decimal {
    Decimal::new(1_000_000, 0)
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            max_amount: default_max_amount(),
            max_entries: default_max_entries(),
            max_description_len: default_max_description_len(),
            daily_count_limit: default_daily_count_limit(),
            daily_amount_limit: default_daily_amount_limit(),
        }
    }
}
