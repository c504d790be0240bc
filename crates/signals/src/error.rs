//! Cache errors
//!
//! Cache failures are recoverable by design: callers degrade per their fail
//! policy instead of propagating these upward.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Signal cache unavailable: {0}")]
    Unavailable(String),

    #[error("Signal cache operation exceeded {0}ms")]
    Timeout(u64),
}
