//! Identifiers - accounts, transactions, fraud-signal subjects
//!
//! `TransactionId` doubles as the idempotency key: callers supply it once
//! per logical transaction and resubmissions with the same id resolve to
//! the original outcome.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Errors from identifier construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Identifier cannot be empty or blank")]
    Empty,
}

/// Ledger account identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Result<Self, IdError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Transaction identifier / idempotency key
///
/// Unique per transaction request. Duplicate submissions with the same key
/// must resolve to the same terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap a caller-supplied key
    pub fn of(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(IdError::Empty);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of subject a fraud signal is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Account,
    Device,
    Merchant,
}

impl SubjectKind {
    pub fn code(&self) -> &'static str {
        match self {
            SubjectKind::Account => "ACCOUNT",
            SubjectKind::Device => "DEVICE",
            SubjectKind::Merchant => "MERCHANT",
        }
    }
}

/// Key addressing a fraud-signal subject in the signal cache
///
/// Display format: `KIND:id`, e.g. `DEVICE:fp-19c3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectKey {
    pub kind: SubjectKind,
    pub id: String,
}

impl SubjectKey {
    pub fn new(kind: SubjectKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn account(id: impl Into<String>) -> Self {
        Self::new(SubjectKind::Account, id)
    }

    pub fn device(id: impl Into<String>) -> Self {
        Self::new(SubjectKind::Device, id)
    }

    pub fn merchant(id: impl Into<String>) -> Self {
        Self::new(SubjectKind::Merchant, id)
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.code(), self.id)
    }
}
