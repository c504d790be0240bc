//! Cache client contract

use async_trait::async_trait;
use finledger_core::SubjectKey;

use crate::error::CacheError;
use crate::snapshot::{SignalDelta, SignalSnapshot};

/// Client contract for the signal store.
///
/// `apply` must be atomic on the backend: callers never read-modify-write.
/// Absence (`None`) is a valid state meaning the subject is cold or its
/// snapshot expired.
#[async_trait]
pub trait SignalCache: Send + Sync {
    async fn get(&self, subject: &SubjectKey) -> Result<Option<SignalSnapshot>, CacheError>;

    /// Atomically merge the delta into the subject's snapshot, creating a
    /// baseline snapshot if the subject is cold. Returns the merged result.
    async fn apply(
        &self,
        subject: &SubjectKey,
        delta: SignalDelta,
    ) -> Result<SignalSnapshot, CacheError>;
}
