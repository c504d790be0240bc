//! In-memory signal cache
//!
//! Single-node implementation with lazy TTL expiry: an expired snapshot is
//! dropped on the read that observes it, so a subject quietly returns to
//! baseline. Carries fault-injection knobs (unavailability, added latency)
//! for exercising fail-open/fail-closed paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use finledger_core::SubjectKey;
use tokio::time::Instant;

use crate::cache::SignalCache;
use crate::config::SignalCacheConfig;
use crate::error::CacheError;
use crate::snapshot::{SignalDelta, SignalSnapshot};

struct CachedEntry {
    snapshot: SignalSnapshot,
    stored_at: Instant,
}

pub struct InMemorySignalCache {
    entries: Mutex<HashMap<SubjectKey, CachedEntry>>,
    config: SignalCacheConfig,
    unavailable: AtomicBool,
    /// Added latency per operation, for timeout tests
    delay_ms: AtomicU64,
}

impl InMemorySignalCache {
    pub fn new(config: SignalCacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            config,
            unavailable: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
        }
    }

    /// Simulate a cache outage
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Add fixed latency to every operation
    pub fn set_delay_ms(&self, delay_ms: u64) {
        self.delay_ms.store(delay_ms, Ordering::SeqCst);
    }

    async fn simulate_backend(&self) -> Result<(), CacheError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("cache offline".to_string()));
        }
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Ok(())
    }

    fn is_expired(&self, subject: &SubjectKey, entry: &CachedEntry) -> bool {
        entry.stored_at.elapsed() >= self.config.ttl_for(subject.kind)
    }
}

#[async_trait]
impl SignalCache for InMemorySignalCache {
    async fn get(&self, subject: &SubjectKey) -> Result<Option<SignalSnapshot>, CacheError> {
        self.simulate_backend().await?;

        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(subject) {
            Some(entry) if self.is_expired(subject, entry) => {
                tracing::debug!(%subject, "Snapshot expired, evicting");
                entries.remove(subject);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.snapshot.clone())),
            None => Ok(None),
        }
    }

    async fn apply(
        &self,
        subject: &SubjectKey,
        delta: SignalDelta,
    ) -> Result<SignalSnapshot, CacheError> {
        self.simulate_backend().await?;

        // Merge under the map lock so concurrent increments serialize here
        // rather than racing through a read-modify-write at the caller.
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        let base = match entries.get(subject) {
            Some(entry) if !self.is_expired(subject, entry) => entry.snapshot.clone(),
            _ => SignalSnapshot::baseline(),
        };
        let merged = base.merged(&delta);
        entries.insert(
            subject.clone(),
            CachedEntry {
                snapshot: merged.clone(),
                stored_at: Instant::now(),
            },
        );
        Ok(merged)
    }
}
