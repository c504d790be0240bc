//! Fraud signal cache
//!
//! Rolling-window behavioral aggregates per subject (account, device,
//! merchant), held in a cache with per-kind TTL. Snapshots are advisory:
//! eviction loses nothing of record, and a cold subject simply reads as
//! baseline. The `SignalCache` trait is the seam for a distributed backend;
//! the in-memory implementation backs tests and single-node deployments.

pub mod cache;
pub mod config;
pub mod error;
pub mod memory;
pub mod snapshot;

pub use cache::SignalCache;
pub use config::SignalCacheConfig;
pub use error::CacheError;
pub use memory::InMemorySignalCache;
pub use snapshot::{SignalDelta, SignalSnapshot};
