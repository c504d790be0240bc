//! Cache configuration

use std::time::Duration;

use finledger_core::SubjectKind;
use serde::{Deserialize, Serialize};

/// TTL per subject kind plus the per-operation timeout callers apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalCacheConfig {
    #[serde(default = "default_account_ttl_secs")]
    pub account_ttl_secs: u64,
    #[serde(default = "default_device_ttl_secs")]
    pub device_ttl_secs: u64,
    #[serde(default = "default_merchant_ttl_secs")]
    pub merchant_ttl_secs: u64,
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

fn default_account_ttl_secs() -> u64 {
    3600
}

fn default_device_ttl_secs() -> u64 {
    86400
}

fn default_merchant_ttl_secs() -> u64 {
    1800
}

fn default_op_timeout_ms() -> u64 {
    50
}

impl Default for SignalCacheConfig {
    fn default() -> Self {
        Self {
            account_ttl_secs: default_account_ttl_secs(),
            device_ttl_secs: default_device_ttl_secs(),
            merchant_ttl_secs: default_merchant_ttl_secs(),
            op_timeout_ms: default_op_timeout_ms(),
        }
    }
}

impl SignalCacheConfig {
    pub fn ttl_for(&self, kind: SubjectKind) -> Duration {
        let secs = match kind {
            SubjectKind::Account => self.account_ttl_secs,
            SubjectKind::Device => self.device_ttl_secs,
            SubjectKind::Merchant => self.merchant_ttl_secs,
        };
        Duration::from_secs(secs)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}
