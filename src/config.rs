//! Engine configuration: channel-to-kind bindings, per-channel concurrency
//! ceilings, and execution timeouts. Loaded from TOML; every field has a
//! default so an empty file is a valid configuration.

use crate::domain::transaction::TransactionKind;
use serde::Deserialize;
use std::time::Duration;

/// One ingress channel, bound to a single transaction kind at
/// configuration time.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
    /// Transport-side queue name.
    pub queue: String,
    /// Concurrent executions consumed from this channel.
    pub concurrency: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub deposit: ChannelConfig,
    pub withdrawal: ChannelConfig,
    pub transfer: ChannelConfig,
    /// Bound on the wait for an account row lock, in milliseconds.
    pub lock_wait_ms: u64,
    /// Capacity of each in-process channel feeding a consumer.
    pub queue_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            deposit: ChannelConfig {
                queue: "transactions.deposit".into(),
                concurrency: 4,
            },
            withdrawal: ChannelConfig {
                queue: "transactions.withdrawal".into(),
                concurrency: 4,
            },
            transfer: ChannelConfig {
                queue: "transactions.transfer".into(),
                concurrency: 4,
            },
            lock_wait_ms: 5_000,
            queue_depth: 64,
        }
    }
}

impl EngineConfig {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn lock_wait(&self) -> Duration {
        Duration::from_millis(self.lock_wait_ms)
    }

    pub fn channel(&self, kind: TransactionKind) -> &ChannelConfig {
        match kind {
            TransactionKind::Deposit => &self.deposit,
            TransactionKind::Withdrawal => &self.withdrawal,
            TransactionKind::Transfer => &self.transfer,
        }
    }
}
