//! Runtime configuration for the poller and hook handlers.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Name reserved for the tenant whose settings configure the distributed
/// context (cache connection, serializer, etc).
pub const DEFAULT_TENANT_NAME: &str = "Default";

/// Timing and naming knobs for the shell synchronization core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShellSyncConfig {
    /// Polling cadence when the cache is healthy and nothing has changed.
    pub idle: Duration,
    /// Maximum uninterrupted per-tenant fan-out before yielding the loop.
    pub busy_max: Duration,
    /// Upper bound on adaptive backoff after repeated heartbeat failures.
    pub retry_max: Duration,
    /// Name of the reserved default tenant.
    pub default_tenant_name: String,
}

impl Default for ShellSyncConfig {
    fn default() -> Self {
        Self {
            idle: Duration::from_secs(1),
            busy_max: Duration::from_secs(2),
            retry_max: Duration::from_secs(60),
            default_tenant_name: DEFAULT_TENANT_NAME.to_string(),
        }
    }
}

impl ShellSyncConfig {
    /// Double a backoff interval, capping at `retry_max`.
    pub fn backoff(&self, current: Duration) -> Duration {
        std::cmp::min(current * 2, self.retry_max)
    }
}
