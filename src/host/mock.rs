//! In-memory reference implementations of [`super::ShellRuntime`].
//!
//! These exist purely so this crate's own test suite can simulate a
//! multi-peer deployment (shared fake cache, independent per-peer tenant
//! sets) without a real cache driver or tenant host process. Mirrors
//! `InMemoryStore` in the teacher's cache-strategy module, which plays
//! the same role for `WriteThroughCache`.

use crate::error::{ShellSyncError, ShellSyncResult};
use crate::host::{DistributedCache, ShellContext, ShellRuntime, TenantSettings};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Settings for one mock tenant.
#[derive(Debug, Clone)]
pub struct MockSettings {
    name: String,
    /// Whether this tenant's shell context exposes a distributed cache
    /// client. When `false`, every core operation against it is a no-op.
    pub cache_enabled: bool,
}

impl MockSettings {
    /// Create settings for `name` with the distributed-cache feature on.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cache_enabled: true,
        }
    }

    /// Create settings for `name` with the distributed-cache feature off.
    pub fn without_cache(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cache_enabled: false,
        }
    }
}

impl TenantSettings for MockSettings {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A fake distributed cache: a shared string map with an injectable
/// failure switch, so tests can simulate a cache outage (§8, scenario S3).
#[derive(Default)]
pub struct MockCache {
    values: DashMap<String, String>,
    failing: AtomicBool,
}

impl MockCache {
    /// Create an empty, healthy cache.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Flip the injected-failure switch. While `true`, every read and
    /// write returns `ShellSyncError::Cache`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Direct read, bypassing the trait, for test assertions.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.clone())
    }
}

#[async_trait]
impl DistributedCache for MockCache {
    async fn get_string(&self, key: &str) -> ShellSyncResult<Option<String>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ShellSyncError::Cache(format!("injected failure reading {key}")));
        }
        Ok(self.values.get(key).map(|v| v.clone()))
    }

    async fn set_string(&self, key: &str, value: &str) -> ShellSyncResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ShellSyncError::Cache(format!("injected failure writing {key}")));
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A mock shell context: just carries (optionally) the shared cache.
pub struct MockContext {
    cache: Option<Arc<dyn DistributedCache>>,
}

impl ShellContext for MockContext {
    fn distributed_cache(&self) -> Option<Arc<dyn DistributedCache>> {
        self.cache.clone()
    }
}

/// One recorded `release`/`reload` call, for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// `"release"` or `"reload"`.
    pub op: &'static str,
    /// Tenant the call targeted.
    pub tenant: String,
    /// The `event_source` flag the caller passed.
    pub event_source: bool,
}

/// One peer's view of the tenant host: its own settings store and live
/// context set, wired to a cache that may be shared with other peers.
pub struct MockHost {
    cache: Arc<MockCache>,
    settings: DashMap<String, MockSettings>,
    contexts: DashMap<String, Arc<MockContext>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockHost {
    /// Create a peer backed by `cache`, with no tenants yet provisioned.
    pub fn new(cache: Arc<MockCache>) -> Self {
        Self {
            cache,
            settings: DashMap::new(),
            contexts: DashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Provision a tenant locally as running, with a freshly built
    /// context.
    pub fn provision(&self, settings: MockSettings) {
        let name = settings.name.clone();
        let context = Arc::new(MockContext {
            cache: if settings.cache_enabled {
                Some(Arc::clone(&self.cache) as Arc<dyn DistributedCache>)
            } else {
                None
            },
        });
        self.settings.insert(name.clone(), settings);
        self.contexts.insert(name, context);
    }

    /// Remove a tenant's live context without removing its settings,
    /// simulating a release that has not yet been reloaded.
    pub fn mark_not_running(&self, name: &str) {
        self.contexts.remove(name);
    }

    /// Register a tenant's settings in the persisted store without
    /// making it live, simulating a tenant another peer created that
    /// this host has not yet loaded.
    pub fn register_settings_only(&self, settings: MockSettings) {
        self.settings.insert(settings.name.clone(), settings);
    }

    /// Snapshot of every call this peer's host has received from the
    /// core (release/reload, with their `event_source` flag).
    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    /// The shared cache backing this peer.
    pub fn cache(&self) -> Arc<MockCache> {
        Arc::clone(&self.cache)
    }
}

#[async_trait]
impl ShellRuntime for MockHost {
    type Settings = MockSettings;
    type Context = MockContext;

    async fn try_get_shell_context(&self, name: &str) -> Option<Arc<Self::Context>> {
        self.contexts.get(name).map(|c| Arc::clone(&c))
    }

    async fn try_get_settings(&self, name: &str) -> Option<Self::Settings> {
        self.settings.get(name).map(|s| s.clone())
    }

    async fn release_shell_context(&self, settings: &Self::Settings, event_source: bool) {
        self.contexts.remove(&settings.name);
        self.calls.lock().await.push(RecordedCall {
            op: "release",
            tenant: settings.name.clone(),
            event_source,
        });
    }

    async fn reload_shell_context(&self, settings: &Self::Settings, event_source: bool) {
        self.provision(settings.clone());
        self.calls.lock().await.push(RecordedCall {
            op: "reload",
            tenant: settings.name.clone(),
            event_source,
        });
    }

    async fn load_settings_names(&self) -> ShellSyncResult<Vec<String>> {
        Ok(self.settings.iter().map(|e| e.key().clone()).collect())
    }

    async fn load_settings(&self, name: &str) -> ShellSyncResult<Self::Settings> {
        self.settings
            .get(name)
            .map(|s| s.clone())
            .ok_or_else(|| ShellSyncError::Settings(format!("no settings for {name}")))
    }

    async fn get_all_settings(&self) -> ShellSyncResult<Vec<Self::Settings>> {
        Ok(self
            .contexts
            .iter()
            .filter_map(|e| self.settings.get(e.key()).map(|s| s.clone()))
            .collect())
    }

    async fn create_shell_context(&self, settings: &Self::Settings) -> ShellSyncResult<Self::Context> {
        Ok(MockContext {
            cache: if settings.cache_enabled {
                Some(Arc::clone(&self.cache) as Arc<dyn DistributedCache>)
            } else {
                None
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn provision_makes_tenant_running_with_shared_cache() {
        let cache = MockCache::new();
        let host = MockHost::new(Arc::clone(&cache));
        host.provision(MockSettings::new("T1"));

        let ctx = host.try_get_shell_context("T1").await.unwrap();
        assert!(ctx.distributed_cache().is_some());
    }

    #[tokio::test]
    async fn cache_disabled_tenant_has_no_client() {
        let cache = MockCache::new();
        let host = MockHost::new(cache);
        host.provision(MockSettings::without_cache("T1"));

        let ctx = host.try_get_shell_context("T1").await.unwrap();
        assert!(ctx.distributed_cache().is_none());
    }

    #[tokio::test]
    async fn release_and_reload_are_recorded() {
        let cache = MockCache::new();
        let host = MockHost::new(cache);
        let settings = MockSettings::new("T1");
        host.provision(settings.clone());

        host.release_shell_context(&settings, false).await;
        host.reload_shell_context(&settings, true).await;

        let calls = host.recorded_calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].op, "release");
        assert!(!calls[0].event_source);
        assert_eq!(calls[1].op, "reload");
        assert!(calls[1].event_source);
    }

    #[tokio::test]
    async fn injected_cache_failure_surfaces_as_error() {
        let cache = MockCache::new();
        cache.set_failing(true);
        let result = cache.get_string("SHELL_CHANGED_ID").await;
        assert!(result.is_err());
    }
}
