//! Lifecycle hook handlers: `onLoading`, `onReleasing`, `onReloading`.
//!
//! These run on whatever task the host fires them from, concurrently with
//! each other and with the poller. State shared with the poller (the lock
//! table, the identifier table, the heartbeat baseline, the shared
//! distributed context, the termination flag) lives in [`Shared`] so both
//! sides see the same tables.

use crate::config::ShellSyncConfig;
use crate::distributed_context::DistributedContext;
use crate::host::{ShellContext, ShellRuntime};
use crate::ids::IdentifierGenerator;
use crate::identifier_store::IdentifierTable;
use crate::keyspace::ShellCacheKey;
use crate::locks::TenantLockTable;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Tables and flags shared between [`ShellSyncHooks`] and the poller.
pub(crate) struct Shared<R: ShellRuntime> {
    pub(crate) runtime: Arc<R>,
    pub(crate) config: ShellSyncConfig,
    pub(crate) locks: TenantLockTable,
    pub(crate) identifiers: IdentifierTable,
    pub(crate) ids: IdentifierGenerator,
    /// The poller's current distributed context, if one has been built.
    /// Hooks read and opportunistically acquire it; only the poller
    /// installs or replaces it.
    pub(crate) context: RwLock<Option<DistributedContext<R::Context>>>,
    /// Last heartbeat value `onLoading` primed or the poller observed.
    pub(crate) shell_changed_id: RwLock<Option<String>>,
    /// Last `SHELL_CREATED_ID` value `onLoading` primed or the poller observed.
    pub(crate) shell_created_id: RwLock<Option<String>>,
    pub(crate) terminated: AtomicBool,
}

impl<R: ShellRuntime> Shared<R> {
    fn new(runtime: Arc<R>, config: ShellSyncConfig) -> Self {
        Self {
            runtime,
            config,
            locks: TenantLockTable::new(),
            identifiers: IdentifierTable::new(),
            ids: IdentifierGenerator,
            context: RwLock::new(None),
            shell_changed_id: RwLock::new(None),
            shell_created_id: RwLock::new(None),
            terminated: AtomicBool::new(false),
        }
    }

    fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Shared preamble for all three hooks: locate the default tenant's
    /// settings and a live context for it, then acquire a distributed
    /// context handle (the poller's shared one if still live, otherwise
    /// a one-shot built just for this call). Returns `None` if any step
    /// fails, meaning the caller should no-op.
    async fn acquire_for_hook(&self) -> Option<DistributedContext<R::Context>> {
        if self.is_terminated() {
            return None;
        }

        let default_name = self.config.default_tenant_name.as_str();
        let settings = self.runtime.try_get_settings(default_name).await?;
        self.runtime.try_get_shell_context(default_name).await?;

        let shared = {
            let slot = self.context.read().await;
            slot.as_ref().and_then(|ctx| ctx.acquire())
        };
        let handle = match shared {
            Some(handle) => handle,
            None => {
                let built = self.runtime.create_shell_context(&settings).await.ok()?;
                DistributedContext::new(Arc::new(built))
            }
        };

        if handle.context().distributed_cache().is_none() {
            handle.release();
            return None;
        }
        Some(handle)
    }
}

/// Handle to the three lifecycle hooks an integrator registers with its
/// host. Cheap to clone: internally `Arc`-backed.
pub struct ShellSyncHooks<R: ShellRuntime> {
    pub(crate) shared: Arc<Shared<R>>,
}

impl<R: ShellRuntime> Clone for ShellSyncHooks<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R: ShellRuntime> ShellSyncHooks<R> {
    /// Build hook handlers (and the shared tables the poller will also
    /// use) against `runtime`.
    pub fn new(runtime: Arc<R>, config: ShellSyncConfig) -> Self {
        Self {
            shared: Arc::new(Shared::new(runtime, config)),
        }
    }

    pub(crate) fn shared(&self) -> Arc<Shared<R>> {
        Arc::clone(&self.shared)
    }

    /// Invoked once when the host is about to enumerate tenants. Primes
    /// the heartbeat baseline and every tenant's recorded identifiers so
    /// the poller does not treat pre-existing cache state as a change.
    pub async fn on_loading(&self) {
        let Some(handle) = self.shared.acquire_for_hook().await else {
            return;
        };
        let cache = handle.context().distributed_cache().expect("checked above");

        let result: Result<(), crate::error::ShellSyncError> = async {
            let changed = cache.get_string(&ShellCacheKey::ShellChanged.as_key()).await?;
            *self.shared.shell_changed_id.write().await = changed;

            let created = cache.get_string(&ShellCacheKey::ShellCreated.as_key()).await?;
            *self.shared.shell_created_id.write().await = created;

            let names = self.shared.runtime.load_settings_names().await?;
            for name in names {
                let release_id = cache
                    .get_string(&ShellCacheKey::TenantRelease(&name).as_key())
                    .await?;
                let reload_id = cache
                    .get_string(&ShellCacheKey::TenantReload(&name).as_key())
                    .await?;
                let record = self.shared.identifiers.get_or_create(&name);
                if release_id.is_some() {
                    record.write().release_id = release_id;
                }
                if reload_id.is_some() {
                    record.write().reload_id = reload_id;
                }
            }
            Ok(())
        }
        .await;

        if let Err(err) = result {
            tracing::warn!(error = %err, "onLoading: failed to prime baseline from cache");
        }

        handle.release();
    }

    /// Invoked before the host releases a tenant that was mutated locally.
    pub async fn on_releasing(&self, name: &str) {
        let Some(handle) = self.shared.acquire_for_hook().await else {
            return;
        };
        let cache = handle.context().distributed_cache().expect("checked above");

        let lock = self.shared.locks.get_or_create(name);
        let _guard = lock.lock().await;

        let id = self.shared.ids.generate();
        self.shared.identifiers.get_or_create(name).write().release_id = Some(id.clone());

        if let Err(err) = cache
            .set_string(&ShellCacheKey::TenantRelease(name).as_key(), &id)
            .await
        {
            tracing::warn!(tenant = %name, error = %err, "onReleasing: failed to publish release id");
        }
        if let Err(err) = cache.set_string(&ShellCacheKey::ShellChanged.as_key(), &id).await {
            tracing::warn!(tenant = %name, error = %err, "onReleasing: failed to publish heartbeat");
        }

        drop(_guard);
        handle.release();
    }

    /// Invoked before the host reloads a tenant.
    pub async fn on_reloading(&self, name: &str) {
        let Some(handle) = self.shared.acquire_for_hook().await else {
            return;
        };
        let cache = handle.context().distributed_cache().expect("checked above");

        let lock = self.shared.locks.get_or_create(name);
        let _guard = lock.lock().await;

        let id = self.shared.ids.generate();
        self.shared.identifiers.get_or_create(name).write().reload_id = Some(id.clone());

        if let Err(err) = cache
            .set_string(&ShellCacheKey::TenantReload(name).as_key(), &id)
            .await
        {
            tracing::warn!(tenant = %name, error = %err, "onReloading: failed to publish reload id");
        }

        let is_newly_created = name != self.shared.config.default_tenant_name
            && self.shared.runtime.try_get_settings(name).await.is_none();
        if is_newly_created {
            if let Err(err) = cache.set_string(&ShellCacheKey::ShellCreated.as_key(), &id).await {
                tracing::warn!(tenant = %name, error = %err, "onReloading: failed to publish creation id");
            }
        }

        if let Err(err) = cache.set_string(&ShellCacheKey::ShellChanged.as_key(), &id).await {
            tracing::warn!(tenant = %name, error = %err, "onReloading: failed to publish heartbeat");
        }

        drop(_guard);
        handle.release();
    }
}
