//! Background reconciliation loop.
//!
//! One task, owned by whoever calls [`ShellSyncPoller::run`], from service
//! start to shutdown. Polls the heartbeat key, and on divergence fans out
//! per-tenant reconciliation under the shared lock table.

use crate::hooks::{Shared, ShellSyncHooks};
use crate::host::ShellRuntime;
use crate::keyspace::ShellCacheKey;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::distributed_context::DistributedContext;

/// Lifecycle states the poller moves through exactly once, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed but has not yet entered the loop body.
    Starting,
    /// Executing the loop body.
    Running,
    /// Cancellation observed; draining before teardown.
    Terminating,
    /// Shared distributed context released; hooks now short-circuit.
    Terminated,
}

/// Readable snapshot of the poller's lifecycle state, safe to clone and
/// hand to callers who want to observe shutdown completion.
#[derive(Clone)]
pub struct LifecycleHandle {
    state: Arc<parking_lot::RwLock<LifecycleState>>,
}

impl LifecycleHandle {
    /// The poller's current lifecycle state.
    pub fn get(&self) -> LifecycleState {
        *self.state.read()
    }

    fn set(&self, state: LifecycleState) {
        *self.state.write() = state;
    }
}

/// The background reconciliation loop.
pub struct ShellSyncPoller<R: ShellRuntime> {
    shared: Arc<Shared<R>>,
    cancel: CancellationToken,
    lifecycle: LifecycleHandle,
    default_context_ref: Option<Arc<R::Context>>,
}

impl<R: ShellRuntime> ShellSyncPoller<R> {
    /// Build a poller sharing tables with `hooks`, stoppable via `cancel`.
    pub fn new(hooks: &ShellSyncHooks<R>, cancel: CancellationToken) -> Self {
        Self {
            shared: hooks.shared(),
            cancel,
            lifecycle: LifecycleHandle {
                state: Arc::new(parking_lot::RwLock::new(LifecycleState::Starting)),
            },
            default_context_ref: None,
        }
    }

    /// A cloneable handle for observing this poller's lifecycle state from
    /// outside the task that runs it.
    pub fn lifecycle(&self) -> LifecycleHandle {
        self.lifecycle.clone()
    }

    /// Run the loop until cancelled. Consumes the poller; intended to be
    /// driven by `tokio::spawn(poller.run())`.
    pub async fn run(mut self) {
        let mut idle = self.shared.config.idle;

        'poll: loop {
            self.lifecycle.set(LifecycleState::Running);

            // Step 1: idle wait, cancellable.
            tokio::select! {
                _ = tokio::time::sleep(idle) => {}
                _ = self.cancel.cancelled() => break 'poll,
            }

            // Step 2: default-tenant check.
            let default_name = self.shared.config.default_tenant_name.clone();
            let Some(default_ctx_arc) = self.shared.runtime.try_get_shell_context(&default_name).await else {
                continue 'poll;
            };

            // Step 3: context refresh.
            let needs_refresh = match &self.default_context_ref {
                Some(existing) => !Arc::ptr_eq(existing, &default_ctx_arc),
                None => true,
            };
            if needs_refresh {
                let Some(settings) = self.shared.runtime.try_get_settings(&default_name).await else {
                    continue 'poll;
                };
                match self.shared.runtime.create_shell_context(&settings).await {
                    Ok(new_ctx) => {
                        let new_distributed = DistributedContext::new(Arc::new(new_ctx));
                        let previous = self.shared.context.write().await.replace(new_distributed);
                        if let Some(prev) = previous {
                            prev.release();
                        }
                        self.default_context_ref = Some(default_ctx_arc);
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "poller: failed to rebuild default tenant context");
                        continue 'poll;
                    }
                }
            }

            // Step 4: cache availability.
            let cache = {
                let slot = self.shared.context.read().await;
                slot.as_ref().and_then(|ctx| ctx.context().distributed_cache())
            };
            let Some(cache) = cache else { continue 'poll };

            // Step 5: heartbeat read with adaptive backoff.
            let changed = match cache.get_string(&ShellCacheKey::ShellChanged.as_key()).await {
                Ok(v) => {
                    idle = self.shared.config.idle;
                    v
                }
                Err(err) => {
                    let was_capped = idle >= self.shared.config.retry_max;
                    idle = self.shared.config.backoff(idle);
                    if !was_capped && idle >= self.shared.config.retry_max {
                        tracing::error!(error = %err, "poller: heartbeat read failing, backoff capped at retry_max");
                    }
                    continue 'poll;
                }
            };

            // Step 6: divergence check.
            let diverged = {
                let mut guard = self.shared.shell_changed_id.write().await;
                match &changed {
                    None => false,
                    Some(v) => {
                        let differs = guard.as_deref() != Some(v.as_str());
                        if differs {
                            *guard = changed.clone();
                        }
                        differs
                    }
                }
            };
            if !diverged {
                continue 'poll;
            }

            // Step 7: creation check.
            let mut working_settings = match self.shared.runtime.get_all_settings().await {
                Ok(all) => all,
                Err(err) => {
                    tracing::warn!(error = %err, "poller: failed to enumerate live tenant settings");
                    continue 'poll;
                }
            };

            match cache.get_string(&ShellCacheKey::ShellCreated.as_key()).await {
                Ok(Some(created_id)) => {
                    let is_new = {
                        let mut guard = self.shared.shell_created_id.write().await;
                        let differs = guard.as_deref() != Some(created_id.as_str());
                        if differs {
                            *guard = Some(created_id);
                        }
                        differs
                    };
                    if is_new {
                        let names = match self.shared.runtime.load_settings_names().await {
                            Ok(names) => names,
                            Err(err) => {
                                tracing::warn!(error = %err, "poller: failed to reload tenant name list");
                                continue 'poll;
                            }
                        };
                        let live: std::collections::HashSet<String> =
                            working_settings.iter().map(|s| s.name().to_string()).collect();
                        for name in names {
                            if live.contains(&name) {
                                continue;
                            }
                            match self.shared.runtime.load_settings(&name).await {
                                Ok(settings) => working_settings.push(settings),
                                Err(err) => {
                                    tracing::warn!(tenant = %name, error = %err, "poller: failed to load settings for new tenant");
                                    continue 'poll;
                                }
                            }
                        }
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "poller: failed to read SHELL_CREATED_ID");
                    continue 'poll;
                }
            }

            // Step 8: tenant fan-out.
            let mut fan_out_start = Instant::now();
            for settings in &working_settings {
                if fan_out_start.elapsed() > self.shared.config.busy_max {
                    tokio::select! {
                        _ = tokio::time::sleep(self.shared.config.idle) => {}
                        _ = self.cancel.cancelled() => break 'poll,
                    }
                    fan_out_start = Instant::now();
                }

                let name = settings.name();
                let lock = self.shared.locks.get_or_create(name);
                let _guard = lock.lock().await;
                let record = self.shared.identifiers.get_or_create(name);

                match cache.get_string(&ShellCacheKey::TenantRelease(name).as_key()).await {
                    Ok(Some(release_id)) => {
                        let differs = record.read().release_id.as_deref() != Some(release_id.as_str());
                        if differs {
                            record.write().release_id = Some(release_id);
                            self.shared.runtime.release_shell_context(settings, false).await;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(tenant = %name, error = %err, "poller: cache read failed during fan-out");
                        break;
                    }
                }

                match cache.get_string(&ShellCacheKey::TenantReload(name).as_key()).await {
                    Ok(Some(reload_id)) => {
                        let differs = record.read().reload_id.as_deref() != Some(reload_id.as_str());
                        if differs {
                            record.write().reload_id = Some(reload_id);
                            self.shared.runtime.reload_shell_context(settings, false).await;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(tenant = %name, error = %err, "poller: cache read failed during fan-out");
                        break;
                    }
                }
            }
        }

        self.lifecycle.set(LifecycleState::Terminating);
        self.shared.terminated.store(true, Ordering::Release);
        let previous = self.shared.context.write().await.take();
        if let Some(ctx) = previous {
            ctx.release();
        }
        self.default_context_ref = None;
        self.lifecycle.set(LifecycleState::Terminated);
    }
}
