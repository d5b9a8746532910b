//! External interfaces this core consumes.
//!
//! The tenant host, the persisted settings store, the distributed cache,
//! and the shell-context factory are all collaborators owned by the
//! integrating application (§6 of the design). Rather than thread four
//! separate generic type parameters through every struct in this crate,
//! they are bundled behind one [`ShellRuntime`] trait that an integrator
//! implements once; each method group below corresponds to one of the
//! spec's external interfaces.

use crate::error::ShellSyncResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Per-tenant configuration as understood by the host's settings store.
///
/// Minimal on purpose: this core only ever needs a tenant's name out of
/// its settings. The integrator's concrete settings type can (and will)
/// carry far more.
pub trait TenantSettings: Clone + Send + Sync + 'static {
    /// The tenant name this settings object belongs to.
    fn name(&self) -> &str;
}

/// A host-managed runtime container for one tenant.
///
/// Rebuilt on reload; released (torn down) on release. This core never
/// looks inside it except to ask for the distributed cache client.
pub trait ShellContext: Send + Sync + 'static {
    /// The distributed cache client for this context, or `None` if the
    /// distributed-cache feature is disabled for the tenant that built
    /// this context. In that case every core operation becomes a no-op.
    fn distributed_cache(&self) -> Option<Arc<dyn DistributedCache>>;
}

/// Key-value string API exposed by the shared distributed cache.
///
/// No TTL is ever set by this core; values persist until overwritten.
#[async_trait]
pub trait DistributedCache: Send + Sync {
    /// Read a string value, or `None` if the key is unset.
    async fn get_string(&self, key: &str) -> ShellSyncResult<Option<String>>;
    /// Overwrite a string value.
    async fn set_string(&self, key: &str, value: &str) -> ShellSyncResult<()>;
}

/// Bundled host + settings-store + shell-context-factory interface.
///
/// An integrator implements this once against their real tenant host,
/// settings persistence, and shell-context construction code.
#[async_trait]
pub trait ShellRuntime: Send + Sync + 'static {
    /// Concrete per-tenant settings type.
    type Settings: TenantSettings;
    /// Concrete shell context type.
    type Context: ShellContext;

    // -- Host: tenant lookup and mutation -----------------------------

    /// Look up the live shell context for `name`, if the tenant is
    /// currently running locally.
    async fn try_get_shell_context(&self, name: &str) -> Option<Arc<Self::Context>>;

    /// Look up the settings for `name`, if known locally.
    async fn try_get_settings(&self, name: &str) -> Option<Self::Settings>;

    /// Release the live shell context for `name`. When `event_source` is
    /// `false`, the host must not fire its own outbound release hook as a
    /// consequence (this is how the poller avoids feedback loops).
    async fn release_shell_context(&self, settings: &Self::Settings, event_source: bool);

    /// Rebuild the live shell context for `name` from its settings. Same
    /// `event_source` contract as `release_shell_context`.
    async fn reload_shell_context(&self, settings: &Self::Settings, event_source: bool);

    // -- Settings store ------------------------------------------------

    /// Enumerate all known tenant names.
    async fn load_settings_names(&self) -> ShellSyncResult<Vec<String>>;

    /// Load one tenant's settings by name.
    async fn load_settings(&self, name: &str) -> ShellSyncResult<Self::Settings>;

    /// Load the settings of every known tenant.
    async fn get_all_settings(&self) -> ShellSyncResult<Vec<Self::Settings>>;

    // -- Shell-context factory ------------------------------------------

    /// Build a fresh tenant context from settings.
    async fn create_shell_context(&self, settings: &Self::Settings) -> ShellSyncResult<Self::Context>;
}

pub mod mock;
