//! # shellsync
//!
//! A distributed tenant-shell synchronization core for multi-tenant hosts
//! running the same tenant set across peer processes.
//!
//! Peers never talk to each other directly. Convergence happens through a
//! shared distributed key-value cache: each process publishes opaque
//! identifiers into the cache when it mutates a tenant (release, reload,
//! creation), and every process's background poller detects divergence
//! against the last identifiers it observed and replays the matching
//! local action.
//!
//! ## Architecture
//!
//! - `ids`: opaque identifier generation
//! - `keyspace`: cache key naming scheme
//! - `locks`: per-tenant lock table
//! - `identifier_store`: last-observed identifiers per tenant
//! - `distributed_context`: refcounted handle to the default tenant's cache client
//! - `host`: the external interfaces this core consumes (tenant host,
//!   settings store, distributed cache, shell-context factory)
//! - `hooks`: the lifecycle hook handlers a host fires on load/release/reload
//! - `poller`: the background reconciliation loop
//! - `config`: runtime timing and naming configuration
//! - `error`: the error taxonomy shared across the crate
//!
//! An integrating application implements [`host::ShellRuntime`] once
//! against its real tenant host, settings persistence, and shell-context
//! construction code, then constructs [`hooks::ShellSyncHooks`] and
//! [`poller::ShellSyncPoller`] against it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod distributed_context;
pub mod error;
pub mod hooks;
pub mod host;
pub mod ids;
pub mod identifier_store;
pub mod keyspace;
pub mod locks;
pub mod poller;

pub use config::ShellSyncConfig;
pub use distributed_context::DistributedContext;
pub use error::{ShellSyncError, ShellSyncResult};
pub use hooks::ShellSyncHooks;
pub use host::{DistributedCache, ShellContext, ShellRuntime, TenantSettings};
pub use ids::IdentifierGenerator;
pub use identifier_store::{IdentifierTable, ShellIdentifier};
pub use keyspace::ShellCacheKey;
pub use locks::TenantLockTable;
pub use poller::{LifecycleHandle, LifecycleState, ShellSyncPoller};

/// Crate version, re-exported for diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name, re-exported for diagnostics.
pub const NAME: &str = env!("CARGO_PKG_NAME");
