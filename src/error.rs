//! Error taxonomy for the shell synchronization core.

use thiserror::Error;

/// Errors surfaced by shell-sync operations.
///
/// Fatal conditions (out-of-memory, stack overflow, access violation) are
/// deliberately not represented here; they are never caught, per the
/// error handling policy this crate follows.
#[derive(Error, Debug)]
pub enum ShellSyncError {
    /// Distributed cache read/write failed (transient connection or I/O error).
    #[error("cache error: {0}")]
    Cache(String),

    /// Settings store lookup or enumeration failed.
    #[error("settings error: {0}")]
    Settings(String),

    /// A host call (release/reload/get-context) failed.
    #[error("host error: {0}")]
    Host(String),

    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Uncategorized error.
    #[error("{0}")]
    Other(String),
}

/// Result type used throughout this crate.
pub type ShellSyncResult<T> = Result<T, ShellSyncError>;
