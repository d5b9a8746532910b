//! Cache key naming scheme.
//!
//! Five families of keys, byte-exact as the synchronization protocol
//! requires (peers compare literal strings; there is no schema
//! negotiation, so a single typo here would silently desynchronize a
//! fleet).

use std::fmt;

/// A cache key in the shell-sync keyspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShellCacheKey<'a> {
    /// Heartbeat: latest release-or-reload id published by any peer.
    ShellChanged,
    /// Latest reload id whose target tenant did not yet exist locally.
    ShellCreated,
    /// Latest release id for a named tenant.
    TenantRelease(&'a str),
    /// Latest reload id for a named tenant.
    TenantReload(&'a str),
}

impl fmt::Display for ShellCacheKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellCacheKey::ShellChanged => write!(f, "SHELL_CHANGED_ID"),
            ShellCacheKey::ShellCreated => write!(f, "SHELL_CREATED_ID"),
            ShellCacheKey::TenantRelease(name) => write!(f, "{name}_RELEASE_ID"),
            ShellCacheKey::TenantReload(name) => write!(f, "{name}_RELOAD_ID"),
        }
    }
}

impl ShellCacheKey<'_> {
    /// Render the byte-exact cache key string.
    pub fn as_key(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_byte_exact_keys() {
        assert_eq!(ShellCacheKey::ShellChanged.as_key(), "SHELL_CHANGED_ID");
        assert_eq!(ShellCacheKey::ShellCreated.as_key(), "SHELL_CREATED_ID");
        assert_eq!(
            ShellCacheKey::TenantRelease("Acme").as_key(),
            "Acme_RELEASE_ID"
        );
        assert_eq!(
            ShellCacheKey::TenantReload("Acme").as_key(),
            "Acme_RELOAD_ID"
        );
    }
}
