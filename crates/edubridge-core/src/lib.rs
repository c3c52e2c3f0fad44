// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Edubridge portal client.
//!
//! This crate provides the error taxonomy, the small set of shared enums,
//! and the adapter traits used throughout the workspace. The portal client,
//! cache, and session loader all speak [`PortalError`].

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{PortalError, is_transient_message};
pub use types::{CacheKind, ClientState, HalfYear, StoredUser, registry_key};

pub use traits::{Authenticator, CacheStore, UserStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portal_error_has_all_variants() {
        let _unauthorized = PortalError::Unauthorized("test".into());
        let _transport = PortalError::Transport {
            message: "test".into(),
            source: None,
        };
        let _decode = PortalError::decode("test");
        let _scrape = PortalError::Scrape { pattern: "gsechash" };
        let _uninit = PortalError::Uninitialized("test".into());
        let _not_found = PortalError::NotFound {
            kind: "subject",
            id: "1".into(),
        };
        let _unchangeable = PortalError::Unchangeable {
            date: "2024-01-01".into(),
        };
        let _closed = PortalError::Closed;
        let _config = PortalError::Config("test".into());
        let _cache = PortalError::Cache {
            source: Box::new(std::io::Error::other("test")),
        };
        let _storage = PortalError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _internal = PortalError::Internal("test".into());
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_cache_store<T: CacheStore>() {}
        fn _assert_user_store<T: UserStore>() {}
        fn _assert_authenticator<T: Authenticator>() {}
    }
}
