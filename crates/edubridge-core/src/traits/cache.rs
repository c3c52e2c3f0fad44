// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store backing the snapshot cache.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::PortalError;

/// External key-value store holding JSON snapshots with per-entry expiry.
///
/// Implementations must treat expired entries as absent.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Returns `true` if a live entry exists for `key`.
    async fn exists(&self, key: &str) -> Result<bool, PortalError>;

    /// Returns the raw stored value, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, PortalError>;

    /// Stores `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), PortalError>;

    /// Removes the entry for `key`, if any.
    async fn delete(&self, key: &str) -> Result<(), PortalError>;
}
