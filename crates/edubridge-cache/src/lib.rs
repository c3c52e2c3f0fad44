// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshot cache for portal entities.
//!
//! Entities are stored as plain JSON under `<school>:<user id>:<kind>` and
//! expire after the TTL configured for their kind. Two stores are provided:
//! [`MemoryCacheStore`] for a single process and [`SqliteCacheStore`] for a
//! cache that survives restarts.

pub mod cache;
pub mod key;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use edubridge_config::model::{CacheBackend, CacheConfig};
use edubridge_core::{CacheStore, PortalError};
use tracing::info;

pub use cache::{Cache, CacheRead};
pub use key::{CachePolicy, cache_key};
pub use memory::MemoryCacheStore;
pub use sqlite::SqliteCacheStore;

/// Open the store selected by `config.backend`.
pub async fn build_store(config: &CacheConfig) -> Result<Arc<dyn CacheStore>, PortalError> {
    let store: Arc<dyn CacheStore> = match config.backend {
        CacheBackend::Memory => Arc::new(MemoryCacheStore::new()),
        CacheBackend::Sqlite => Arc::new(SqliteCacheStore::open(&config.sqlite_path).await?),
    };
    info!(backend = store.name(), "cache store ready");
    Ok(store)
}

/// Build the configured cache, or `None` when caching is disabled.
pub async fn build_cache(config: &CacheConfig) -> Result<Option<Cache>, PortalError> {
    if !config.enabled {
        return Ok(None);
    }
    let store = build_store(config).await?;
    Ok(Some(Cache::new(store, CachePolicy::from_config(config))))
}
