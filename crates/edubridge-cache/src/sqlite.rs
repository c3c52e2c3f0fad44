// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed cache store shared across restarts.
//!
//! Entries live in a single `cache_entries` table keyed by cache key, with the
//! expiry stored as Unix milliseconds. All access goes through the single
//! tokio-rusqlite background thread.

use std::time::Duration;

use async_trait::async_trait;
use edubridge_core::{CacheStore, PortalError};
use tracing::debug;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS cache_entries (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL,
    expires_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_cache_entries_expires_at ON cache_entries(expires_at);";

/// Convert a tokio-rusqlite error into PortalError::Cache.
fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> PortalError {
    PortalError::Cache {
        source: Box::new(e),
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn deadline_millis(ttl: Duration) -> i64 {
    let ttl = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    now_millis().saturating_add(ttl)
}

pub struct SqliteCacheStore {
    conn: tokio_rusqlite::Connection,
}

impl SqliteCacheStore {
    /// Wrap an open connection, creating the table if needed.
    pub async fn new(conn: tokio_rusqlite::Connection) -> Result<Self, PortalError> {
        conn.call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch(SCHEMA) })
            .await
            .map_err(map_tr_err)?;
        Ok(Self { conn })
    }

    /// Open (or create) the cache database at `path`.
    pub async fn open(path: &str) -> Result<Self, PortalError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| PortalError::Cache {
                source: Box::new(e),
            })?;
        }
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| PortalError::Cache {
                source: Box::new(e),
            })?;
        Self::new(conn).await
    }

    pub async fn open_in_memory() -> Result<Self, PortalError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| PortalError::Cache {
                source: Box::new(e),
            })?;
        Self::new(conn).await
    }

    /// Delete every expired row. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<usize, PortalError> {
        let now = now_millis();
        let removed = self
            .conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "DELETE FROM cache_entries WHERE expires_at <= ?1",
                    rusqlite::params![now],
                )
            })
            .await
            .map_err(map_tr_err)?;
        debug!(removed, "expired cache entries purged");
        Ok(removed)
    }
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn exists(&self, key: &str) -> Result<bool, PortalError> {
        let key = key.to_string();
        let now = now_millis();
        self.conn
            .call(move |conn| -> Result<bool, rusqlite::Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM cache_entries WHERE key = ?1 AND expires_at > ?2",
                    rusqlite::params![key, now],
                    |row| row.get(0),
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(map_tr_err)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, PortalError> {
        let key = key.to_string();
        let now = now_millis();
        self.conn
            .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT value FROM cache_entries WHERE key = ?1 AND expires_at > ?2",
                )?;
                let mut rows = stmt.query(rusqlite::params![key, now])?;
                match rows.next()? {
                    Some(row) => Ok(Some(row.get(0)?)),
                    None => Ok(None),
                }
            })
            .await
            .map_err(map_tr_err)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), PortalError> {
        let key = key.to_string();
        let expires_at = deadline_millis(ttl);
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO cache_entries (key, value, expires_at) VALUES (?1, ?2, ?3) \
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, \
                     expires_at = excluded.expires_at",
                    rusqlite::params![key, value, expires_at],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn delete(&self, key: &str) -> Result<(), PortalError> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "DELETE FROM cache_entries WHERE key = ?1",
                    rusqlite::params![key],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}
