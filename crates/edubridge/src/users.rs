// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed store of portal accounts.
//!
//! Accounts live in a `users` table keyed by `(server, username)`. When
//! encryption is enabled the whole database is opened as a SQLCipher file
//! keyed with the operator's passphrase.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edubridge_core::{PortalError, StoredUser, UserStore};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS users (
    server TEXT NOT NULL,
    username TEXT NOT NULL,
    password TEXT NOT NULL DEFAULT '',
    last_online TEXT,
    PRIMARY KEY (server, username)
);";

/// Convert a tokio-rusqlite error into PortalError::Storage.
fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> PortalError {
    PortalError::Storage {
        source: Box::new(e),
    }
}

pub struct SqliteUserStore {
    conn: tokio_rusqlite::Connection,
}

impl SqliteUserStore {
    /// Open (or create) the account database at `path`, unlocking it with `key` if given.
    pub async fn open(path: &str, key: Option<SecretString>) -> Result<Self, PortalError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| PortalError::Storage {
                source: Box::new(e),
            })?;
        }
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| PortalError::Storage {
                source: Box::new(e),
            })?;
        Self::init(conn, key).await
    }

    pub async fn open_in_memory() -> Result<Self, PortalError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| PortalError::Storage {
                source: Box::new(e),
            })?;
        Self::init(conn, None).await
    }

    async fn init(
        conn: tokio_rusqlite::Connection,
        key: Option<SecretString>,
    ) -> Result<Self, PortalError> {
        let key = key.map(|k| k.expose_secret().to_string());
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            if let Some(key) = key {
                conn.pragma_update(None, "key", key)?;
            }
            conn.execute_batch(SCHEMA)
        })
        .await
        .map_err(map_tr_err)?;
        Ok(Self { conn })
    }

    /// Insert or update an account.
    pub async fn upsert(&self, user: &StoredUser) -> Result<(), PortalError> {
        let server = user.server.clone();
        let username = user.username.clone();
        let password = user
            .password
            .as_ref()
            .map(|p| p.expose_secret().to_string())
            .unwrap_or_default();
        let last_online = user.last_online.map(|t| t.to_rfc3339());

        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT INTO users (server, username, password, last_online) \
                     VALUES (?1, ?2, ?3, ?4) \
                     ON CONFLICT(server, username) DO UPDATE SET \
                     password = excluded.password, last_online = excluded.last_online",
                    rusqlite::params![server, username, password, last_online],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!(server = %user.server, username = %user.username, "account stored");
        Ok(())
    }

    /// Record that `username` on `server` was just online.
    pub async fn touch(&self, server: &str, username: &str) -> Result<bool, PortalError> {
        let server = server.to_string();
        let username = username.to_string();
        let now = Utc::now().to_rfc3339();
        let updated = self
            .conn
            .call(move |conn| -> Result<usize, rusqlite::Error> {
                conn.execute(
                    "UPDATE users SET last_online = ?1 WHERE server = ?2 AND username = ?3",
                    rusqlite::params![now, server, username],
                )
            })
            .await
            .map_err(map_tr_err)?;
        Ok(updated > 0)
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn mark_online(&self, server: &str, username: &str) -> Result<(), PortalError> {
        if !self.touch(server, username).await? {
            debug!(server, username, "online mark for an unknown account");
        }
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<StoredUser>, PortalError> {
        let rows = self
            .conn
            .call(|conn| -> Result<Vec<(String, String, String, Option<String>)>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT server, username, password, last_online FROM users \
                     ORDER BY server, username",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(map_tr_err)?;

        Ok(rows
            .into_iter()
            .map(|(server, username, password, last_online)| {
                let last_online = last_online.and_then(|raw| parse_last_online(&raw, &username));
                StoredUser {
                    server,
                    username,
                    password: (!password.is_empty()).then(|| SecretString::from(password)),
                    last_online,
                }
            })
            .collect())
    }
}

fn parse_last_online(raw: &str, username: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(t) => Some(t.with_timezone(&Utc)),
        Err(e) => {
            warn!(username, value = raw, error = %e, "unreadable last_online, treating account as inactive");
            None
        }
    }
}
