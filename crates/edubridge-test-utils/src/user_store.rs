// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`UserStore`] for loader tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edubridge_core::{PortalError, StoredUser, UserStore};
use tokio::sync::Mutex;

/// Holds accounts in a vector; can be told to fail the next listing.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<StoredUser>>,
    fail_with: Mutex<Option<String>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<StoredUser>) -> Self {
        Self {
            users: Mutex::new(users),
            fail_with: Mutex::new(None),
        }
    }

    pub async fn add(&self, user: StoredUser) {
        self.users.lock().await.push(user);
    }

    /// `last_online` of one account, if the account exists.
    pub async fn last_online(&self, server: &str, username: &str) -> Option<DateTime<Utc>> {
        self.users
            .lock()
            .await
            .iter()
            .find(|user| user.server == server && user.username == username)
            .and_then(|user| user.last_online)
    }

    /// The next `list_users` call fails with a storage error carrying `message`.
    pub async fn fail_next(&self, message: &str) {
        *self.fail_with.lock().await = Some(message.to_string());
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn list_users(&self) -> Result<Vec<StoredUser>, PortalError> {
        if let Some(message) = self.fail_with.lock().await.take() {
            return Err(PortalError::Storage {
                source: message.into(),
            });
        }
        Ok(self.users.lock().await.clone())
    }

    async fn mark_online(&self, server: &str, username: &str) -> Result<(), PortalError> {
        if let Some(user) = self
            .users
            .lock()
            .await
            .iter_mut()
            .find(|user| user.server == server && user.username == username)
        {
            user.last_online = Some(Utc::now());
        }
        Ok(())
    }
}
