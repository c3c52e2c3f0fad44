// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stored accounts and the login seam used by the session loader.

use async_trait::async_trait;

use crate::error::PortalError;
use crate::types::StoredUser;

/// Source of previously stored portal accounts.
///
/// Passwords arrive already decrypted; encryption at rest is the store's concern.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Loads every stored account.
    async fn list_users(&self) -> Result<Vec<StoredUser>, PortalError>;

    /// Records that the account was just seen online.
    ///
    /// Unknown accounts are ignored.
    async fn mark_online(&self, server: &str, username: &str) -> Result<(), PortalError>;
}

/// Turns stored credentials into a live, authenticated session.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// The session handle produced by a successful login.
    type Session: Send + Sync + 'static;

    /// Logs in and performs the first user fetch.
    async fn authenticate(&self, user: &StoredUser) -> Result<Self::Session, PortalError>;

    /// Lightweight liveness probe. `Ok(false)` means the portal dropped the session.
    async fn ping(&self, session: &Self::Session) -> Result<bool, PortalError>;

    /// Releases the session. The default does nothing.
    async fn release(&self, _session: &Self::Session) {}
}
