// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Edubridge workspace.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Grading period selector used by the results endpoint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum HalfYear {
    /// First half of the school year.
    P1,
    /// Second half of the school year.
    P2,
    /// The whole school year.
    RX,
}

/// Category of a cached entity, used to pick a TTL.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CacheKind {
    Timeline,
    Timetable,
    Results,
    Dbi,
}

/// Lifecycle state of a portal client.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum ClientState {
    /// Logged in, but no user page has been fetched yet.
    Uninitialized,
    /// The first user fetch succeeded and the session token is known.
    Authenticated,
    /// A call was rejected as unauthorized; the owner must log in again.
    Stale,
    /// Closed by the owner.
    Closed,
}

/// A previously stored portal account, as handed to the session loader.
#[derive(Debug, Clone)]
pub struct StoredUser {
    /// Portal server, either a school subdomain (`myschool`) or a full host.
    pub server: String,
    pub username: String,
    /// Plain-text password. `None` when the store has no password for this account.
    pub password: Option<SecretString>,
    /// Last time the user was seen online, if ever.
    pub last_online: Option<DateTime<Utc>>,
}

impl StoredUser {
    /// Registry key identifying this account (`server` + `username`).
    pub fn registry_key(&self) -> String {
        registry_key(&self.server, &self.username)
    }
}

/// Compose the registry key for an account.
pub fn registry_key(server: &str, username: &str) -> String {
    format!("{server}{username}")
}
