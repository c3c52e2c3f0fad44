// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Edubridge portal client.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use edubridge_core::CacheKind;
use serde::{Deserialize, Serialize};

/// Top-level Edubridge configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EdubridgeConfig {
    /// Portal transport settings.
    #[serde(default)]
    pub portal: PortalConfig,

    /// Snapshot cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Stored user records.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Bulk session loader and keepalive settings.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Credential encryption toggle.
    #[serde(default)]
    pub encryption: EncryptionConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Portal transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PortalConfig {
    /// Domain appended to bare school subdomains.
    #[serde(default = "default_domain")]
    pub domain: String,

    /// URL scheme used to reach the portal.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Whole-request timeout in seconds. Bounds hung HTTP calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// TCP connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            scheme: default_scheme(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl PortalConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_domain() -> String {
    "edupage.org".to_string()
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    concat!("edubridge/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Cache backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Process-local map; lost on restart.
    #[default]
    Memory,
    /// SQLite file shared across restarts.
    Sqlite,
}

/// Snapshot cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Whether handlers consult the cache at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Which store holds the snapshots.
    #[serde(default)]
    pub backend: CacheBackend,

    /// SQLite file used when `backend = "sqlite"`.
    #[serde(default = "default_cache_path")]
    pub sqlite_path: String,

    /// Per-kind expiry.
    #[serde(default)]
    pub ttl: TtlConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: CacheBackend::default(),
            sqlite_path: default_cache_path(),
            ttl: TtlConfig::default(),
        }
    }
}

fn default_cache_path() -> String {
    dirs::cache_dir()
        .map(|d| d.join("edubridge/cache.db").display().to_string())
        .unwrap_or_else(|| "edubridge-cache.db".to_string())
}

/// Per-kind cache expiry in seconds. Zero disables caching for that kind.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TtlConfig {
    #[serde(default = "default_ttl_timeline")]
    pub timeline: u64,

    #[serde(default = "default_ttl_timetable")]
    pub timetable: u64,

    #[serde(default = "default_ttl_results")]
    pub results: u64,

    #[serde(default = "default_ttl_dbi")]
    pub dbi: u64,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            timeline: default_ttl_timeline(),
            timetable: default_ttl_timetable(),
            results: default_ttl_results(),
            dbi: default_ttl_dbi(),
        }
    }
}

impl TtlConfig {
    /// Configured expiry for `kind`.
    pub fn for_kind(&self, kind: CacheKind) -> Duration {
        let secs = match kind {
            CacheKind::Timeline => self.timeline,
            CacheKind::Timetable => self.timetable,
            CacheKind::Results => self.results,
            CacheKind::Dbi => self.dbi,
        };
        Duration::from_secs(secs)
    }
}

fn default_ttl_timeline() -> u64 {
    300
}

fn default_ttl_timetable() -> u64 {
    3600
}

fn default_ttl_results() -> u64 {
    900
}

fn default_ttl_dbi() -> u64 {
    86_400
}

/// Stored user records.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Whether stored users are loaded at startup.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path to the SQLite database holding user records.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("edubridge/edubridge.db").display().to_string())
        .unwrap_or_else(|| "edubridge.db".to_string())
}

/// Bulk session loader and keepalive configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderConfig {
    /// Number of concurrent login workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Users not seen online for longer than this are skipped.
    #[serde(default = "default_inactive_after_days")]
    pub inactive_after_days: i64,

    /// Login attempts per user, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles after each failure.
    #[serde(default = "default_initial_backoff_secs")]
    pub initial_backoff_secs: u64,

    /// Upper bound for a single backoff delay.
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,

    /// Whether registered sessions are pinged periodically.
    #[serde(default = "default_true")]
    pub keepalive_enabled: bool,

    /// Seconds between keepalive pings.
    #[serde(default = "default_keepalive_interval_secs")]
    pub keepalive_interval_secs: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            inactive_after_days: default_inactive_after_days(),
            max_attempts: default_max_attempts(),
            initial_backoff_secs: default_initial_backoff_secs(),
            max_backoff_secs: default_max_backoff_secs(),
            keepalive_enabled: true,
            keepalive_interval_secs: default_keepalive_interval_secs(),
        }
    }
}

impl LoaderConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_secs(self.initial_backoff_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }
}

fn default_workers() -> usize {
    5
}

fn default_inactive_after_days() -> i64 {
    7
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_secs() -> u64 {
    2
}

fn default_max_backoff_secs() -> u64 {
    30
}

fn default_keepalive_interval_secs() -> u64 {
    600
}

/// Credential encryption toggle. Decryption itself happens in the user store.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptionConfig {
    #[serde(default)]
    pub enabled: bool,
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
