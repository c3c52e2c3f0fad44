// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./edubridge.toml` > `~/.config/edubridge/edubridge.toml`
//! > `/etc/edubridge/edubridge.toml` with environment variable overrides via the
//! `EDUBRIDGE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::EdubridgeConfig;

pub(crate) const SYSTEM_CONFIG: &str = "/etc/edubridge/edubridge.toml";
pub(crate) const LOCAL_CONFIG: &str = "edubridge.toml";
pub(crate) const USER_CONFIG: &str = "edubridge/edubridge.toml";

/// Sections addressable from the environment, longest prefix first.
const ENV_SECTIONS: &[(&str, &str)] = &[
    ("cache_ttl_", "cache.ttl."),
    ("portal_", "portal."),
    ("cache_", "cache."),
    ("storage_", "storage."),
    ("loader_", "loader."),
    ("encryption_", "encryption."),
    ("logging_", "logging."),
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/edubridge/edubridge.toml` (system-wide)
/// 3. `~/.config/edubridge/edubridge.toml` (user XDG config)
/// 4. `./edubridge.toml` (local directory)
/// 5. `EDUBRIDGE_*` environment variables
pub fn load_config() -> Result<EdubridgeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<EdubridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EdubridgeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<EdubridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EdubridgeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(EdubridgeConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join(USER_CONFIG))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` instead of `Env::split("_")` because keys contain
/// underscores: `EDUBRIDGE_LOADER_MAX_ATTEMPTS` must become
/// `loader.max_attempts`, not `loader.max.attempts`.
pub fn env_provider() -> Env {
    Env::prefixed("EDUBRIDGE_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
pub fn map_env_key(key: &str) -> String {
    for (prefix, section) in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(prefix) {
            return format!("{section}{rest}");
        }
    }
    key.to_string()
}
