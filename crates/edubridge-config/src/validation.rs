// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::{CacheBackend, EdubridgeConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Upper bound for `loader.inactive_after_days`, about a century.
pub const MAX_INACTIVE_AFTER_DAYS: i64 = 36_500;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &EdubridgeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let portal = &config.portal;
    if portal.domain.trim().is_empty() {
        fail("portal.domain must not be empty".to_string());
    }
    if portal.scheme != "https" && portal.scheme != "http" {
        fail(format!(
            "portal.scheme must be `https` or `http`, got `{}`",
            portal.scheme
        ));
    }
    if portal.request_timeout_secs == 0 {
        fail("portal.request_timeout_secs must be greater than 0".to_string());
    }
    if portal.connect_timeout_secs == 0 {
        fail("portal.connect_timeout_secs must be greater than 0".to_string());
    }

    if config.cache.enabled
        && config.cache.backend == CacheBackend::Sqlite
        && config.cache.sqlite_path.trim().is_empty()
    {
        fail("cache.sqlite_path must not be empty when backend is `sqlite`".to_string());
    }

    if config.storage.enabled && config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let loader = &config.loader;
    if loader.workers == 0 {
        fail("loader.workers must be at least 1".to_string());
    }
    if loader.max_attempts == 0 {
        fail("loader.max_attempts must be at least 1".to_string());
    }
    if !(0..=MAX_INACTIVE_AFTER_DAYS).contains(&loader.inactive_after_days) {
        fail(format!(
            "loader.inactive_after_days must be between 0 and {MAX_INACTIVE_AFTER_DAYS}, got {}",
            loader.inactive_after_days
        ));
    }
    if loader.initial_backoff_secs > loader.max_backoff_secs {
        fail(format!(
            "loader.initial_backoff_secs ({}) must not exceed loader.max_backoff_secs ({})",
            loader.initial_backoff_secs, loader.max_backoff_secs
        ));
    }
    if loader.keepalive_enabled && loader.keepalive_interval_secs == 0 {
        fail("loader.keepalive_interval_secs must be greater than 0".to_string());
    }

    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        fail(format!(
            "logging.level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.logging.level
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
