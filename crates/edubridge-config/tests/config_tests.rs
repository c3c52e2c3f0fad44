// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Edubridge configuration system.

use edubridge_config::diagnostic::ConfigError;
use edubridge_config::model::{CacheBackend, EdubridgeConfig};
use edubridge_config::{load_and_validate_str, load_config_from_path, load_config_from_str};

/// Valid TOML with all known sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[portal]
domain = "edupage.test"
request_timeout_secs = 12

[cache]
backend = "sqlite"
sqlite_path = "/tmp/cache.db"

[cache.ttl]
timeline = 60
dbi = 0

[storage]
database_path = "/tmp/users.db"

[loader]
workers = 2
max_attempts = 4

[encryption]
enabled = true

[logging]
level = "debug"
json = true
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.portal.domain, "edupage.test");
    assert_eq!(config.portal.request_timeout_secs, 12);
    assert_eq!(config.cache.backend, CacheBackend::Sqlite);
    assert_eq!(config.cache.ttl.timeline, 60);
    assert_eq!(config.cache.ttl.dbi, 0);
    // Untouched keys in a partially specified table keep their defaults.
    assert_eq!(config.cache.ttl.timetable, 3600);
    assert_eq!(config.storage.database_path, "/tmp/users.db");
    assert_eq!(config.loader.workers, 2);
    assert_eq!(config.loader.max_attempts, 4);
    assert_eq!(config.loader.initial_backoff_secs, 2);
    assert!(config.encryption.enabled);
    assert!(config.logging.json);
}

/// Missing sections fall back to compiled defaults.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML is valid");
    let defaults = EdubridgeConfig::default();
    assert_eq!(config.portal.domain, defaults.portal.domain);
    assert_eq!(config.loader.workers, 5);
    assert_eq!(config.loader.keepalive_interval_secs, 600);
    assert!(config.cache.enabled);
    assert!(!config.encryption.enabled);
}

/// A typo inside a nested table is reported with a suggestion.
#[test]
fn unknown_key_produces_suggestion() {
    let toml = r#"
[loader]
workres = 3
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown key");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            valid_keys,
            ..
        } => {
            assert_eq!(key, "workres");
            assert_eq!(suggestion.as_deref(), Some("workers"));
            assert!(valid_keys.contains("max_attempts"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Unknown top-level sections are rejected.
#[test]
fn deny_unknown_fields_at_top_level() {
    let toml = r#"
[meilisearch]
host = "localhost"
"#;
    assert!(load_config_from_str(toml).is_err());
}

/// Wrong value types become InvalidType diagnostics.
#[test]
fn invalid_type_is_reported() {
    let toml = r#"
[loader]
workers = "many"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject string workers");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("workers"))),
        "got {errors:?}"
    );
}

/// Semantic validation runs after a successful parse.
#[test]
fn validation_rejects_zero_workers() {
    let toml = r#"
[loader]
workers = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("zero workers is invalid");
    assert!(errors[0].to_string().contains("loader.workers"));
}

/// Environment variables override file values, including nested TTL keys.
#[test]
fn env_vars_override_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "edubridge.toml",
            r#"
[loader]
workers = 2

[cache.ttl]
timeline = 10
"#,
        )?;
        jail.set_env("EDUBRIDGE_LOADER_MAX_ATTEMPTS", "7");
        jail.set_env("EDUBRIDGE_CACHE_TTL_TIMELINE", "42");
        jail.set_env("EDUBRIDGE_PORTAL_DOMAIN", "portal.example");

        let config = load_config_from_path(std::path::Path::new("edubridge.toml"))
            .expect("config should load");
        assert_eq!(config.loader.workers, 2);
        assert_eq!(config.loader.max_attempts, 7);
        assert_eq!(config.cache.ttl.timeline, 42);
        assert_eq!(config.portal.domain, "portal.example");
        Ok(())
    });
}

/// Config errors render through miette without panicking.
#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let errors = load_and_validate_str("[portal]\ndomian = \"x\"\n").expect_err("typo");
    let handler = GraphicalReportHandler::new();
    let mut buf = String::new();
    let diagnostic: &dyn Diagnostic = &errors[0];
    handler
        .render_report(&mut buf, diagnostic)
        .expect("render should succeed");
    assert!(buf.contains("domian"));
}
