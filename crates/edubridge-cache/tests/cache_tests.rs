// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::collections::BTreeMap;

use edubridge_cache::{CacheRead, build_cache, build_store};
use edubridge_config::model::{CacheBackend, CacheConfig};

fn sqlite_config(path: &std::path::Path) -> CacheConfig {
    CacheConfig {
        backend: CacheBackend::Sqlite,
        sqlite_path: path.display().to_string(),
        ..CacheConfig::default()
    }
}

#[tokio::test]
async fn sqlite_cache_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = sqlite_config(&dir.path().join("nested/cache.db"));
    let value = BTreeMap::from([("9".to_string(), "Mathematics".to_string())]);

    {
        let cache = build_cache(&config).await.unwrap().expect("enabled");
        assert_eq!(cache.store_name(), "sqlite");
        assert!(cache.write("myschool", "Student1", "dbi", &value).await.unwrap());
    }

    let cache = build_cache(&config).await.unwrap().expect("enabled");
    let read: CacheRead<BTreeMap<String, String>> =
        cache.read("myschool.edupage.org", "Student1", "dbi").await.unwrap();
    assert_eq!(read, CacheRead::Hit(value));
}

#[tokio::test]
async fn disabled_cache_builds_nothing() {
    let config = CacheConfig {
        enabled: false,
        ..CacheConfig::default()
    };
    assert!(build_cache(&config).await.unwrap().is_none());
}

#[tokio::test]
async fn memory_backend_is_default() {
    let store = build_store(&CacheConfig::default()).await.unwrap();
    assert_eq!(store.name(), "memory");
}
