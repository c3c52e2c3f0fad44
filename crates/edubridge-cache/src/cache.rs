// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed snapshot cache over a [`CacheStore`].

use std::future::Future;
use std::sync::Arc;

use edubridge_core::{CacheStore, PortalError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::key::{CachePolicy, cache_key};

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheRead<T> {
    /// A live entry decoded into `T`.
    Hit(T),
    /// Nothing stored, or the entry expired.
    Miss,
    /// An entry exists but does not decode as `T`. Callers treat this as a miss.
    Corrupt(String),
}

impl<T> CacheRead<T> {
    /// The cached value, if there was a usable one.
    pub fn hit(self) -> Option<T> {
        match self {
            Self::Hit(value) => Some(value),
            Self::Miss | Self::Corrupt(_) => None,
        }
    }
}

/// JSON snapshots keyed by school, user and kind, expiring per kind.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
    policy: CachePolicy,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("store", &self.store.name())
            .field("policy", &self.policy)
            .finish()
    }
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>, policy: CachePolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    pub async fn is_cached(
        &self,
        server: &str,
        user_id: &str,
        kind: &str,
    ) -> Result<bool, PortalError> {
        self.store.exists(&cache_key(server, user_id, kind)).await
    }

    /// Look up and decode a snapshot. Decode failures come back as [`CacheRead::Corrupt`].
    pub async fn read<T: DeserializeOwned>(
        &self,
        server: &str,
        user_id: &str,
        kind: &str,
    ) -> Result<CacheRead<T>, PortalError> {
        let key = cache_key(server, user_id, kind);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(CacheRead::Miss);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(CacheRead::Hit(value)),
            Err(e) => {
                warn!(key = %key, error = %e, "cached snapshot does not decode");
                Ok(CacheRead::Corrupt(e.to_string()))
            }
        }
    }

    /// Store a snapshot under the kind's TTL. Returns `false` when the kind is not cacheable.
    pub async fn write<T: Serialize + ?Sized>(
        &self,
        server: &str,
        user_id: &str,
        kind: &str,
        value: &T,
    ) -> Result<bool, PortalError> {
        let ttl = self.policy.ttl_for(kind);
        if ttl.is_zero() {
            return Ok(false);
        }
        let raw = serde_json::to_string(value).map_err(|e| PortalError::Cache {
            source: Box::new(e),
        })?;
        let key = cache_key(server, user_id, kind);
        self.store.set(&key, raw, ttl).await?;
        debug!(key = %key, ttl_secs = ttl.as_secs(), "snapshot cached");
        Ok(true)
    }

    pub async fn invalidate(
        &self,
        server: &str,
        user_id: &str,
        kind: &str,
    ) -> Result<(), PortalError> {
        self.store.delete(&cache_key(server, user_id, kind)).await
    }

    /// Serve from the cache, else run `fetch` and write its result back.
    ///
    /// Store failures on either side are logged and do not fail the call; only
    /// `fetch` errors propagate.
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        server: &str,
        user_id: &str,
        kind: &str,
        fetch: F,
    ) -> Result<T, PortalError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, PortalError>>,
    {
        if self.policy.is_cacheable(kind) {
            match self.read(server, user_id, kind).await {
                Ok(CacheRead::Hit(value)) => {
                    debug!(server, user_id, kind, "cache hit");
                    return Ok(value);
                }
                Ok(CacheRead::Miss | CacheRead::Corrupt(_)) => {}
                Err(e) => warn!(server, user_id, kind, error = %e, "cache read failed"),
            }
        }

        let value = fetch().await?;
        if let Err(e) = self.write(server, user_id, kind, &value).await {
            warn!(server, user_id, kind, error = %e, "cache write failed");
        }
        Ok(value)
    }
}
