// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared table of live sessions keyed by `server + username`.
//!
//! Every read and write, including removals made by keepalive tasks, goes
//! through the one mutex guarding the table.

use std::collections::HashMap;
use std::sync::Arc;

use edubridge_resilience::TaskHandle;
use tokio::sync::Mutex;
use tracing::debug;

struct Entry<S> {
    session: Arc<S>,
    keepalive: Option<TaskHandle>,
}

impl<S> Entry<S> {
    fn retire(self) -> Arc<S> {
        if let Some(handle) = &self.keepalive {
            handle.cancel();
        }
        self.session
    }
}

pub struct SessionRegistry<S> {
    entries: Mutex<HashMap<String, Entry<S>>>,
}

impl<S> Default for SessionRegistry<S> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<S> std::fmt::Debug for SessionRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry").finish_non_exhaustive()
    }
}

impl<S> SessionRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `session` under `key`, returning the session it replaced.
    ///
    /// A replaced session's keepalive is cancelled.
    pub async fn insert(&self, key: impl Into<String>, session: Arc<S>) -> Option<Arc<S>> {
        let key = key.into();
        let previous = self.entries.lock().await.insert(
            key.clone(),
            Entry {
                session,
                keepalive: None,
            },
        );
        debug!(key = %key, replaced = previous.is_some(), "session registered");
        previous.map(Entry::retire)
    }

    /// Attach a keepalive task to the entry for `key`.
    ///
    /// Returns `false` and cancels `handle` if the entry is gone or now holds a
    /// different session.
    pub async fn attach_keepalive(&self, key: &str, session: &Arc<S>, handle: TaskHandle) -> bool {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(key) {
            Some(entry) if Arc::ptr_eq(&entry.session, session) => {
                if let Some(old) = entry.keepalive.replace(handle) {
                    old.cancel();
                }
                true
            }
            _ => {
                handle.cancel();
                false
            }
        }
    }

    pub async fn get(&self, key: &str) -> Option<Arc<S>> {
        self.entries
            .lock()
            .await
            .get(key)
            .map(|entry| Arc::clone(&entry.session))
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.lock().await.contains_key(key)
    }

    pub async fn has_keepalive(&self, key: &str) -> bool {
        self.entries
            .lock()
            .await
            .get(key)
            .is_some_and(|entry| entry.keepalive.is_some())
    }

    /// Remove `key`, cancelling its keepalive.
    pub async fn remove(&self, key: &str) -> Option<Arc<S>> {
        let removed = self.entries.lock().await.remove(key).map(Entry::retire);
        if removed.is_some() {
            debug!(key, "session deregistered");
        }
        removed
    }

    /// Remove `key` only while it still holds `session`.
    ///
    /// A keepalive uses this so a failing ping never evicts a newer login.
    pub async fn remove_if_current(&self, key: &str, session: &Arc<S>) -> bool {
        let mut entries = self.entries.lock().await;
        let is_current = entries
            .get(key)
            .is_some_and(|entry| Arc::ptr_eq(&entry.session, session));
        if is_current && let Some(entry) = entries.remove(key) {
            entry.retire();
            debug!(key, "session deregistered");
        }
        is_current
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Registered keys, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Empty the table, cancelling every keepalive.
    pub async fn drain(&self) -> Vec<(String, Arc<S>)> {
        let mut entries = self.entries.lock().await;
        entries
            .drain()
            .map(|(key, entry)| (key, entry.retire()))
            .collect()
    }
}
