// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot login and snapshot fetch for the `fetch` command.

use std::future::Future;

use edubridge_cache::Cache;
use edubridge_config::EdubridgeConfig;
use edubridge_core::{PortalError, StoredUser};
use edubridge_portal::{Connector, EduClient};
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::prompt::{PASSWORD_ENV_VAR, read_secret};
use crate::serve::open_user_store;

/// What `fetch` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FetchTarget {
    /// The user page bootstrap, including the reference tables.
    User,
    /// The last 30 days of the timeline.
    Timeline,
    /// Grades for the current half-year.
    Results,
    /// Lessons from yesterday to a week ahead.
    Timetable,
    /// The canteen menu for the next school day.
    Canteen,
}

impl FetchTarget {
    /// Cache kind the snapshot is stored under.
    pub fn cache_kind(self) -> &'static str {
        match self {
            Self::User => "dbi",
            Self::Timeline => "timeline",
            Self::Results => "results",
            Self::Timetable => "timetable",
            Self::Canteen => "canteen",
        }
    }
}

/// Options for one `fetch` run.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub target: FetchTarget,
    pub server: String,
    pub username: String,
    /// Store the account so `serve` restores it.
    pub remember: bool,
}

/// Log in, fetch the snapshot, and print it as JSON on stdout.
pub async fn run_fetch(config: &EdubridgeConfig, request: &FetchRequest) -> Result<(), PortalError> {
    let password = read_secret(PASSWORD_ENV_VAR, "password")?;
    let connector = Connector::new(&config.portal);
    let cache = edubridge_cache::build_cache(&config.cache).await?;

    let value = login_and_fetch(&connector, cache.as_ref(), request, &password).await?;

    if request.remember && config.storage.enabled {
        let store = open_user_store(config).await?;
        store
            .upsert(&StoredUser {
                server: request.server.clone(),
                username: request.username.clone(),
                password: Some(password),
                last_online: Some(chrono::Utc::now()),
            })
            .await?;
        info!(server = %request.server, username = %request.username, "account remembered");
    }

    let rendered = serde_json::to_string_pretty(&value)
        .map_err(|e| PortalError::Internal(format!("failed to render snapshot: {e}")))?;
    println!("{rendered}");
    Ok(())
}

/// Log in with `password` and fetch one snapshot, going through `cache` when given.
pub async fn login_and_fetch(
    connector: &Connector,
    cache: Option<&Cache>,
    request: &FetchRequest,
    password: &SecretString,
) -> Result<Value, PortalError> {
    let credentials = connector
        .login(&request.server, &request.username, password)
        .await?;
    let client = EduClient::connect(credentials).await?;
    let result = fetch_snapshot(&client, cache, request.target).await;
    client.close().await;
    result
}

pub async fn fetch_snapshot(
    client: &EduClient,
    cache: Option<&Cache>,
    target: FetchTarget,
) -> Result<Value, PortalError> {
    let server = client.credentials().server().to_string();
    let user_id = client.user_id().await?;
    let kind = target.cache_kind();

    match target {
        FetchTarget::User => {
            through_cache(cache, &server, &user_id, kind, || async {
                Ok(client.get_user(false).await?.as_ref().clone())
            })
            .await
        }
        FetchTarget::Timeline => {
            through_cache(cache, &server, &user_id, kind, || client.get_recent_timeline()).await
        }
        FetchTarget::Results => {
            through_cache(cache, &server, &user_id, kind, || client.get_recent_results()).await
        }
        FetchTarget::Timetable => {
            through_cache(cache, &server, &user_id, kind, || client.get_recent_timetable()).await
        }
        FetchTarget::Canteen => {
            through_cache(cache, &server, &user_id, kind, || client.get_recent_canteen()).await
        }
    }
}

async fn through_cache<T, F, Fut>(
    cache: Option<&Cache>,
    server: &str,
    user_id: &str,
    kind: &str,
    fetch: F,
) -> Result<Value, PortalError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, PortalError>>,
{
    let snapshot = match cache {
        Some(cache) => cache.get_or_fetch(server, user_id, kind, fetch).await?,
        None => fetch().await?,
    };
    serde_json::to_value(&snapshot)
        .map_err(|e| PortalError::Internal(format!("failed to serialize snapshot: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_map_to_cache_kinds() {
        assert_eq!(FetchTarget::User.cache_kind(), "dbi");
        assert_eq!(FetchTarget::Timetable.cache_kind(), "timetable");
        assert_eq!(FetchTarget::Canteen.cache_kind(), "canteen");
    }
}
