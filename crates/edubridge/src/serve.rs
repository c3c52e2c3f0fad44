// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `serve` command: restore stored sessions and keep them alive until shutdown.

use std::sync::Arc;

use edubridge_config::EdubridgeConfig;
use edubridge_config::model::LoggingConfig;
use edubridge_core::{PortalError, UserStore};
use edubridge_portal::Connector;
use edubridge_resilience::Scheduler;
use edubridge_sessions::{PortalAuthenticator, SessionLoader, SessionRegistry};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::prompt::{DB_KEY_ENV_VAR, read_secret};
use crate::shutdown::install_signal_handler;
use crate::users::SqliteUserStore;

/// Open the account database, prompting for its passphrase when encryption is on.
pub async fn open_user_store(config: &EdubridgeConfig) -> Result<SqliteUserStore, PortalError> {
    let key = if config.encryption.enabled {
        Some(read_secret(DB_KEY_ENV_VAR, "database passphrase")?)
    } else {
        None
    };
    SqliteUserStore::open(&config.storage.database_path, key).await
}

/// Wire a loader whose keepalives stop when `shutdown` is cancelled.
pub fn build_loader(
    config: &EdubridgeConfig,
    connector: Connector,
    users: Arc<dyn UserStore>,
    shutdown: &CancellationToken,
) -> SessionLoader<PortalAuthenticator> {
    SessionLoader::new(
        Arc::new(PortalAuthenticator::new(connector)),
        users,
        Arc::new(SessionRegistry::new()),
        Scheduler::with_parent(shutdown),
        config.loader.clone(),
    )
}

pub async fn run_serve(config: EdubridgeConfig) -> Result<(), PortalError> {
    let shutdown = install_signal_handler();

    if !config.storage.enabled {
        warn!("account storage is disabled, no sessions to restore");
        shutdown.cancelled().await;
        return Ok(());
    }

    let users = Arc::new(open_user_store(&config).await?);
    let loader = build_loader(
        &config,
        Connector::new(&config.portal),
        users,
        &shutdown,
    );

    let summary = loader.load_all().await?;
    for failure in &summary.failures {
        warn!(
            key = %failure.key,
            kind = failure.error.kind(),
            attempts = failure.attempts,
            "account not restored"
        );
    }
    info!(
        online = summary.authenticated.len(),
        attempted = summary.attempted(),
        inactive = summary.inactive,
        "edubridge serving, press Ctrl+C to stop"
    );

    shutdown.cancelled().await;
    loader.shutdown().await;
    Ok(())
}

/// Initialize the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_tracing(logging: &LoggingConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("edubridge={},warn", logging.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
