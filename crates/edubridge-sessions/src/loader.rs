// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bulk re-authentication of stored accounts at startup.
//!
//! Recently active accounts are logged in through a fixed-size worker pool,
//! each with bounded retries on transient failures. Every session that comes
//! up is registered and gets its own keepalive, which deregisters it as soon
//! as the portal stops recognizing it.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use edubridge_config::model::LoaderConfig;
use edubridge_core::{Authenticator, PortalError, StoredUser, UserStore};
use edubridge_resilience::{RetryOutcome, RetryPolicy, Scheduler, TaskHandle, WorkerPool, retry};
use secrecy::ExposeSecret;
use tracing::{debug, error, info, warn};

use crate::registry::SessionRegistry;

/// One account that could not be brought online.
#[derive(Debug)]
pub struct LoadFailure {
    /// Registry key of the account.
    pub key: String,
    /// Login attempts made. Zero when the account was rejected before any attempt.
    pub attempts: u32,
    pub error: PortalError,
}

/// Aggregate result of [`SessionLoader::load_all`].
#[derive(Debug, Default)]
pub struct LoadSummary {
    /// Accounts in the store.
    pub stored: usize,
    /// Accounts skipped for not having been online recently.
    pub inactive: usize,
    /// Registry keys of the sessions now online, sorted.
    pub authenticated: Vec<String>,
    pub failures: Vec<LoadFailure>,
}

impl LoadSummary {
    /// Accounts the loader tried to log in.
    pub fn attempted(&self) -> usize {
        self.authenticated.len() + self.failures.len()
    }
}

/// Oldest `last_online` that still counts as active.
///
/// A window too large to represent reaches back to the earliest instant, so
/// every account that was ever seen online stays active.
pub fn activity_cutoff(now: DateTime<Utc>, inactive_after_days: i64) -> DateTime<Utc> {
    TimeDelta::try_days(inactive_after_days)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// `true` if `user` was online after `cutoff`. Accounts never seen online are inactive.
pub fn is_active(user: &StoredUser, cutoff: DateTime<Utc>) -> bool {
    user.last_online.is_some_and(|seen| seen >= cutoff)
}

pub struct SessionLoader<A: Authenticator> {
    authenticator: Arc<A>,
    users: Arc<dyn UserStore>,
    registry: Arc<SessionRegistry<A::Session>>,
    scheduler: Scheduler,
    config: LoaderConfig,
}

impl<A> SessionLoader<A>
where
    A: Authenticator + 'static,
{
    pub fn new(
        authenticator: Arc<A>,
        users: Arc<dyn UserStore>,
        registry: Arc<SessionRegistry<A::Session>>,
        scheduler: Scheduler,
        config: LoaderConfig,
    ) -> Self {
        Self {
            authenticator,
            users,
            registry,
            scheduler,
            config,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry<A::Session>> {
        &self.registry
    }

    /// Log in every recently active stored account.
    ///
    /// Only a failure to list the accounts is an error; individual login
    /// failures are reported in the summary.
    pub async fn load_all(&self) -> Result<LoadSummary, PortalError> {
        let users = self.users.list_users().await?;
        let stored = users.len();
        let cutoff = activity_cutoff(Utc::now(), self.config.inactive_after_days);
        let (active, inactive): (Vec<StoredUser>, Vec<StoredUser>) =
            users.into_iter().partition(|user| is_active(user, cutoff));

        info!(
            stored,
            active = active.len(),
            inactive = inactive.len(),
            workers = self.config.workers,
            "loading stored users"
        );

        let pool = WorkerPool::new(self.config.workers);
        let policy = RetryPolicy::from_config(&self.config);
        let authenticator = Arc::clone(&self.authenticator);
        let results = pool
            .run(active, move |user: StoredUser| {
                let authenticator = Arc::clone(&authenticator);
                let policy = policy.clone();
                async move {
                    let outcome = authenticate_with_retry(authenticator.as_ref(), &policy, &user).await;
                    (user, outcome)
                }
            })
            .await;

        let mut summary = LoadSummary {
            stored,
            inactive: inactive.len(),
            ..LoadSummary::default()
        };
        for (user, outcome) in results {
            let key = user.registry_key();
            match outcome.result {
                Ok(session) => {
                    info!(
                        server = %user.server,
                        username = %user.username,
                        attempts = outcome.attempts,
                        "auto-login succeeded"
                    );
                    record_online(self.users.as_ref(), &user.server, &user.username).await;
                    self.register(&user, Arc::new(session)).await;
                    summary.authenticated.push(key);
                }
                Err(e) => {
                    error!(
                        server = %user.server,
                        username = %user.username,
                        attempts = outcome.attempts,
                        kind = e.kind(),
                        error = %e,
                        "auto-login failed"
                    );
                    summary.failures.push(LoadFailure {
                        key,
                        attempts: outcome.attempts,
                        error: e,
                    });
                }
            }
        }
        summary.authenticated.sort();

        info!(
            succeeded = summary.authenticated.len(),
            attempted = summary.attempted(),
            "stored users loaded"
        );
        Ok(summary)
    }

    /// Register a live session for `user` and start its keepalive when enabled.
    ///
    /// A session previously registered for the same account is released.
    pub async fn register(&self, user: &StoredUser, session: Arc<A::Session>) {
        let key = user.registry_key();
        if let Some(previous) = self.registry.insert(key.clone(), Arc::clone(&session)).await {
            self.authenticator.release(&previous).await;
        }
        if self.config.keepalive_enabled {
            let handle = self.schedule_keepalive(user, Arc::clone(&session));
            self.registry.attach_keepalive(&key, &session, handle).await;
        }
    }

    fn schedule_keepalive(&self, user: &StoredUser, session: Arc<A::Session>) -> TaskHandle {
        let authenticator = Arc::clone(&self.authenticator);
        let registry = Arc::clone(&self.registry);
        let users = Arc::clone(&self.users);
        let key = user.registry_key();
        let server = user.server.clone();
        let username = user.username.clone();
        let name = format!("keepalive {key}");

        self.scheduler
            .every(name, self.config.keepalive_interval(), move || {
                let authenticator = Arc::clone(&authenticator);
                let registry = Arc::clone(&registry);
                let users = Arc::clone(&users);
                let session = Arc::clone(&session);
                let key = key.clone();
                let server = server.clone();
                let username = username.clone();
                async move {
                    match authenticator.ping(&session).await {
                        Ok(true) => {
                            debug!(key = %key, "session ping ok");
                            record_online(users.as_ref(), &server, &username).await;
                            return ControlFlow::Continue(());
                        }
                        Ok(false) => warn!(key = %key, "portal dropped the session"),
                        Err(e) => warn!(key = %key, error = %e, "session ping failed"),
                    }
                    if registry.remove_if_current(&key, &session).await {
                        info!(key = %key, "session deregistered after failed ping");
                    }
                    authenticator.release(&session).await;
                    ControlFlow::Break(())
                }
            })
    }

    /// Stop every keepalive and release every registered session.
    pub async fn shutdown(&self) {
        self.scheduler.shutdown();
        let sessions = self.registry.drain().await;
        let count = sessions.len();
        for (_, session) in sessions {
            self.authenticator.release(&session).await;
        }
        info!(sessions = count, "session loader shut down");
    }
}

/// Refresh `last_online` so the account is restored again on the next start.
async fn record_online(users: &dyn UserStore, server: &str, username: &str) {
    if let Err(e) = users.mark_online(server, username).await {
        warn!(server, username, error = %e, "could not record account as online");
    }
}

/// Log in one account, retrying transient failures per `policy`.
///
/// Accounts without a username or password fail without an attempt.
pub async fn authenticate_with_retry<A: Authenticator>(
    authenticator: &A,
    policy: &RetryPolicy,
    user: &StoredUser,
) -> RetryOutcome<A::Session, PortalError> {
    let has_password = user
        .password
        .as_ref()
        .is_some_and(|password| !password.expose_secret().is_empty());
    if user.username.is_empty() || !has_password {
        return RetryOutcome {
            result: Err(PortalError::Config(format!(
                "user {} has no password or username",
                user.username
            ))),
            attempts: 0,
            total_delay: Duration::ZERO,
        };
    }

    retry(policy, PortalError::is_transient, |attempt| {
        debug!(server = %user.server, username = %user.username, attempt, "logging in");
        authenticator.authenticate(user)
    })
    .await
}
