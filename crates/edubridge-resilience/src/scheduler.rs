// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cancellable periodic tasks.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Spawns periodic tasks that all stop when the scheduler shuts down.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    root: CancellationToken,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scheduler whose tasks also stop when `parent` is cancelled.
    pub fn with_parent(parent: &CancellationToken) -> Self {
        Self {
            root: parent.child_token(),
        }
    }

    /// Run `task` every `period`, starting one period from now.
    ///
    /// The task stops when it returns [`ControlFlow::Break`], when its handle is
    /// cancelled, or when the scheduler shuts down. Ticks missed while a run is
    /// still in progress are not replayed.
    pub fn every<F, Fut>(&self, name: impl Into<String>, period: Duration, mut task: F) -> TaskHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let name = name.into();
        let cancel = self.root.child_token();
        let token = cancel.clone();
        let task_name = name.clone();
        let period = period.max(Duration::from_millis(1));

        let join = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Skip the first immediate tick.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if task().await.is_break() {
                            info!(task = %task_name, "periodic task stopped itself");
                            break;
                        }
                    }
                    _ = token.cancelled() => {
                        debug!(task = %task_name, "periodic task cancelled");
                        break;
                    }
                }
            }
        });

        TaskHandle { name, cancel, join }
    }

    /// Cancel every task spawned by this scheduler.
    pub fn shutdown(&self) {
        self.root.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }
}

/// Handle to one periodic task.
#[derive(Debug)]
pub struct TaskHandle {
    name: String,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl TaskHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Cancel the task and wait for it to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.join.await;
    }

    /// Wait for the task to exit on its own.
    pub async fn join(self) {
        let _ = self.join.await;
    }
}
