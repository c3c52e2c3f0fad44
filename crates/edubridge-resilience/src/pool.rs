// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-size worker pool over a bounded job queue.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error};

/// Runs a batch of jobs on a fixed number of tokio tasks.
///
/// The job queue is sized to the batch, so enqueueing never waits. Results
/// arrive in completion order, not submission order.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// A pool with `workers` tasks. Zero is treated as one.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Feed every job to `handler` and collect the results.
    ///
    /// A job whose handler panics yields no result; the panic is logged and the
    /// worker moves on to the next job.
    pub async fn run<J, R, F, Fut>(&self, jobs: Vec<J>, handler: F) -> Vec<R>
    where
        J: Send + 'static,
        R: Send + 'static,
        F: Fn(J) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        if jobs.is_empty() {
            return Vec::new();
        }

        let total = jobs.len();
        let (job_tx, job_rx) = mpsc::channel::<J>(total);
        let (result_tx, mut result_rx) = mpsc::channel::<R>(total);
        for job in jobs {
            // Capacity equals the batch size, so this cannot fail for lack of room.
            if job_tx.try_send(job).is_err() {
                error!("job queue rejected a job");
            }
        }
        drop(job_tx);

        let job_rx = Arc::new(Mutex::new(job_rx));
        let handler = Arc::new(handler);
        let spawned = self.workers.min(total);
        let mut handles = Vec::with_capacity(spawned);

        for worker in 0..spawned {
            let job_rx = Arc::clone(&job_rx);
            let result_tx = result_tx.clone();
            let handler = Arc::clone(&handler);
            handles.push(tokio::spawn(async move {
                let mut done = 0usize;
                loop {
                    let next = job_rx.lock().await.recv().await;
                    let Some(job) = next else { break };
                    done += 1;
                    match tokio::spawn((*handler)(job)).await {
                        Ok(result) => {
                            if result_tx.send(result).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => error!(worker, error = %e, "job panicked"),
                    }
                }
                debug!(worker, jobs = done, "worker finished");
            }));
        }
        drop(result_tx);

        let mut results = Vec::with_capacity(total);
        while let Some(result) = result_rx.recv().await {
            results.push(result);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "worker task failed");
            }
        }
        results
    }
}
