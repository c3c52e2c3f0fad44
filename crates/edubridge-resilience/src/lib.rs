// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Composable primitives for bulk work against a flaky remote.
//!
//! - [`retry`]: retry-with-backoff parameterized by an error classifier.
//! - [`pool`]: a fixed number of workers draining a bounded job queue.
//! - [`scheduler`]: cancellable periodic tasks.
//!
//! None of these know about portals or sessions; the session loader composes them.

pub mod pool;
pub mod retry;
pub mod scheduler;

pub use pool::WorkerPool;
pub use retry::{RetryOutcome, RetryPolicy, retry};
pub use scheduler::{Scheduler, TaskHandle};
