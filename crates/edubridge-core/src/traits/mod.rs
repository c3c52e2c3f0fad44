// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits at the seams of the portal client.
//!
//! Cache backends, user stores, and authenticators are swappable so the
//! loader and request handlers can be exercised without a live portal.
//! All traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod cache;
pub mod users;

pub use cache::CacheStore;
pub use users::{Authenticator, UserStore};
