// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live portal sessions for stored accounts.
//!
//! [`SessionLoader`] brings stored accounts online at startup and keeps them
//! alive; [`SessionRegistry`] is the one synchronized table every other layer
//! uses to find a session by `server + username`.

pub mod auth;
pub mod loader;
pub mod registry;

pub use auth::PortalAuthenticator;
pub use loader::{
    LoadFailure, LoadSummary, SessionLoader, activity_cutoff, authenticate_with_retry, is_active,
};
pub use registry::SessionRegistry;
