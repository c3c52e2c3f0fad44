// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Edubridge integration tests.
//!
//! # Components
//!
//! - [`MockPortal`] - wiremock server speaking the portal's page and envelope formats
//! - [`fixtures`] - JSON builders for user, timeline, results, timetable, and canteen payloads
//! - [`InMemoryUserStore`] - account store backed by a vector

pub mod fixtures;
pub mod mock_portal;
pub mod user_store;

pub use mock_portal::{MockPortal, frame};
pub use user_store::InMemoryUserStore;
