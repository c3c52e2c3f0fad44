// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command implementations behind the `edubridge` binary.

pub mod fetch;
pub mod prompt;
pub mod serve;
pub mod shutdown;
pub mod users;
