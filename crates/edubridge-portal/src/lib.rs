// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! EduPage portal client.
//!
//! Layers, bottom-up:
//! - [`codec`]: signed request envelopes and framed response bodies.
//! - [`extract`]: session token and bootstrap JSON scraped from HTML.
//! - [`model`]: typed entities and their parsers.
//! - [`session`]: login and the cookie-bearing transport.
//! - [`client`]: the [`EduClient`] facade tying it together.

pub mod client;
pub mod codec;
pub mod extract;
pub mod message;
pub mod model;
pub mod recent;
pub mod session;

pub use client::EduClient;
pub use codec::{Envelope, decode_response, encode_request};
pub use message::{MessageOptions, Poll, PollOption};
pub use session::{Connector, Credentials};
