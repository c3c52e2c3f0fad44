// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Edubridge portal client.

use std::error::Error as StdError;

use thiserror::Error;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Substrings that mark an error as transient (worth retrying).
///
/// Matched case-insensitively against the whole error chain.
pub const TRANSIENT_MARKERS: &[&str] = &[
    "connection reset",
    "timeout",
    "too many requests",
    "busy",
    "connection refused",
    "no route to host",
    "temporary failure",
];

/// The primary error type used across the portal client, cache, and loader.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The portal rejected the credentials or the session expired
    /// (login redirect mismatch, non-200 or unexpected redirect on fetch).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Network-level failure (connection reset, timeout, DNS, throttling).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<BoxError>,
    },

    /// Envelope-level decode failure: bad base64, truncated body, JSON shape mismatch.
    #[error("decode error: {message}")]
    Decode {
        message: String,
        source: Option<BoxError>,
    },

    /// A scraping pattern did not match the returned page. Indicates portal markup drift.
    #[error("portal page no longer matches pattern `{pattern}`")]
    Scrape { pattern: &'static str },

    /// The client has no user snapshot yet.
    #[error("client is not initialized: {0}")]
    Uninitialized(String),

    /// A looked-up entity does not exist.
    #[error("{kind} `{id}` not found")]
    NotFound { kind: &'static str, id: String },

    /// The portal no longer accepts changes for this item.
    #[error("cannot change order for {date} anymore")]
    Unchangeable { date: String },

    /// The client was closed and cannot issue further calls.
    #[error("client is closed")]
    Closed,

    /// Configuration errors (invalid values, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Cache backend errors.
    #[error("cache error: {source}")]
    Cache { source: BoxError },

    /// Persistent storage errors (user records).
    #[error("storage error: {source}")]
    Storage { source: BoxError },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PortalError {
    /// Build a transport error carrying its underlying cause.
    pub fn transport(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Build a decode error without an underlying cause.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            source: None,
        }
    }

    /// Build a decode error wrapping a parser error.
    pub fn decode_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Decode {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Short stable label for logs and operator-facing reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Transport { .. } => "transport",
            Self::Decode { .. } => "decode",
            Self::Scrape { .. } => "scrape",
            Self::Uninitialized(_) => "uninitialized",
            Self::NotFound { .. } => "not_found",
            Self::Unchangeable { .. } => "unchangeable",
            Self::Closed => "closed",
            Self::Config(_) => "config",
            Self::Cache { .. } => "cache",
            Self::Storage { .. } => "storage",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether the error signals a session or credentials problem.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Whether a retry has a chance of succeeding.
    ///
    /// Classification is a substring match over the full error chain against
    /// [`TRANSIENT_MARKERS`].
    pub fn is_transient(&self) -> bool {
        is_transient_message(&self.chain_message())
    }

    /// The error message followed by every cause, joined by `": "`.
    pub fn chain_message(&self) -> String {
        let mut message = self.to_string();
        let mut cause = self.source();
        while let Some(err) = cause {
            message.push_str(": ");
            message.push_str(&err.to_string());
            cause = err.source();
        }
        message
    }
}

/// Substring classifier shared by [`PortalError::is_transient`] and callers
/// holding only a message.
pub fn is_transient_message(message: &str) -> bool {
    let lowered = message.to_lowercase();
    TRANSIENT_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}
