// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signed request envelopes and framed response bodies.
//!
//! Outgoing AJAX parameters are form-encoded, wrapped in URL-safe base64
//! (`eqap`), and signed with a SHA-1 digest of that base64 text (`eqacs`).
//! The portal verifies the digest against the exact bytes it receives, so the
//! hash must be taken over the encoded payload, not the raw form string.
//!
//! Responses carry four opaque prefix bytes followed by standard base64 that
//! decodes to NUL-padded JSON.

use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use edubridge_core::PortalError;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha1::{Digest, Sha1};
use url::form_urlencoded;

/// Constant value of the `eqaz` field.
pub const VERSION_FLAG: &str = "1";

/// Opaque bytes preceding every framed response.
pub const RESPONSE_PREFIX_LEN: usize = 4;

/// Everything except `A-Z a-z 0-9 - _ . ~` is escaped, as the portal's own
/// clients do. Spaces become `+`.
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn query_escape(text: &str) -> String {
    utf8_percent_encode(text, QUERY_ESCAPE)
        .to_string()
        .replace("%20", "+")
}

/// The signed transport envelope posted to AJAX endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// URL-safe base64 of the form-encoded parameters (`eqap`).
    pub payload: String,
    /// URL-safe base64 of the SHA-1 of `payload` (`eqacs`).
    pub digest: String,
}

impl Envelope {
    /// Form fields in the order the portal's own scripts send them.
    pub fn form(&self) -> [(&'static str, &str); 3] {
        [
            ("eqap", self.payload.as_str()),
            ("eqacs", self.digest.as_str()),
            ("eqaz", VERSION_FLAG),
        ]
    }

    /// Digest recomputed from the payload as the portal would.
    pub fn recompute_digest(&self) -> String {
        sign(&self.payload)
    }

    /// Whether the carried digest matches the payload.
    pub fn is_consistent(&self) -> bool {
        self.recompute_digest() == self.digest
    }

    /// Decodes the payload back into its parameter map.
    pub fn params(&self) -> Result<BTreeMap<String, String>, PortalError> {
        let raw = URL_SAFE
            .decode(&self.payload)
            .map_err(|e| PortalError::decode_with("envelope payload is not base64", e))?;
        Ok(form_urlencoded::parse(&raw).into_owned().collect())
    }
}

/// Encode parameters into a signed envelope.
///
/// Keys are sorted before encoding so the same input always yields the same
/// envelope.
pub fn encode_request<I, K, V>(params: I) -> Envelope
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let sorted: BTreeMap<String, String> = params
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();

    let form = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", query_escape(key), query_escape(value)))
        .collect::<Vec<_>>()
        .join("&");

    let payload = URL_SAFE.encode(form.as_bytes());
    let digest = sign(&payload);
    Envelope { payload, digest }
}

fn sign(payload: &str) -> String {
    URL_SAFE.encode(Sha1::digest(payload.as_bytes()))
}

/// Decode a framed response body into raw JSON bytes.
///
/// Discards the four prefix bytes, tolerates line breaks and trailing NUL
/// padding around the base64 text, and strips NUL padding from the decoded
/// output. Anything else is a hard [`PortalError::Decode`].
pub fn decode_response(body: &[u8]) -> Result<Vec<u8>, PortalError> {
    if body.len() < RESPONSE_PREFIX_LEN {
        return Err(PortalError::decode(format!(
            "response body too short ({} bytes)",
            body.len()
        )));
    }

    let encoded: Vec<u8> = body[RESPONSE_PREFIX_LEN..]
        .iter()
        .copied()
        .filter(|b| !matches!(b, b'\r' | b'\n'))
        .collect();
    let encoded = trim_padding(&encoded);
    if encoded.is_empty() {
        return Err(PortalError::decode("response body has no payload"));
    }

    let decoded = STANDARD
        .decode(encoded)
        .map_err(|e| PortalError::decode_with("response body is not valid base64", e))?;

    Ok(trim_padding(&decoded).to_vec())
}

fn trim_padding(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|&b| b != 0).map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// Build a framed response body the way the portal does. Used by test fixtures.
pub fn frame_response(prefix: [u8; RESPONSE_PREFIX_LEN], json: &[u8], nul_padding: usize) -> Vec<u8> {
    let mut body = prefix.to_vec();
    body.extend_from_slice(STANDARD.encode(json).as_bytes());
    body.extend(std::iter::repeat_n(0u8, nul_padding));
    body
}
