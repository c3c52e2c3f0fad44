// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scrapes session state embedded in portal HTML.
//!
//! The portal has no bootstrap API; the session token and the user snapshot
//! are inline script calls on the user page. A miss means the markup changed
//! and surfaces as [`PortalError::Scrape`].

use std::sync::LazyLock;

use edubridge_core::PortalError;
use regex::Regex;

static SESSION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"ASC\.gsechash="(.*)";"#).expect("valid regex"));

static USER_BOOTSTRAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.userhome\((.*)\);").expect("valid regex"));

static EDUPAGE_DATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"edupageData: (\{.*\}),").expect("valid regex"));

fn first_capture<'h>(
    re: &Regex,
    html: &'h str,
    pattern: &'static str,
) -> Result<&'h str, PortalError> {
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or(PortalError::Scrape { pattern })
}

/// Extracts the `gsechash` session token.
pub fn extract_session_token(html: &str) -> Result<String, PortalError> {
    first_capture(&SESSION_TOKEN, html, "ASC.gsechash").map(str::to_owned)
}

/// Extracts the JSON argument of the `.userhome(...)` bootstrap call.
pub fn extract_user_bootstrap(html: &str) -> Result<&str, PortalError> {
    first_capture(&USER_BOOTSTRAP, html, ".userhome")
}

/// Extracts the `edupageData` object from the canteen page.
pub fn extract_edupage_data(html: &str) -> Result<&str, PortalError> {
    first_capture(&EDUPAGE_DATA, html, "edupageData")
}
