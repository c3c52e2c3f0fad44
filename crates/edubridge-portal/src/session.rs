// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Login and the authenticated, cookie-bearing transport for one school.
//!
//! [`Connector`] performs the login handshake and hands out [`Credentials`],
//! which own the HTTP client and its cookie jar for the rest of the session.

use edubridge_config::model::PortalConfig;
use edubridge_core::PortalError;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{StatusCode, redirect};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;
use url::{Url, form_urlencoded};

use crate::codec::{Envelope, decode_response};

const LOGIN_PATH: &str = "/login/edubarLogin.php";

/// The only redirect target that means the portal accepted the credentials.
const LOGIN_SUCCESS_LOCATION: &str = "/user/";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Builds authenticated sessions against the configured portal domain.
#[derive(Debug, Clone)]
pub struct Connector {
    config: PortalConfig,
    base_override: Option<Url>,
}

impl Connector {
    pub fn new(config: &PortalConfig) -> Self {
        Self {
            config: config.clone(),
            base_override: None,
        }
    }

    /// Sends every request to `base` instead of the school's host (for wiremock).
    pub fn with_base_url(mut self, base: &str) -> Result<Self, PortalError> {
        let url = Url::parse(base)
            .map_err(|e| PortalError::Config(format!("invalid portal base url `{base}`: {e}")))?;
        self.base_override = Some(url);
        Ok(self)
    }

    /// Full host name for a school subdomain, e.g. `myschool.edupage.org`.
    /// A name that already contains a dot is taken as the full host.
    pub fn server_for(&self, school: &str) -> String {
        if school.contains('.') {
            school.to_string()
        } else {
            format!("{school}.{}", self.config.domain)
        }
    }

    fn base_url(&self, server: &str) -> Result<Url, PortalError> {
        if let Some(base) = &self.base_override {
            return Ok(base.clone());
        }
        let raw = format!("{}://{server}/", self.config.scheme);
        Url::parse(&raw).map_err(|e| PortalError::Config(format!("invalid portal url `{raw}`: {e}")))
    }

    fn build_http(&self) -> Result<reqwest::Client, PortalError> {
        reqwest::Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .timeout(self.config.request_timeout())
            .connect_timeout(self.config.connect_timeout())
            .user_agent(self.config.user_agent.as_str())
            .build()
            .map_err(|e| PortalError::Internal(format!("failed to build HTTP client: {e}")))
    }

    /// Logs in to `school` and returns the session on success.
    ///
    /// The portal answers a good login with a redirect to `/user/`; any other
    /// redirect or a plain response is [`PortalError::Unauthorized`].
    pub async fn login(
        &self,
        school: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<Credentials, PortalError> {
        let server = self.server_for(school);
        let credentials = Credentials {
            base: self.base_url(&server)?,
            http: self.build_http()?,
            server,
            username: username.to_string(),
        };

        let body = form_body([
            ("username", username),
            ("password", password.expose_secret()),
        ]);
        let response = credentials
            .http
            .post(credentials.endpoint(LOGIN_PATH)?)
            .header(header::CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| send_error(LOGIN_PATH, e))?;

        let status = response.status();
        let location = location_of(&response);
        debug!(server = %credentials.server, status = %status, "login response received");

        if status.is_redirection() {
            return match location.as_deref() {
                Some(LOGIN_SUCCESS_LOCATION) => Ok(credentials),
                other => Err(PortalError::Unauthorized(format!(
                    "login redirected to {}",
                    other.unwrap_or("an empty location")
                ))),
            };
        }
        if let Some(err) = transient_status(status) {
            return Err(err);
        }
        Err(PortalError::Unauthorized(format!(
            "login was not accepted (portal answered {status})"
        )))
    }
}

/// An authenticated session bound to one school host.
#[derive(Debug, Clone)]
pub struct Credentials {
    server: String,
    username: String,
    base: Url,
    http: reqwest::Client,
}

impl Credentials {
    /// Full host name, e.g. `myschool.edupage.org`.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// The school subdomain, i.e. the server without its domain.
    pub fn school(&self) -> &str {
        self.server.split('.').next().unwrap_or(&self.server)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Browser-facing origin, sent as `Referer` on write calls.
    pub fn origin(&self) -> String {
        self.base.to_string()
    }

    fn endpoint(&self, path: &str) -> Result<Url, PortalError> {
        self.base
            .join(path)
            .map_err(|e| PortalError::Internal(format!("invalid endpoint `{path}`: {e}")))
    }

    /// `GET` a page and return its body as text.
    pub(crate) async fn get_text(&self, path: &str) -> Result<String, PortalError> {
        let response = self
            .http
            .get(self.endpoint(path)?)
            .send()
            .await
            .map_err(|e| send_error(path, e))?;
        let body = read_ok(response, path).await?;
        String::from_utf8(body).map_err(|e| PortalError::decode_with("page is not valid UTF-8", e))
    }

    /// Post a signed envelope and unwrap the framed response into JSON bytes.
    pub(crate) async fn post_envelope(
        &self,
        path: &str,
        envelope: &Envelope,
    ) -> Result<Vec<u8>, PortalError> {
        let body = self.post_form(path, envelope.form(), HeaderMap::new()).await?;
        decode_response(&body)
    }

    /// Post plain form fields and return the raw response body.
    pub(crate) async fn post_form<I, K, V>(
        &self,
        path: &str,
        fields: I,
        headers: HeaderMap,
    ) -> Result<Vec<u8>, PortalError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let response = self
            .http
            .post(self.endpoint(path)?)
            .headers(headers)
            .header(header::CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(form_body(fields))
            .send()
            .await
            .map_err(|e| send_error(path, e))?;
        read_ok(response, path).await
    }

    /// Post a JSON document and return the raw response body.
    pub(crate) async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        document: &T,
    ) -> Result<Vec<u8>, PortalError> {
        let response = self
            .http
            .post(self.endpoint(path)?)
            .json(document)
            .send()
            .await
            .map_err(|e| send_error(path, e))?;
        read_ok(response, path).await
    }
}

/// Headers the portal's own scripts send with AJAX writes.
pub(crate) fn ajax_headers(referer: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
    );
    headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
    if let Ok(value) = HeaderValue::from_str(referer) {
        headers.insert(header::REFERER, value);
    }
    headers
}

fn form_body<I, K, V>(fields: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish()
}

fn location_of(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

async fn read_ok(response: reqwest::Response, path: &str) -> Result<Vec<u8>, PortalError> {
    let status = response.status();
    debug!(path, status = %status, "portal response received");

    if status == StatusCode::OK {
        let body = response.bytes().await.map_err(|e| send_error(path, e))?;
        return Ok(body.to_vec());
    }
    if let Some(err) = transient_status(status) {
        return Err(err);
    }
    if status.is_redirection() {
        let target = location_of(&response).unwrap_or_default();
        return Err(PortalError::Unauthorized(format!("{path} redirected to `{target}`")));
    }
    Err(PortalError::Unauthorized(format!("{path} answered {status}")))
}

/// Rate limiting and overload answers, worded so the retry classifier picks them up.
fn transient_status(status: StatusCode) -> Option<PortalError> {
    let reason = match status {
        StatusCode::TOO_MANY_REQUESTS => "too many requests",
        StatusCode::SERVICE_UNAVAILABLE
        | StatusCode::BAD_GATEWAY
        | StatusCode::GATEWAY_TIMEOUT => "server busy",
        _ => return None,
    };
    Some(PortalError::Transport {
        message: format!("portal answered {status}: {reason}"),
        source: None,
    })
}

fn send_error(path: &str, err: reqwest::Error) -> PortalError {
    let message = if err.is_timeout() {
        format!("request to {path} failed: timeout")
    } else {
        format!("request to {path} failed")
    };
    PortalError::transport(message, err)
}
