// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock EduPage portal on top of `wiremock`.
//!
//! Every `mount_*` helper installs the endpoint with the exact framing the
//! real portal uses: HTML pages with inline script state, base64 envelopes
//! behind a four-byte prefix, or plain JSON.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Opaque prefix the portal puts before framed bodies.
const FRAME_PREFIX: &[u8; 4] = b"eqz:";

/// Frame a JSON document the way the portal's AJAX endpoints do.
pub fn frame(json: &Value) -> Vec<u8> {
    let mut body = FRAME_PREFIX.to_vec();
    body.extend_from_slice(STANDARD.encode(json.to_string()).as_bytes());
    body.push(0);
    body
}

/// The user page with the session token and the `.userhome(...)` bootstrap call.
///
/// Each script statement sits on its own line because the scraping patterns are greedy.
pub fn user_page(token: &str, user: &Value) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><script>\nASC.gsechash=\"{token}\";\n</script></head>\n<body><script>\nuserhome_page.userhome({user});\n</script></body></html>\n"
    )
}

/// The canteen page embedding `edupageData`.
pub fn menu_page(data: &Value) -> String {
    format!(
        "<html><body><script>\nvar settings = {{\nedupageData: {data},\nlang: \"sk\"\n}};\n</script></body></html>\n"
    )
}

/// A `wiremock` server pretending to be one school's portal.
pub struct MockPortal {
    server: MockServer,
}

impl MockPortal {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to hand to the connector.
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Requests received so far.
    pub async fn requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Requests received for one path.
    pub async fn requests_to(&self, request_path: &str) -> Vec<Request> {
        self.requests()
            .await
            .into_iter()
            .filter(|request| request.url.path() == request_path)
            .collect()
    }

    /// Login answers with a redirect to `location`.
    pub async fn mount_login(&self, location: &str) {
        Mock::given(method("POST"))
            .and(path("/login/edubarLogin.php"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", location)
                    .insert_header("Set-Cookie", "PHPSESSID=mock-session; path=/"),
            )
            .mount(&self.server)
            .await;
    }

    /// Login accepted.
    pub async fn mount_login_success(&self) {
        self.mount_login("/user/").await;
    }

    /// Login answers with a bare status.
    pub async fn mount_login_status(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/login/edubarLogin.php"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Login answers `first_status` for the first `failures` attempts, then succeeds.
    pub async fn mount_login_flaky(&self, first_status: u16, failures: u64) {
        Mock::given(method("POST"))
            .and(path("/login/edubarLogin.php"))
            .respond_with(ResponseTemplate::new(first_status))
            .up_to_n_times(failures)
            .with_priority(1)
            .mount(&self.server)
            .await;
        self.mount_login_success().await;
    }

    pub async fn mount_user_page(&self, token: &str, user: &Value) {
        Mock::given(method("GET"))
            .and(path("/user/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(user_page(token, user), "text/html; charset=utf-8"),
            )
            .mount(&self.server)
            .await;
    }

    /// Every timeline fetch returns `body`.
    pub async fn mount_timeline(&self, body: &Value) {
        self.timeline_mock(body).mount(&self.server).await;
    }

    /// The next timeline fetch returns `body`; later mounts answer afterwards.
    pub async fn mount_timeline_once(&self, body: &Value) {
        self.timeline_mock(body)
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    fn timeline_mock(&self, body: &Value) -> Mock {
        Mock::given(method("POST"))
            .and(path("/timeline/"))
            .and(query_param("akcia", "getData"))
            .respond_with(framed(body))
    }

    pub async fn mount_results(&self, body: &Value) {
        Mock::given(method("POST"))
            .and(path("/znamky/"))
            .and(query_param("akcia", "studentData"))
            .respond_with(framed(body))
            .mount(&self.server)
            .await;
    }

    /// Timetable answers are plain JSON.
    pub async fn mount_timetable(&self, body: &Value) {
        Mock::given(method("POST"))
            .and(path("/timetable/server/currenttt.js"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_menu_page(&self, data: &Value) {
        Mock::given(method("GET"))
            .and(path("/menu/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(menu_page(data), "text/html; charset=utf-8"),
            )
            .mount(&self.server)
            .await;
    }

    /// Reply to a canteen order change.
    pub async fn mount_menu_reply(&self, reply: &Value) {
        Mock::given(method("POST"))
            .and(path("/menu/"))
            .respond_with(framed(reply))
            .mount(&self.server)
            .await;
    }

    /// Ping answers with a raw body such as `OK` or `notlogged`.
    pub async fn mount_ping(&self, body: &str) {
        Mock::given(method("POST"))
            .and(path("/login/eauth"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_create_item(&self, reply: &Value) {
        Mock::given(method("POST"))
            .and(path("/timeline/"))
            .and(query_param("akcia", "createItem"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_material(&self, body: &Value) {
        Mock::given(method("POST"))
            .and(path("/elearning/"))
            .and(query_param("akcia", "getETestData"))
            .respond_with(framed(body))
            .mount(&self.server)
            .await;
    }

    /// Any request with `http_method` to `request_path` answers `status`.
    pub async fn mount_status(&self, http_method: &str, request_path: &str, status: u16) {
        Mock::given(method(http_method))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }
}

fn framed(body: &Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(frame(body), "text/plain")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn frame_has_prefix_and_padding() {
        let body = frame(&json!({"a": 1}));
        assert_eq!(&body[..4], FRAME_PREFIX);
        assert_eq!(body.last(), Some(&0));
        let decoded = STANDARD.decode(&body[4..body.len() - 1]).unwrap();
        assert_eq!(decoded, br#"{"a":1}"#);
    }

    #[test]
    fn user_page_keeps_statements_on_their_own_lines() {
        let page = user_page("abc", &json!({"userrow": {"UserID": "Student1"}}));
        assert!(page.contains("ASC.gsechash=\"abc\";\n"));
        assert!(page.contains(".userhome({\"userrow\":{\"UserID\":\"Student1\"}});\n"));
    }

    #[tokio::test]
    async fn login_mount_redirects() {
        let portal = MockPortal::start().await;
        portal.mount_login_success().await;
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();
        let response = client
            .post(format!("{}/login/edubarLogin.php", portal.uri()))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 302);
        assert_eq!(response.headers()["location"], "/user/");
        assert_eq!(portal.requests_to("/login/edubarLogin.php").await.len(), 1);
    }
}
