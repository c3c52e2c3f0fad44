// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client facade against a mock portal.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use edubridge_config::model::PortalConfig;
use edubridge_core::{ClientState, HalfYear, PortalError};
use edubridge_portal::model::Homework;
use edubridge_portal::{Connector, EduClient, Envelope, MessageOptions};
use edubridge_test_utils::{MockPortal, fixtures};
use secrecy::SecretString;
use serde_json::{Value, json};
use url::form_urlencoded;

const TOKEN: &str = "f00dcafe";

fn connector(portal: &MockPortal) -> Connector {
    Connector::new(&PortalConfig::default())
        .with_base_url(&portal.uri())
        .unwrap()
}

async fn login(portal: &MockPortal) -> Result<EduClient, PortalError> {
    let credentials = connector(portal)
        .login("myschool", "jana", &SecretString::from("pw"))
        .await?;
    Ok(EduClient::new(credentials))
}

async fn logged_in(portal: &MockPortal) -> EduClient {
    portal.mount_login_success().await;
    portal
        .mount_user_page(TOKEN, &fixtures::user_bootstrap("Student77", "77"))
        .await;
    let client = login(portal).await.unwrap();
    client.get_user(false).await.unwrap();
    client
}

fn form_fields(body: &[u8]) -> BTreeMap<String, String> {
    form_urlencoded::parse(body).into_owned().collect()
}

fn envelope_params(body: &[u8]) -> BTreeMap<String, String> {
    let fields = form_fields(body);
    assert_eq!(fields["eqaz"], "1");
    let envelope = Envelope {
        payload: fields["eqap"].clone(),
        digest: fields["eqacs"].clone(),
    };
    assert!(envelope.is_consistent(), "digest must match payload");
    envelope.params().unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn login_then_timeline_merge_end_to_end() {
    let portal = MockPortal::start().await;
    portal.mount_login_success().await;
    portal
        .mount_user_page(TOKEN, &fixtures::user_bootstrap("Student77", "77"))
        .await;

    let client = login(&portal).await.unwrap();
    assert_eq!(client.state().await, ClientState::Uninitialized);

    let user = client.get_user(false).await.unwrap();
    assert_eq!(client.state().await, ClientState::Authenticated);
    assert_eq!(client.session_token().await.as_deref(), Some(TOKEN));
    assert_eq!(user.user_row.user_id, "Student77");

    portal
        .mount_timeline_once(&fixtures::timeline_body(
            vec![
                fixtures::timeline_item("1", "sprava", "first"),
                fixtures::timeline_item("2", "sprava", "second"),
            ],
            vec![],
        ))
        .await;
    portal
        .mount_timeline(&fixtures::timeline_body(
            vec![
                fixtures::timeline_item("1", "sprava", "first, edited"),
                fixtures::timeline_item("3", "sprava", "third"),
            ],
            vec![],
        ))
        .await;

    let first = client
        .get_timeline(day(2024, 2, 1), day(2024, 3, 1))
        .await
        .unwrap();
    assert_eq!(first.items.keys().collect::<Vec<_>>(), ["1", "2"]);

    let second = client
        .get_timeline(day(2024, 3, 1), day(2024, 3, 2))
        .await
        .unwrap();
    let merged = first.merged(second);
    assert_eq!(merged.items.keys().collect::<Vec<_>>(), ["1", "2", "3"]);
    assert_eq!(merged.items["1"].text, "first, edited");

    let requests = portal.requests_to("/timeline/").await;
    let params = envelope_params(&requests[0].body);
    assert_eq!(params["datefrom"], "2024-02-01");
    assert_eq!(params["dateto"], "2024-03-01");
}

#[tokio::test]
async fn login_redirect_elsewhere_is_unauthorized() {
    let portal = MockPortal::start().await;
    portal.mount_login("/login/?msg=bad").await;
    let err = login(&portal).await.expect_err("wrong redirect");
    assert!(err.is_unauthorized());
    assert!(!err.is_transient());
}

#[tokio::test]
async fn login_without_redirect_is_unauthorized() {
    let portal = MockPortal::start().await;
    portal.mount_login_status(200).await;
    let err = login(&portal).await.expect_err("plain 200");
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn login_rate_limit_is_transient() {
    let portal = MockPortal::start().await;
    portal.mount_login_status(429).await;
    let err = login(&portal).await.expect_err("429");
    assert!(err.is_transient(), "got {err}");
}

#[tokio::test]
async fn login_posts_credentials() {
    let portal = MockPortal::start().await;
    portal.mount_login_success().await;
    login(&portal).await.unwrap();
    let requests = portal.requests_to("/login/edubarLogin.php").await;
    let fields = form_fields(&requests[0].body);
    assert_eq!(fields["username"], "jana");
    assert_eq!(fields["password"], "pw");
}

async fn mount_user_html(portal: &MockPortal, html: String) {
    portal
        .server()
        .register(
            wiremock::Mock::given(wiremock::matchers::method("GET"))
                .and(wiremock::matchers::path("/user/"))
                .respond_with(
                    wiremock::ResponseTemplate::new(200)
                        .set_body_raw(html, "text/html; charset=utf-8"),
                ),
        )
        .await;
}

#[tokio::test]
async fn user_page_without_token_is_a_scrape_failure() {
    let portal = MockPortal::start().await;
    portal.mount_login_success().await;
    let bootstrap = fixtures::user_bootstrap("Student77", "77");
    mount_user_html(
        &portal,
        format!("<html><body><script>\nuserhome_page.userhome({bootstrap});\n</script></body></html>\n"),
    )
    .await;

    let client = login(&portal).await.unwrap();
    let err = client.get_user(false).await.expect_err("token is missing");

    assert!(matches!(err, PortalError::Scrape { pattern: "ASC.gsechash" }));
    assert_eq!(err.kind(), "scrape");
    assert!(!err.is_unauthorized());
    assert!(!err.is_transient());
    assert_eq!(client.state().await, ClientState::Uninitialized);
    assert_eq!(client.session_token().await, None);
}

#[tokio::test]
async fn markup_drift_after_login_keeps_the_session_authenticated() {
    let portal = MockPortal::start().await;
    portal.mount_login_success().await;
    portal
        .server()
        .register(
            wiremock::Mock::given(wiremock::matchers::method("GET"))
                .and(wiremock::matchers::path("/user/"))
                .respond_with(wiremock::ResponseTemplate::new(200).set_body_raw(
                    fixtures_user_page(),
                    "text/html; charset=utf-8",
                ))
                .up_to_n_times(1)
                .with_priority(1),
        )
        .await;
    mount_user_html(&portal, format!("<html>ASC.gsechash=\"{TOKEN}\";\n</html>\n")).await;

    let client = login(&portal).await.unwrap();
    client.get_user(false).await.unwrap();
    assert_eq!(client.state().await, ClientState::Authenticated);

    let err = client.get_user(true).await.expect_err("bootstrap call is missing");
    assert!(matches!(err, PortalError::Scrape { pattern: ".userhome" }));
    assert_eq!(client.state().await, ClientState::Authenticated);
    assert_eq!(client.user_id().await.unwrap(), "Student77");
}

fn fixtures_user_page() -> String {
    edubridge_test_utils::mock_portal::user_page(
        TOKEN,
        &fixtures::user_bootstrap("Student77", "77"),
    )
}

#[tokio::test]
async fn rejected_fetch_marks_client_stale() {
    let portal = MockPortal::start().await;
    let client = logged_in(&portal).await;
    portal.mount_status("POST", "/timeline/", 403).await;

    let err = client
        .get_recent_timeline()
        .await
        .expect_err("forbidden");
    assert!(err.is_unauthorized());
    assert_eq!(client.state().await, ClientState::Stale);
}

#[tokio::test]
async fn redirect_to_login_marks_client_stale() {
    let portal = MockPortal::start().await;
    let client = logged_in(&portal).await;
    portal
        .server()
        .register(
            wiremock::Mock::given(wiremock::matchers::method("POST"))
                .and(wiremock::matchers::path("/znamky/"))
                .respond_with(
                    wiremock::ResponseTemplate::new(302).insert_header("Location", "/login/"),
                ),
        )
        .await;

    let err = client.get_recent_results().await.expect_err("redirect");
    assert!(err.is_unauthorized());
    assert_eq!(client.state().await, ClientState::Stale);
}

#[tokio::test]
async fn busy_portal_is_transient_and_keeps_state() {
    let portal = MockPortal::start().await;
    let client = logged_in(&portal).await;
    portal.mount_status("POST", "/timeline/", 503).await;

    let err = client
        .get_timeline(day(2024, 1, 1), day(2024, 1, 2))
        .await
        .expect_err("busy");
    assert!(err.is_transient());
    assert_eq!(client.state().await, ClientState::Authenticated);
}

#[tokio::test]
async fn results_request_carries_period() {
    let portal = MockPortal::start().await;
    let client = logged_in(&portal).await;
    portal.mount_results(&fixtures::results_body()).await;

    let results = client.get_results("2023", HalfYear::P2).await.unwrap();
    assert_eq!(results.grades["g1"].data, "1");
    assert_eq!(results.events["e1"].name, "Quiz");
    assert_eq!(results.notes["n1"].text, "Active in class");

    let requests = portal.requests_to("/znamky/").await;
    let params = envelope_params(&requests[0].body);
    assert_eq!(params["rokobdobie"], "2023::P2");
    assert_eq!(params["nadobdobie"], "P2");
    assert_eq!(params["znamky_yearid"], "2023");
    assert_eq!(params["pohlad"], "podladatumu");
}

#[tokio::test]
async fn timetable_needs_user_snapshot() {
    let portal = MockPortal::start().await;
    portal.mount_login_success().await;
    let client = login(&portal).await.unwrap();

    let err = client
        .get_timetable(day(2024, 2, 5), day(2024, 2, 6))
        .await
        .expect_err("no user yet");
    assert!(matches!(err, PortalError::Uninitialized(_)));
}

#[tokio::test]
async fn timetable_sends_student_and_token() {
    let portal = MockPortal::start().await;
    let client = logged_in(&portal).await;
    portal
        .mount_timetable(&fixtures::timetable_body("2024-02-05"))
        .await;

    let timetable = client
        .get_timetable(day(2024, 2, 5), day(2024, 2, 9))
        .await
        .unwrap();
    assert_eq!(timetable.day("2024-02-05").len(), 2);

    let requests = portal.requests_to("/timetable/server/currenttt.js").await;
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["__gsh"], TOKEN);
    assert_eq!(body["__args"][0], Value::Null);
    assert_eq!(body["__args"][1]["id"], "77");
    assert_eq!(body["__args"][1]["year"], 2024);
    assert_eq!(body["__args"][1]["table"], "students");
}

#[tokio::test]
async fn canteen_is_parsed_and_order_can_change() {
    let portal = MockPortal::start().await;
    let client = logged_in(&portal).await;
    portal
        .mount_menu_page(&fixtures::canteen_data("2024-05-06", "2099-01-01 10:00", false))
        .await;
    portal.mount_menu_reply(&json!({"status": "ok"})).await;

    let canteen = client.get_canteen(day(2024, 5, 6)).await.unwrap();
    assert_eq!(canteen.info.boarder_id, "5501");
    let menu = canteen.menu(day(2024, 5, 6)).expect("menu");
    assert!(!menu.ordered);
    assert_eq!(menu.meals[0].name, "Chicken soup");

    client.change_order_status(day(2024, 5, 6), true).await.unwrap();

    let posts: Vec<_> = portal
        .requests_to("/menu/")
        .await
        .into_iter()
        .filter(|request| request.method.as_str() == "POST")
        .collect();
    let params = envelope_params(&posts[0].body);
    assert_eq!(params["akcia"], "ulozJedlaStravnika");
    let selection: Value = serde_json::from_str(&params["jedlaStravnika"]).unwrap();
    assert_eq!(selection["stravnikid"], "5501");
    assert_eq!(selection["mysqlDate"], "2024-05-06");
    assert_eq!(selection["jids"]["2"], "A");
}

#[tokio::test]
async fn order_past_deadline_is_unchangeable() {
    let portal = MockPortal::start().await;
    let client = logged_in(&portal).await;
    portal
        .mount_menu_page(&fixtures::canteen_data("2020-05-06", "2020-05-04 14:00", true))
        .await;

    let err = client
        .change_order_status(day(2020, 5, 6), false)
        .await
        .expect_err("too late");
    assert!(matches!(err, PortalError::Unchangeable { .. }));
}

#[tokio::test]
async fn insufficient_privileges_is_unauthorized() {
    let portal = MockPortal::start().await;
    let client = logged_in(&portal).await;
    portal
        .mount_menu_page(&fixtures::canteen_data("2024-05-06", "2099-01-01 10:00", false))
        .await;
    portal
        .mount_menu_reply(&json!({"status": "insufficient_privileges"}))
        .await;

    let err = client
        .change_order_status(day(2024, 5, 6), true)
        .await
        .expect_err("no rights");
    assert!(err.is_unauthorized());
}

#[tokio::test]
async fn ping_reports_liveness() {
    let portal = MockPortal::start().await;
    let client = logged_in(&portal).await;
    portal.mount_ping("OK").await;
    assert!(client.ping_session().await.unwrap());

    let requests = portal.requests_to("/login/eauth").await;
    assert_eq!(requests[0].body, b"gpids=");
    assert_eq!(client.state().await, ClientState::Authenticated);
}

#[tokio::test]
async fn logged_out_ping_marks_stale() {
    let portal = MockPortal::start().await;
    let client = logged_in(&portal).await;
    portal.mount_ping("notlogged").await;
    assert!(!client.ping_session().await.unwrap());
    assert_eq!(client.state().await, ClientState::Stale);
}

#[tokio::test]
async fn send_message_requires_changes() {
    let portal = MockPortal::start().await;
    let client = logged_in(&portal).await;
    portal
        .mount_create_item(&json!({"status": "ok", "changes": [{"timelineid": "55"}]}))
        .await;

    let options = MessageOptions {
        text: "Hello".into(),
        important: true,
        ..Default::default()
    };
    client.send_message("Ucitel12", &options).await.unwrap();

    let requests = portal.requests_to("/timeline/").await;
    let request = requests.last().expect("createItem request");
    assert_eq!(request.headers["x-requested-with"], "XMLHttpRequest");
    let fields = form_fields(&request.body);
    assert_eq!(fields["typ"], "sprava");
    assert_eq!(fields["selectedUser"], "Ucitel12");
    assert_eq!(fields["receipt"], "1");
}

#[tokio::test]
async fn send_message_without_changes_fails() {
    let portal = MockPortal::start().await;
    let client = logged_in(&portal).await;
    portal
        .mount_create_item(&json!({"status": "fail", "changes": []}))
        .await;

    let options = MessageOptions {
        text: "Hello".into(),
        ..Default::default()
    };
    assert!(client.send_message("Ucitel12", &options).await.is_err());
}

#[tokio::test]
async fn reference_lookups_use_snapshot() {
    let portal = MockPortal::start().await;
    portal.mount_login_success().await;
    portal
        .mount_user_page(TOKEN, &fixtures::user_bootstrap("Student77", "77"))
        .await;
    let client = login(&portal).await.unwrap();

    assert!(matches!(
        client.subject("9").await,
        Err(PortalError::Uninitialized(_))
    ));

    client.get_user(false).await.unwrap();
    assert_eq!(client.subject("9").await.unwrap().name, "Mathematics");
    assert_eq!(client.teacher("-12").await.unwrap().last_name, "Kral");
    assert_eq!(client.classroom("4").await.unwrap().short, "L1");
    assert_eq!(client.student_id().await.unwrap(), "77");
    assert!(matches!(
        client.subject("404").await,
        Err(PortalError::NotFound { kind: "subject", .. })
    ));
}

#[tokio::test]
async fn cached_user_is_reused_until_forced() {
    let portal = MockPortal::start().await;
    let client = logged_in(&portal).await;
    client.get_user(false).await.unwrap();
    assert_eq!(portal.requests_to("/user/").await.len(), 1);
    client.get_user(true).await.unwrap();
    assert_eq!(portal.requests_to("/user/").await.len(), 2);
}

#[tokio::test]
async fn homework_attachments_are_collected() {
    let portal = MockPortal::start().await;
    let client = logged_in(&portal).await;
    let content = json!({"widgets": [{"props": {"files": [
        {"name": "sheet.pdf", "src": "/elearning/file/7"}
    ]}}]});
    portal
        .mount_material(&json!({"materialData": {"cardsData": {
            "1": {"content": content.to_string()}
        }}}))
        .await;

    let homework: Homework =
        serde_json::from_value(fixtures::homework("h1", "sup-1", "t-9")).unwrap();
    let files = client.fetch_homework_attachments(&homework).await.unwrap();
    assert_eq!(files["sheet.pdf"], "/elearning/file/7");

    let bare = Homework::default();
    assert!(matches!(
        client.fetch_homework_attachments(&bare).await,
        Err(PortalError::NotFound { .. })
    ));
}

#[tokio::test]
async fn closed_client_refuses_calls() {
    let portal = MockPortal::start().await;
    let client = logged_in(&portal).await;
    client.close().await;
    assert_eq!(client.state().await, ClientState::Closed);
    assert!(matches!(
        client.get_user(false).await,
        Err(PortalError::Closed)
    ));
    assert!(matches!(
        client.ping_session().await,
        Err(PortalError::Closed)
    ));
}
