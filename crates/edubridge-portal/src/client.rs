// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The portal client facade.
//!
//! [`EduClient`] owns one authenticated session and a lazily fetched user
//! snapshot. It never logs in again on its own: once a call is rejected as
//! unauthorized the client turns [`ClientState::Stale`] and the owner is
//! expected to log in and build a fresh client.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate};
use edubridge_core::{ClientState, HalfYear, PortalError};
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::codec::encode_request;
use crate::extract::{extract_edupage_data, extract_session_token, extract_user_bootstrap};
use crate::message::{MessageOptions, message_form};
use crate::model::{
    Canteen, Classroom, DATE_FORMAT, Homework, Results, Subject, Teacher, Timeline, Timetable,
    User, parse_canteen, parse_material_attachments, parse_results, parse_timeline,
    parse_timetable, parse_user,
};
use crate::recent;
use crate::session::{Credentials, ajax_headers};

const USER_PATH: &str = "/user/?";
const TIMELINE_PATH: &str = "/timeline/?akcia=getData";
const RESULTS_PATH: &str = "/znamky/?what=studentviewer&akcia=studentData&eqav=1&maxEqav=7";
const TIMETABLE_PATH: &str = "/timetable/server/currenttt.js?__func=curentttGetData";
const MENU_PATH: &str = "/menu/";
const PING_PATH: &str = "/login/eauth?portalping";
const CREATE_ITEM_PATH: &str = "/timeline/?akcia=createItem";
const MATERIAL_PATH: &str = "/elearning/?cmd=MaterialPlayer&akcia=getETestData";

const PING_ALIVE: &str = "OK";
const PING_LOGGED_OUT: &str = "notlogged";
const INSUFFICIENT_PRIVILEGES: &str = "insufficient_privileges";

struct Snapshot {
    state: ClientState,
    token: Option<String>,
    user: Option<Arc<User>>,
    canteen: Option<Arc<Canteen>>,
}

/// A logged-in portal session with typed operations.
pub struct EduClient {
    credentials: Credentials,
    inner: RwLock<Snapshot>,
}

impl std::fmt::Debug for EduClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EduClient")
            .field("server", &self.credentials.server())
            .field("username", &self.credentials.username())
            .finish_non_exhaustive()
    }
}

impl EduClient {
    /// Wraps a session without fetching anything yet.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            inner: RwLock::new(Snapshot {
                state: ClientState::Uninitialized,
                token: None,
                user: None,
                canteen: None,
            }),
        }
    }

    /// Wraps a session and performs the first user fetch.
    pub async fn connect(credentials: Credentials) -> Result<Self, PortalError> {
        let client = Self::new(credentials);
        client.get_user(true).await?;
        Ok(client)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub async fn state(&self) -> ClientState {
        self.inner.read().await.state
    }

    /// The `gsechash` captured by the last user fetch.
    pub async fn session_token(&self) -> Option<String> {
        self.inner.read().await.token.clone()
    }

    async fn ensure_open(&self) -> Result<(), PortalError> {
        match self.inner.read().await.state {
            ClientState::Closed => Err(PortalError::Closed),
            _ => Ok(()),
        }
    }

    async fn mark_stale(&self, reason: &str) {
        let mut inner = self.inner.write().await;
        if matches!(
            inner.state,
            ClientState::Uninitialized | ClientState::Authenticated
        ) {
            warn!(
                server = self.credentials.server(),
                username = self.credentials.username(),
                reason,
                "session rejected, client is now stale"
            );
            inner.state = ClientState::Stale;
        }
    }

    /// Moves the client to `Stale` when `result` is an authorization failure.
    async fn track<T>(&self, result: Result<T, PortalError>) -> Result<T, PortalError> {
        if let Err(err) = &result
            && err.is_unauthorized()
        {
            self.mark_stale(&err.to_string()).await;
        }
        result
    }

    async fn user_snapshot(&self) -> Result<Arc<User>, PortalError> {
        self.inner.read().await.user.clone().ok_or_else(|| {
            PortalError::Uninitialized("the user snapshot has not been fetched".into())
        })
    }

    /// Returns the user snapshot, fetching it when absent or when forced.
    pub async fn get_user(&self, force_refresh: bool) -> Result<Arc<User>, PortalError> {
        self.ensure_open().await?;
        if !force_refresh
            && let Some(user) = self.inner.read().await.user.clone()
        {
            return Ok(user);
        }

        let (token, user) = self.track(self.fetch_user().await).await?;
        let user = Arc::new(user);

        let mut inner = self.inner.write().await;
        if inner.state == ClientState::Closed {
            return Err(PortalError::Closed);
        }
        inner.token = Some(token);
        inner.user = Some(Arc::clone(&user));
        inner.state = ClientState::Authenticated;
        info!(
            server = self.credentials.server(),
            user_id = %user.user_row.user_id,
            "user snapshot refreshed"
        );
        Ok(user)
    }

    async fn fetch_user(&self) -> Result<(String, User), PortalError> {
        let html = self.credentials.get_text(USER_PATH).await?;
        let token = extract_session_token(&html)?;
        let user = parse_user(extract_user_bootstrap(&html)?)?;
        Ok((token, user))
    }

    /// Timeline items and homeworks between two days, inclusive.
    pub async fn get_timeline(&self, from: NaiveDate, to: NaiveDate) -> Result<Timeline, PortalError> {
        self.ensure_open().await?;
        debug!(server = self.credentials.server(), %from, %to, "fetching timeline");
        let envelope = encode_request([
            ("datefrom", from.format(DATE_FORMAT).to_string()),
            ("dateto", to.format(DATE_FORMAT).to_string()),
        ]);
        let result = async {
            let json = self.credentials.post_envelope(TIMELINE_PATH, &envelope).await?;
            parse_timeline(&json)
        }
        .await;
        self.track(result).await
    }

    /// The last 30 days of the timeline.
    pub async fn get_recent_timeline(&self) -> Result<Timeline, PortalError> {
        let (from, to) = recent::timeline_window(Local::now().date_naive());
        self.get_timeline(from, to).await
    }

    /// Grades, events, and notes for a school year (`"2023"`) and half-year.
    pub async fn get_results(&self, year: &str, half: HalfYear) -> Result<Results, PortalError> {
        self.ensure_open().await?;
        debug!(server = self.credentials.server(), year, %half, "fetching results");
        let envelope = encode_request([
            ("pohlad", "podladatumu".to_string()),
            ("znamky_yearid", year.to_string()),
            ("znamky_yearid_ns", "1".to_string()),
            ("nadobdobie", half.to_string()),
            ("rokobdobie", format!("{year}::{half}")),
            ("doRq", "1".to_string()),
            ("what", "studentviewer".to_string()),
            ("updateLastView", "0".to_string()),
        ]);
        let result = async {
            let json = self.credentials.post_envelope(RESULTS_PATH, &envelope).await?;
            parse_results(&json)
        }
        .await;
        self.track(result).await
    }

    /// Results for the half-year that contains today.
    pub async fn get_recent_results(&self) -> Result<Results, PortalError> {
        let (year, half) = recent::results_period(Local::now().date_naive());
        self.get_results(&year, half).await
    }

    /// The student's timetable between two days. Needs the user snapshot.
    pub async fn get_timetable(&self, from: NaiveDate, to: NaiveDate) -> Result<Timetable, PortalError> {
        self.ensure_open().await?;
        let (student_id, token) = {
            let inner = self.inner.read().await;
            let student_id = inner
                .user
                .as_ref()
                .map(|user| user.user_row.student_id.clone())
                .ok_or_else(|| {
                    PortalError::Uninitialized(
                        "the timetable needs the user snapshot; fetch the user first".into(),
                    )
                })?;
            (student_id, inner.token.clone().unwrap_or_default())
        };
        debug!(server = self.credentials.server(), %from, %to, "fetching timetable");

        let request = json!({
            "__args": [null, {
                "year": from.year(),
                "datefrom": from.format(DATE_FORMAT).to_string(),
                "dateto": to.format(DATE_FORMAT).to_string(),
                "table": "students",
                "id": student_id,
                "showColors": false,
                "showOrig": true,
                "showIgroupsInClasses": false,
                "log_module": "CurrentTTView",
            }],
            "__gsh": token,
        });
        let result = async {
            let json = self.credentials.post_json(TIMETABLE_PATH, &request).await?;
            parse_timetable(&json)
        }
        .await;
        self.track(result).await
    }

    /// Yesterday through a week from today.
    pub async fn get_recent_timetable(&self) -> Result<Timetable, PortalError> {
        let (from, to) = recent::timetable_window(Local::now().date_naive());
        self.get_timetable(from, to).await
    }

    /// The canteen menu page around `date`. The result is kept for order changes.
    pub async fn get_canteen(&self, date: NaiveDate) -> Result<Canteen, PortalError> {
        self.ensure_open().await?;
        debug!(server = self.credentials.server(), %date, "fetching canteen");
        let path = format!("{MENU_PATH}?date={}", date.format("%Y%m%d"));
        let result = async {
            let html = self.credentials.get_text(&path).await?;
            parse_canteen(extract_edupage_data(&html)?)
        }
        .await;
        let canteen = self.track(result).await?;
        self.inner.write().await.canteen = Some(Arc::new(canteen.clone()));
        Ok(canteen)
    }

    /// This week's menu; on weekends, next week's.
    pub async fn get_recent_canteen(&self) -> Result<Canteen, PortalError> {
        self.get_canteen(recent::canteen_day(Local::now().date_naive()))
            .await
    }

    async fn canteen_covering(&self, date: NaiveDate) -> Result<Arc<Canteen>, PortalError> {
        let cached = self
            .inner
            .read()
            .await
            .canteen
            .clone()
            .filter(|canteen| canteen.days.contains_key(&date));
        match cached {
            Some(canteen) => Ok(canteen),
            None => self.get_canteen(date).await.map(Arc::new),
        }
    }

    /// Orders (`true`) or cancels (`false`) lunch on `date`.
    ///
    /// Fails with [`PortalError::Unchangeable`] once the deadline for that
    /// change has passed.
    pub async fn change_order_status(&self, date: NaiveDate, order: bool) -> Result<(), PortalError> {
        self.ensure_open().await?;
        let canteen = self.canteen_covering(date).await?;
        let menu = canteen.menu(date).ok_or_else(|| PortalError::NotFound {
            kind: "menu",
            id: date.format(DATE_FORMAT).to_string(),
        })?;

        let now = Local::now().naive_local();
        let allowed = if order {
            menu.can_order(now)
        } else {
            menu.can_cancel(now)
        };
        if !allowed {
            return Err(PortalError::Unchangeable {
                date: date.format(DATE_FORMAT).to_string(),
            });
        }

        let selection = json!({
            "stravnikid": canteen.info.boarder_id,
            "mysqlDate": date.format(DATE_FORMAT).to_string(),
            "jids": { "2": if order { "A" } else { "AX" } },
            "view": "pc_listok",
            "pravo": "Student",
        });
        let envelope = encode_request([
            ("akcia", "ulozJedlaStravnika".to_string()),
            ("jedlaStravnika", selection.to_string()),
        ]);
        let json = self
            .track(self.credentials.post_envelope(MENU_PATH, &envelope).await)
            .await?;

        let reply: StatusReply = serde_json::from_slice(&json)
            .map_err(|e| PortalError::decode_with("canteen reply is not JSON", e))?;
        match reply.status {
            Value::String(status) if status == INSUFFICIENT_PRIVILEGES => {
                return Err(PortalError::Unauthorized(
                    "account may not change canteen orders".into(),
                ));
            }
            Value::String(_) | Value::Null => {}
            _ => return Err(PortalError::decode("canteen reply has a malformed status")),
        }

        let mut inner = self.inner.write().await;
        if let Some(cached) = inner.canteen.as_mut()
            && let Some(menu) = Arc::make_mut(cached).days.get_mut(&date)
        {
            menu.ordered = order;
        }
        info!(server = self.credentials.server(), %date, order, "canteen order changed");
        Ok(())
    }

    /// Posts a timeline message to `recipient` (a portal user string such as `Ucitel12`).
    pub async fn send_message(
        &self,
        recipient: &str,
        options: &MessageOptions,
    ) -> Result<(), PortalError> {
        self.ensure_open().await?;
        let fields = message_form(recipient, options)?;
        let headers = ajax_headers(&self.credentials.origin());
        let body = self
            .track(
                self.credentials
                    .post_form(
                        CREATE_ITEM_PATH,
                        fields.iter().map(|(k, v)| (*k, v.as_str())),
                        headers,
                    )
                    .await,
            )
            .await?;

        let reply: CreateItemReply = serde_json::from_slice(&body)
            .map_err(|e| PortalError::decode_with("message reply is not JSON", e))?;
        if reply.changes.is_empty() {
            return Err(PortalError::decode(format!(
                "message was not created (status `{}`)",
                reply.status
            )));
        }
        if reply.changes.len() > 1 {
            debug!(changes = reply.changes.len(), "single message produced several changes");
        }
        info!(server = self.credentials.server(), recipient, "message sent");
        Ok(())
    }

    /// File name to link for every file attached to an e-learning homework.
    pub async fn fetch_homework_attachments(
        &self,
        homework: &Homework,
    ) -> Result<BTreeMap<String, String>, PortalError> {
        self.ensure_open().await?;
        if homework.superid.is_empty() || homework.test_id.is_empty() {
            return Err(PortalError::NotFound {
                kind: "homework material",
                id: homework.id.clone(),
            });
        }
        let envelope = encode_request([
            ("testid", homework.test_id.as_str()),
            ("superid", homework.superid.as_str()),
        ]);
        let result = async {
            let json = self.credentials.post_envelope(MATERIAL_PATH, &envelope).await?;
            parse_material_attachments(&json)
        }
        .await;
        self.track(result).await
    }

    /// Asks the portal whether the session is still logged in.
    ///
    /// `Ok(false)` also moves the client to `Stale`.
    pub async fn ping_session(&self) -> Result<bool, PortalError> {
        self.ensure_open().await?;
        let body = self
            .track(
                self.credentials
                    .post_form(PING_PATH, [("gpids", "")], HeaderMap::new())
                    .await,
            )
            .await?;
        let alive = parse_ping(&body)?;
        if !alive {
            self.mark_stale("portal reports the session as logged out").await;
        }
        Ok(alive)
    }

    /// The portal user ID from the snapshot, e.g. `Student1234`.
    pub async fn user_id(&self) -> Result<String, PortalError> {
        Ok(self.user_snapshot().await?.user_row.user_id.clone())
    }

    pub async fn student_id(&self) -> Result<String, PortalError> {
        Ok(self.user_snapshot().await?.user_row.student_id.clone())
    }

    pub async fn subject(&self, id: &str) -> Result<Subject, PortalError> {
        let user = self.user_snapshot().await?;
        user.dbi.subjects.get(id).cloned().ok_or_else(|| PortalError::NotFound {
            kind: "subject",
            id: id.to_string(),
        })
    }

    pub async fn teacher(&self, id: &str) -> Result<Teacher, PortalError> {
        let user = self.user_snapshot().await?;
        user.dbi.teachers.get(id).cloned().ok_or_else(|| PortalError::NotFound {
            kind: "teacher",
            id: id.to_string(),
        })
    }

    pub async fn classroom(&self, id: &str) -> Result<Classroom, PortalError> {
        let user = self.user_snapshot().await?;
        user.dbi.classrooms.get(id).cloned().ok_or_else(|| PortalError::NotFound {
            kind: "classroom",
            id: id.to_string(),
        })
    }

    /// Drops the snapshot and refuses further calls.
    pub async fn close(&self) {
        let mut inner = self.inner.write().await;
        inner.state = ClientState::Closed;
        inner.token = None;
        inner.user = None;
        inner.canteen = None;
        debug!(server = self.credentials.server(), "client closed");
    }
}

#[derive(Deserialize)]
struct StatusReply {
    #[serde(default)]
    status: Value,
}

#[derive(Deserialize)]
struct CreateItemReply {
    #[serde(default)]
    status: String,
    #[serde(default)]
    changes: Vec<Value>,
}

#[derive(Deserialize)]
struct PingReply {
    #[serde(default)]
    status: String,
}

/// `OK` and `notlogged` arrive as bare text; anything else must be `{status}` JSON.
fn parse_ping(body: &[u8]) -> Result<bool, PortalError> {
    let text = String::from_utf8_lossy(body);
    match text.trim() {
        PING_ALIVE => Ok(true),
        PING_LOGGED_OUT => Ok(false),
        _ => {
            let reply: PingReply = serde_json::from_slice(body)
                .map_err(|e| PortalError::decode_with("unexpected ping reply", e))?;
            Ok(reply.status != PING_LOGGED_OUT)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_reply_forms() {
        assert!(parse_ping(b"OK").unwrap());
        assert!(!parse_ping(b"notlogged").unwrap());
        assert!(!parse_ping(br#"{"status":"notlogged"}"#).unwrap());
        assert!(parse_ping(br#"{"status":"ok","gpids":[]}"#).unwrap());
        let err = parse_ping(b"<html>").expect_err("garbage");
        assert_eq!(err.kind(), "decode");
    }
}
