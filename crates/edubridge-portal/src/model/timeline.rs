// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timeline items (messages, homework notices, events) and homeworks.

use std::collections::BTreeMap;

use edubridge_core::PortalError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::data::ItemData;
use super::de;
use super::time::PortalTime;

/// Record type, discriminated by the `typ` tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemKind {
    /// `sprava`: a direct message.
    Message,
    /// `homework`: a homework notice.
    Homework,
    /// Any other tag, kept verbatim.
    Other(String),
}

impl Default for ItemKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for ItemKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "sprava" => Self::Message,
            "homework" => Self::Homework,
            _ => Self::Other(tag),
        }
    }
}

impl From<ItemKind> for String {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Message => "sprava".to_string(),
            ItemKind::Homework => "homework".to_string(),
            ItemKind::Other(tag) => tag,
        }
    }
}

fn item_kind<'de, D: serde::Deserializer<'de>>(d: D) -> Result<ItemKind, D::Error> {
    de::string(d).map(ItemKind::from)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineItem {
    #[serde(rename = "timelineid", default, deserialize_with = "de::string")]
    pub id: String,
    #[serde(default)]
    pub timestamp: PortalTime,
    #[serde(rename = "reakcia_na", default, deserialize_with = "de::string")]
    pub reaction_to: String,
    #[serde(rename = "typ", default, deserialize_with = "item_kind")]
    pub kind: ItemKind,
    #[serde(default, deserialize_with = "de::string")]
    pub user: String,
    #[serde(rename = "target_user", default, deserialize_with = "de::string")]
    pub target_user: String,
    #[serde(rename = "user_meno", default, deserialize_with = "de::string")]
    pub user_name: String,
    #[serde(rename = "ineid", default, deserialize_with = "de::string")]
    pub other_id: String,
    #[serde(default, deserialize_with = "de::string")]
    pub text: String,
    #[serde(rename = "cas_pridania", default)]
    pub time_added: PortalTime,
    #[serde(rename = "cas_udalosti", default)]
    pub time_event: PortalTime,
    #[serde(default)]
    pub data: ItemData,
    #[serde(rename = "vlastnik", default, deserialize_with = "de::string")]
    pub owner: String,
    #[serde(rename = "vlastnik_meno", default, deserialize_with = "de::string")]
    pub owner_name: String,
    #[serde(rename = "poct_reakcii", default, deserialize_with = "de::int")]
    pub reaction_count: i64,
    #[serde(rename = "posledna_reakcia", default, deserialize_with = "de::string")]
    pub last_reaction: String,
    #[serde(rename = "pomocny_zaznam", default, deserialize_with = "de::string")]
    pub auxiliary_record: String,
    #[serde(default, deserialize_with = "de::boolean")]
    pub removed: bool,
    #[serde(rename = "cas_pridania_btc", default)]
    pub time_added_btc: PortalTime,
    #[serde(rename = "cas_udalosti_btc", default)]
    pub time_event_btc: PortalTime,
}

/// Message-specific view of a [`TimelineItem`].
#[derive(Debug, Clone, Copy)]
pub struct MessageView<'a> {
    item: &'a TimelineItem,
}

impl MessageView<'_> {
    /// Attachment name to download path.
    ///
    /// The payload stores them as `{path: name}` under the misspelled
    /// `attachements` key.
    pub fn attachments(&self) -> BTreeMap<String, String> {
        match self.item.data.get("attachements") {
            Some(Value::Object(files)) => files
                .iter()
                .filter_map(|(path, name)| name.as_str().map(|n| (n.to_string(), path.clone())))
                .collect(),
            _ => BTreeMap::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.item.text
    }

    pub fn sender(&self) -> &str {
        &self.item.owner_name
    }
}

/// Homework-specific view of a [`TimelineItem`].
#[derive(Debug, Clone, Copy)]
pub struct HomeworkNoticeView<'a> {
    item: &'a TimelineItem,
}

impl HomeworkNoticeView<'_> {
    /// The homework `superid` this notice points at, when present as a string.
    pub fn superid(&self) -> Option<&str> {
        self.item.data.get("superid").and_then(Value::as_str)
    }

    /// Whether the linked homework carries e-test cards with attachments.
    pub fn has_attachments(&self) -> bool {
        self.superid().is_some()
            && self
                .item
                .data
                .get("etestCards")
                .and_then(Value::as_f64)
                .is_some_and(|cards| cards == 1.0)
    }
}

impl TimelineItem {
    pub fn as_message(&self) -> Option<MessageView<'_>> {
        (self.kind == ItemKind::Message).then_some(MessageView { item: self })
    }

    pub fn as_homework(&self) -> Option<HomeworkNoticeView<'_>> {
        (self.kind == ItemKind::Homework).then_some(HomeworkNoticeView { item: self })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Homework {
    #[serde(rename = "hwkid", default, deserialize_with = "de::string")]
    pub id: String,
    #[serde(rename = "homeworkid", default, deserialize_with = "de::string")]
    pub homework_id: String,
    #[serde(rename = "e_superid", default, deserialize_with = "de::string")]
    pub superid: String,
    #[serde(rename = "userid", default, deserialize_with = "de::string")]
    pub user_id: String,
    #[serde(rename = "predmetid", default, deserialize_with = "de::string")]
    pub subject_id: String,
    #[serde(rename = "planid", default, deserialize_with = "de::string")]
    pub plan_id: String,
    #[serde(default, deserialize_with = "de::string")]
    pub name: String,
    #[serde(default, deserialize_with = "de::string")]
    pub details: String,
    #[serde(rename = "datefrom", default, deserialize_with = "de::string")]
    pub date_from: String,
    #[serde(rename = "dateto", default, deserialize_with = "de::string")]
    pub date_to: String,
    #[serde(rename = "datetimefrom", default, deserialize_with = "de::string")]
    pub datetime_from: String,
    #[serde(rename = "datetimeto", default, deserialize_with = "de::string")]
    pub datetime_to: String,
    #[serde(rename = "datecreated", default, deserialize_with = "de::string")]
    pub date_created: String,
    #[serde(default)]
    pub period: Value,
    #[serde(default, deserialize_with = "de::string")]
    pub timestamp: String,
    #[serde(rename = "testid", default, deserialize_with = "de::string")]
    pub test_id: String,
    #[serde(rename = "typ", default, deserialize_with = "item_kind")]
    pub kind: ItemKind,
    #[serde(rename = "pocet_like", default, deserialize_with = "de::int")]
    pub like_count: i64,
    #[serde(rename = "pocet_reakcii", default, deserialize_with = "de::int")]
    pub reaction_count: i64,
    #[serde(rename = "pocet_done", default, deserialize_with = "de::int")]
    pub done_count: i64,
    #[serde(rename = "stav", default, deserialize_with = "de::string")]
    pub state: String,
    #[serde(rename = "posledny_vysledok", default, deserialize_with = "de::string")]
    pub last_result: String,
    #[serde(rename = "skupiny", default, deserialize_with = "de::strings")]
    pub groups: Vec<String>,
    #[serde(rename = "etestCards", default, deserialize_with = "de::int")]
    pub etest_cards: i64,
    #[serde(rename = "etestAnswerCards", default, deserialize_with = "de::int")]
    pub etest_answer_cards: i64,
    #[serde(rename = "studyTopics", default, deserialize_with = "de::boolean")]
    pub study_topics: bool,
    #[serde(rename = "znamky_udalostid", default)]
    pub grade_event_id: Value,
    #[serde(rename = "students_hidden", default, deserialize_with = "de::string")]
    pub students_hidden: String,
    #[serde(default)]
    pub data: ItemData,
    #[serde(rename = "skoncil", default)]
    pub ended: Value,
    #[serde(rename = "missingNextLesson", default, deserialize_with = "de::boolean")]
    pub missing_next_lesson: bool,
    #[serde(rename = "attachements", default)]
    pub attachments: Value,
    #[serde(rename = "autor_meno", default, deserialize_with = "de::string")]
    pub author_name: String,
    #[serde(rename = "predmet_meno", default, deserialize_with = "de::string")]
    pub subject_name: String,
}

/// Timeline items and homeworks, each keyed by ID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub items: BTreeMap<String, TimelineItem>,
    pub homeworks: BTreeMap<String, Homework>,
}

impl Timeline {
    /// Union on ID; entries from `newer` replace existing ones.
    pub fn merge(&mut self, newer: Timeline) {
        self.items.extend(newer.items);
        self.homeworks.extend(newer.homeworks);
    }

    /// Consuming form of [`Timeline::merge`].
    pub fn merged(mut self, newer: Timeline) -> Self {
        self.merge(newer);
        self
    }

    /// Looks up the homework referenced by a notice's `superid`.
    pub fn homework_by_superid(&self, superid: &str) -> Result<&Homework, PortalError> {
        self.homeworks
            .values()
            .find(|hw| hw.superid == superid)
            .ok_or_else(|| PortalError::NotFound {
                kind: "homework",
                id: superid.to_string(),
            })
    }

    pub fn messages(&self) -> impl Iterator<Item = &TimelineItem> {
        self.items
            .values()
            .filter(|item| item.kind == ItemKind::Message)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.homeworks.is_empty()
    }
}

#[derive(Deserialize)]
struct RawTimeline {
    #[serde(rename = "timelineItems", default, deserialize_with = "de::list")]
    items: Vec<TimelineItem>,
    #[serde(default, deserialize_with = "de::list")]
    homeworks: Vec<Homework>,
}

/// Parse a decoded timeline response.
pub fn parse_timeline(json: &[u8]) -> Result<Timeline, PortalError> {
    let raw: RawTimeline = serde_json::from_slice(json)
        .map_err(|e| PortalError::decode_with("timeline response has an unexpected shape", e))?;

    Ok(Timeline {
        items: raw
            .items
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect(),
        homeworks: raw
            .homeworks
            .into_iter()
            .map(|hw| (hw.id.clone(), hw))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn item(id: &str, text: &str) -> TimelineItem {
        TimelineItem {
            id: id.to_string(),
            text: text.to_string(),
            kind: ItemKind::Message,
            ..Default::default()
        }
    }

    fn timeline(entries: &[(&str, &str)]) -> Timeline {
        Timeline {
            items: entries
                .iter()
                .map(|(id, text)| (id.to_string(), item(id, text)))
                .collect(),
            homeworks: BTreeMap::new(),
        }
    }

    #[test]
    fn parses_items_and_homeworks_by_id() {
        let json = json!({
            "timelineItems": [
                {"timelineid": "1", "typ": "sprava", "text": "hi", "data": "[]",
                 "timestamp": "2024-01-02 10:00:00", "removed": "0"},
                {"timelineid": 2, "typ": "homework", "data": "{\"superid\":\"77\",\"etestCards\":1}"}
            ],
            "homeworks": [
                {"hwkid": "h1", "e_superid": "77", "name": "Essay", "etestCards": "1"}
            ]
        });
        let tl = parse_timeline(json.to_string().as_bytes()).unwrap();
        assert_eq!(tl.items.len(), 2);
        assert_eq!(tl.items["1"].text, "hi");
        assert!(tl.items["1"].data.is_empty());
        assert_eq!(tl.items["2"].kind, ItemKind::Homework);

        let notice = tl.items["2"].as_homework().expect("homework notice");
        assert_eq!(notice.superid(), Some("77"));
        assert!(notice.has_attachments());
        assert_eq!(tl.homework_by_superid("77").unwrap().name, "Essay");
        assert!(tl.homework_by_superid("78").is_err());
    }

    #[test]
    fn malformed_data_does_not_abort_collection() {
        let json = json!({
            "timelineItems": [
                {"timelineid": "1", "typ": "sprava", "data": "{broken"},
                {"timelineid": "2", "typ": "sprava", "data": {"a": 1}}
            ]
        });
        let tl = parse_timeline(json.to_string().as_bytes()).unwrap();
        assert_eq!(tl.items.len(), 2);
        assert!(tl.items["1"].data.is_error());
        assert_eq!(tl.items["2"].data.get("a"), Some(&json!(1)));
    }

    #[test]
    fn envelope_mismatch_is_a_decode_error() {
        let err = parse_timeline(b"\"not an object\"").expect_err("string envelope");
        assert_eq!(err.kind(), "decode");
    }

    #[test]
    fn message_attachments_map_name_to_path() {
        let mut msg = item("9", "see attached");
        msg.data = ItemData::decode(json!({"attachements": {"/files/a.pdf": "a.pdf"}}));
        let attachments = msg.as_message().unwrap().attachments();
        assert_eq!(attachments["a.pdf"], "/files/a.pdf");
        assert!(msg.as_homework().is_none());
    }

    #[test]
    fn unknown_kind_round_trips_through_json() {
        let parsed: TimelineItem =
            serde_json::from_value(json!({"timelineid": "3", "typ": "event"})).unwrap();
        assert_eq!(parsed.kind, ItemKind::Other("event".into()));
        let back: TimelineItem =
            serde_json::from_str(&serde_json::to_string(&parsed).unwrap()).unwrap();
        assert_eq!(back, parsed);
    }

    #[test]
    fn merge_is_last_fetched_wins() {
        let first = timeline(&[("1", "old"), ("2", "two")]);
        let second = timeline(&[("1", "new"), ("3", "three")]);
        let merged = first.merged(second);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.items["1"].text, "new");
    }

    fn arb_timeline() -> impl Strategy<Value = Timeline> {
        proptest::collection::btree_map("[0-9]{1,3}", "[a-z]{0,6}", 0..10).prop_map(|entries| {
            Timeline {
                items: entries
                    .iter()
                    .map(|(id, text)| (id.clone(), item(id, text)))
                    .collect(),
                homeworks: BTreeMap::new(),
            }
        })
    }

    proptest! {
        #[test]
        fn merge_is_idempotent(a in arb_timeline()) {
            prop_assert_eq!(a.clone().merged(a.clone()), a);
        }

        #[test]
        fn remerging_earlier_fetch_keeps_key_set(a in arb_timeline(), b in arb_timeline()) {
            let ab = a.clone().merged(b.clone());
            let aba = ab.clone().merged(a.clone());
            let keys = |t: &Timeline| t.items.keys().cloned().collect::<Vec<_>>();
            prop_assert_eq!(keys(&aba), keys(&ab));
        }
    }
}
