// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Grades, grading events, and teacher notes.

use std::collections::BTreeMap;

use edubridge_core::PortalError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::de;

/// Namespace of the events map that holds the school's own events.
const EVENT_NAMESPACE: &str = "edupage";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    #[serde(default, deserialize_with = "de::string")]
    pub provider: String,
    /// The grading event this grade belongs to.
    #[serde(rename = "udalostid", default, deserialize_with = "de::string")]
    pub event_id: String,
    #[serde(rename = "znamkaid", default, deserialize_with = "de::string")]
    pub id: String,
    #[serde(rename = "studentid", default, deserialize_with = "de::string")]
    pub student_id: String,
    #[serde(rename = "predmetid", default, deserialize_with = "de::string")]
    pub subject_id: String,
    #[serde(rename = "mesiac", default, deserialize_with = "de::string")]
    pub month: String,
    /// The mark itself, as entered by the teacher.
    #[serde(default, deserialize_with = "de::string")]
    pub data: String,
    #[serde(rename = "datum", default, deserialize_with = "de::string")]
    pub date: String,
    #[serde(rename = "ucitelid", default, deserialize_with = "de::string")]
    pub teacher_id: String,
    #[serde(rename = "podpisane", default, deserialize_with = "de::string")]
    pub signed: String,
    #[serde(rename = "podpisane_rodic", default, deserialize_with = "de::string")]
    pub signed_by_parent: String,
    #[serde(default, deserialize_with = "de::string")]
    pub timestamp: String,
    #[serde(rename = "stav", default, deserialize_with = "de::string")]
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, deserialize_with = "de::string")]
    pub provider: String,
    #[serde(rename = "znamkaid", default, deserialize_with = "de::string")]
    pub grade_id: String,
    #[serde(rename = "studentid", default, deserialize_with = "de::string")]
    pub student_id: String,
    #[serde(rename = "predmetid", default, deserialize_with = "de::string")]
    pub subject_id: String,
    #[serde(rename = "udalostID", default, deserialize_with = "de::string")]
    pub id: String,
    #[serde(rename = "mesiac", default, deserialize_with = "de::string")]
    pub month: String,
    #[serde(default, deserialize_with = "de::string")]
    pub data: String,
    #[serde(rename = "datum", default, deserialize_with = "de::string")]
    pub date: String,
    #[serde(rename = "ucitelid", default, deserialize_with = "de::string")]
    pub teacher_id: String,
    #[serde(rename = "podpisane", default, deserialize_with = "de::string")]
    pub signed: String,
    #[serde(rename = "podpisane_rodic", default, deserialize_with = "de::string")]
    pub signed_by_parent: String,
    #[serde(default, deserialize_with = "de::string")]
    pub timestamp: String,
    #[serde(rename = "stav", default, deserialize_with = "de::string")]
    pub state: String,
    #[serde(rename = "p_farba", default, deserialize_with = "de::string")]
    pub color: String,
    #[serde(rename = "p_meno", default, deserialize_with = "de::string")]
    pub name: String,
    #[serde(rename = "p_najskor_priemer", default, deserialize_with = "de::string")]
    pub first_average: String,
    #[serde(rename = "p_typ_udalosti", default)]
    pub event_type: Value,
    #[serde(rename = "p_vaha", default)]
    pub weight: Value,
    #[serde(rename = "TriedaID", default, deserialize_with = "de::string")]
    pub class_id: String,
    #[serde(rename = "planid", default, deserialize_with = "de::string")]
    pub plan_id: String,
    #[serde(rename = "p_pocet_znamok", default)]
    pub grade_count: Value,
    #[serde(rename = "moredata", default)]
    pub more_data: Value,
    #[serde(rename = "priemer", default, deserialize_with = "de::string")]
    pub average: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(rename = "VcelickaID", default, deserialize_with = "de::string")]
    pub id: String,
    #[serde(rename = "p_datum", default, deserialize_with = "de::string")]
    pub date: String,
    #[serde(rename = "p_text", default, deserialize_with = "de::string")]
    pub text: String,
    #[serde(rename = "p_typ", default, deserialize_with = "de::string")]
    pub kind: String,
    #[serde(rename = "PredmetID", default, deserialize_with = "de::string")]
    pub subject_id: String,
}

/// Grades by grade ID, events by event ID, notes by note ID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Results {
    pub grades: BTreeMap<String, Grade>,
    pub events: BTreeMap<String, Event>,
    pub notes: BTreeMap<String, Note>,
}

impl Results {
    /// Union on ID; entries from `newer` replace existing ones.
    pub fn merge(&mut self, newer: Results) {
        self.grades.extend(newer.grades);
        self.events.extend(newer.events);
        self.notes.extend(newer.notes);
    }

    /// Consuming form of [`Results::merge`].
    pub fn merged(mut self, newer: Results) -> Self {
        self.merge(newer);
        self
    }

    /// Grades recorded under the given event.
    pub fn grades_for_event<'a>(&'a self, event_id: &'a str) -> impl Iterator<Item = &'a Grade> {
        self.grades
            .values()
            .filter(move |grade| grade.event_id == event_id)
    }
}

#[derive(Deserialize)]
struct RawResults {
    #[serde(default, deserialize_with = "de::string")]
    status: String,
    #[serde(default)]
    data: RawResultsData,
}

#[derive(Default, Deserialize)]
struct RawResultsData {
    #[serde(rename = "vsetkyZnamky", default, deserialize_with = "de::list")]
    grades: Vec<Grade>,
    /// Namespace to event table; `[]` when there are none.
    #[serde(rename = "vsetkyUdalosti", default)]
    events: Value,
    #[serde(rename = "vsetkyVcelicky", default, deserialize_with = "de::list")]
    notes: Vec<Note>,
}

/// Parse a decoded results response. Only the school's own event namespace is kept.
pub fn parse_results(json: &[u8]) -> Result<Results, PortalError> {
    let raw: RawResults = serde_json::from_slice(json)
        .map_err(|e| PortalError::decode_with("results response has an unexpected shape", e))?;

    if !raw.status.is_empty() && raw.status != "ok" {
        tracing::debug!(status = %raw.status, "results response carries non-ok status");
    }

    let events = match raw.data.events {
        Value::Object(mut namespaces) => match namespaces.remove(EVENT_NAMESPACE) {
            Some(table) => de::map(table)
                .map_err(|e| PortalError::decode_with("events table has an unexpected shape", e))?,
            None => BTreeMap::new(),
        },
        _ => BTreeMap::new(),
    };

    Ok(Results {
        grades: raw
            .data
            .grades
            .into_iter()
            .map(|grade| (grade.id.clone(), grade))
            .collect(),
        events,
        notes: raw
            .data
            .notes
            .into_iter()
            .map(|note| (note.id.clone(), note))
            .collect(),
    })
}
