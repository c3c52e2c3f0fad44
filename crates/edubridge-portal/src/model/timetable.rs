// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timetable entries grouped by calendar day.
//!
//! Entries reference subjects, classes, teachers, and classrooms by raw ID;
//! resolving them against the user's reference tables is left to the caller.

use std::collections::BTreeMap;

use edubridge_core::PortalError;
use serde::{Deserialize, Serialize};

use super::de;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimetableItem {
    #[serde(rename = "type", default, deserialize_with = "de::string")]
    pub kind: String,
    #[serde(default, deserialize_with = "de::string")]
    pub date: String,
    #[serde(rename = "uniperiod", default, deserialize_with = "de::string")]
    pub period: String,
    #[serde(rename = "starttime", default, deserialize_with = "de::string")]
    pub start_time: String,
    #[serde(rename = "endtime", default, deserialize_with = "de::string")]
    pub end_time: String,
    #[serde(rename = "subjectid", default, deserialize_with = "de::string")]
    pub subject_id: String,
    #[serde(rename = "classids", default, deserialize_with = "de::strings")]
    pub class_ids: Vec<String>,
    #[serde(rename = "groupnames", default, deserialize_with = "de::strings")]
    pub group_names: Vec<String>,
    #[serde(rename = "igroupid", default, deserialize_with = "de::string")]
    pub igroup_id: String,
    #[serde(rename = "teacherids", default, deserialize_with = "de::strings")]
    pub teacher_ids: Vec<String>,
    #[serde(rename = "classroomids", default, deserialize_with = "de::strings")]
    pub classroom_ids: Vec<String>,
    #[serde(rename = "studentids", default, deserialize_with = "de::strings")]
    pub student_ids: Vec<String>,
    #[serde(default, deserialize_with = "de::strings")]
    pub colors: Vec<String>,
}

/// Day (`YYYY-MM-DD`) to that day's entries in delivery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timetable {
    pub days: BTreeMap<String, Vec<TimetableItem>>,
}

impl Timetable {
    pub fn day(&self, date: &str) -> &[TimetableItem] {
        self.days.get(date).map(Vec::as_slice).unwrap_or_default()
    }

    /// All entries, day by day.
    pub fn entries(&self) -> impl Iterator<Item = &TimetableItem> {
        self.days.values().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

#[derive(Deserialize)]
struct RawTimetable {
    r: RawTimetableBody,
}

#[derive(Deserialize)]
struct RawTimetableBody {
    #[serde(rename = "ttitems", default, deserialize_with = "de::list")]
    items: Vec<TimetableItem>,
}

/// Parse a `{r: {ttitems: [...]}}` timetable response.
pub fn parse_timetable(json: &[u8]) -> Result<Timetable, PortalError> {
    let raw: RawTimetable = serde_json::from_slice(json)
        .map_err(|e| PortalError::decode_with("timetable response has an unexpected shape", e))?;

    let mut days: BTreeMap<String, Vec<TimetableItem>> = BTreeMap::new();
    for item in raw.r.items {
        days.entry(item.date.clone()).or_default().push(item);
    }
    Ok(Timetable { days })
}
