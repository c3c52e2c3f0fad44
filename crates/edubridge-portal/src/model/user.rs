// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The user snapshot scraped from the portal's user page.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de;
use super::timeline::TimelineItem;

/// Profile, reference tables, and the most recent timeline slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_edubar", default)]
    pub edubar: Map<String, Value>,

    /// Short recent slice only; fetch the timeline for more.
    #[serde(rename = "items", default, deserialize_with = "de::list")]
    pub recent_timeline: Vec<TimelineItem>,

    #[serde(default)]
    pub dbi: Dbi,

    #[serde(rename = "userrow", default)]
    pub user_row: UserRow,

    #[serde(rename = "eventtypes", default, deserialize_with = "de::list")]
    pub event_types: Vec<EventType>,

    #[serde(rename = "usergroups", default, deserialize_with = "de::strings")]
    pub user_groups: Vec<String>,

    /// Day plan as delivered; its layout varies between school types.
    #[serde(rename = "dp", default)]
    pub day_plan: Value,

    #[serde(rename = "meninyDnes", default, deserialize_with = "de::string")]
    pub nameday_today: String,

    #[serde(rename = "meninyZajtra", default, deserialize_with = "de::string")]
    pub nameday_tomorrow: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRow {
    #[serde(rename = "UserID", default, deserialize_with = "de::string")]
    pub user_id: String,
    #[serde(rename = "StudentID", default, deserialize_with = "de::string")]
    pub student_id: String,
    #[serde(rename = "p_meno", default, deserialize_with = "de::string")]
    pub first_name: String,
    #[serde(rename = "p_priezvisko", default, deserialize_with = "de::string")]
    pub last_name: String,
    #[serde(rename = "p_mail", default, deserialize_with = "de::string")]
    pub email: String,
    #[serde(rename = "TriedaID", default, deserialize_with = "de::string")]
    pub class_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventType {
    #[serde(default, deserialize_with = "de::string")]
    pub id: String,
    #[serde(default, deserialize_with = "de::string")]
    pub name: String,
    #[serde(rename = "ttcancel", default, deserialize_with = "de::boolean")]
    pub cancels_timetable: bool,
    #[serde(default, deserialize_with = "de::boolean")]
    pub lesson: bool,
    #[serde(default, deserialize_with = "de::boolean")]
    pub attendance: bool,
}

/// Reference tables keyed by portal-assigned IDs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dbi {
    #[serde(default, deserialize_with = "de::map")]
    pub teachers: BTreeMap<String, Teacher>,
    #[serde(default, deserialize_with = "de::map")]
    pub classes: BTreeMap<String, Class>,
    #[serde(default, deserialize_with = "de::map")]
    pub subjects: BTreeMap<String, Subject>,
    #[serde(default, deserialize_with = "de::map")]
    pub classrooms: BTreeMap<String, Classroom>,
    #[serde(default, deserialize_with = "de::map")]
    pub students: BTreeMap<String, Student>,
    #[serde(default, deserialize_with = "de::map")]
    pub parents: BTreeMap<String, Parent>,
    /// Keyed by period number; list-shaped payloads are keyed by index.
    #[serde(default, deserialize_with = "de::map")]
    pub periods: BTreeMap<String, Period>,
    #[serde(rename = "dayparts", default, deserialize_with = "de::map")]
    pub day_parts: BTreeMap<String, Period>,
    #[serde(rename = "absenttypes", default, deserialize_with = "de::map")]
    pub absent_types: BTreeMap<String, NamedType>,
    #[serde(rename = "substitutiontypes", default, deserialize_with = "de::map")]
    pub substitution_types: BTreeMap<String, NamedType>,
    #[serde(rename = "studentabsenttypes", default, deserialize_with = "de::map")]
    pub student_absent_types: BTreeMap<String, NamedType>,
    #[serde(rename = "eventtypes", default, deserialize_with = "de::map")]
    pub event_types: BTreeMap<String, NamedType>,
    #[serde(rename = "processtypes", default, deserialize_with = "de::map")]
    pub process_types: BTreeMap<String, ProcessType>,
    #[serde(rename = "processstates", default, deserialize_with = "de::map")]
    pub process_states: BTreeMap<String, ProcessState>,
    #[serde(rename = "isstudentadult", default, deserialize_with = "de::boolean")]
    pub is_student_adult: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    #[serde(default, deserialize_with = "de::string")]
    pub id: String,
    #[serde(rename = "firstname", default, deserialize_with = "de::string")]
    pub first_name: String,
    #[serde(rename = "lastname", default, deserialize_with = "de::string")]
    pub last_name: String,
    #[serde(default, deserialize_with = "de::string")]
    pub short: String,
    #[serde(default, deserialize_with = "de::string")]
    pub gender: String,
    #[serde(rename = "classroomid", default, deserialize_with = "de::string")]
    pub classroom_id: String,
    #[serde(rename = "isout", default, deserialize_with = "de::boolean")]
    pub is_out: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Class {
    #[serde(default, deserialize_with = "de::string")]
    pub id: String,
    #[serde(default, deserialize_with = "de::string")]
    pub name: String,
    #[serde(default, deserialize_with = "de::string")]
    pub short: String,
    #[serde(default, deserialize_with = "de::string")]
    pub grade: String,
    #[serde(rename = "teacherid", default, deserialize_with = "de::string")]
    pub teacher_id: String,
    #[serde(rename = "teacher2id", default, deserialize_with = "de::string")]
    pub teacher2_id: String,
    #[serde(rename = "classroomid", default, deserialize_with = "de::string")]
    pub classroom_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default, deserialize_with = "de::string")]
    pub id: String,
    #[serde(default, deserialize_with = "de::string")]
    pub name: String,
    #[serde(default, deserialize_with = "de::string")]
    pub short: String,
    #[serde(rename = "cbhidden", default, deserialize_with = "de::boolean")]
    pub hidden: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classroom {
    #[serde(default, deserialize_with = "de::string")]
    pub id: String,
    #[serde(default, deserialize_with = "de::string")]
    pub name: String,
    #[serde(default, deserialize_with = "de::string")]
    pub short: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(default, deserialize_with = "de::string")]
    pub id: String,
    #[serde(rename = "classid", alias = "classroomid", default, deserialize_with = "de::string")]
    pub class_id: String,
    #[serde(rename = "firstname", default, deserialize_with = "de::string")]
    pub first_name: String,
    #[serde(rename = "lastname", default, deserialize_with = "de::string")]
    pub last_name: String,
    #[serde(rename = "parent1id", default, deserialize_with = "de::string")]
    pub parent1_id: String,
    #[serde(rename = "parent2id", default, deserialize_with = "de::string")]
    pub parent2_id: String,
    #[serde(rename = "parent3id", default, deserialize_with = "de::string")]
    pub parent3_id: String,
    #[serde(default, deserialize_with = "de::string")]
    pub gender: String,
    #[serde(rename = "numberinclass", default, deserialize_with = "de::string")]
    pub number_in_class: String,
    #[serde(rename = "isout", default, deserialize_with = "de::boolean")]
    pub is_out: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parent {
    #[serde(default, deserialize_with = "de::string")]
    pub id: String,
    #[serde(rename = "firstname", default, deserialize_with = "de::string")]
    pub first_name: String,
    #[serde(rename = "lastname", default, deserialize_with = "de::string")]
    pub last_name: String,
    #[serde(default, deserialize_with = "de::string")]
    pub gender: String,
}

/// A lesson period or day part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Period {
    #[serde(default, deserialize_with = "de::string")]
    pub id: String,
    #[serde(rename = "starttime", default, deserialize_with = "de::string")]
    pub start_time: String,
    #[serde(rename = "endtime", default, deserialize_with = "de::string")]
    pub end_time: String,
    #[serde(default, deserialize_with = "de::string")]
    pub name: String,
    #[serde(default, deserialize_with = "de::string")]
    pub short: String,
}

/// Catalog entry shared by absence, substitution, and event type tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedType {
    #[serde(default, deserialize_with = "de::string")]
    pub id: String,
    #[serde(default, deserialize_with = "de::string")]
    pub name: String,
    #[serde(default, deserialize_with = "de::string")]
    pub short: String,
    #[serde(default, deserialize_with = "de::string")]
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessType {
    #[serde(default, deserialize_with = "de::string")]
    pub id: String,
    #[serde(default, deserialize_with = "de::string")]
    pub name: String,
    #[serde(default, deserialize_with = "de::string")]
    pub workflow: String,
    #[serde(default, deserialize_with = "de::boolean")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessState {
    #[serde(default, deserialize_with = "de::string")]
    pub id: String,
    #[serde(default, deserialize_with = "de::string")]
    pub name: String,
    #[serde(default, deserialize_with = "de::string")]
    pub color: String,
}

/// Parse the `.userhome(...)` bootstrap argument.
pub fn parse_user(json: &str) -> Result<User, edubridge_core::PortalError> {
    serde_json::from_str(json)
        .map_err(|e| edubridge_core::PortalError::decode_with("user bootstrap is not a user object", e))
}
