// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed portal entities and the parsers that build them from decoded JSON.
//!
//! Parsers only return raw IDs; resolving them against the user's reference
//! tables happens at the call site.

pub(crate) mod de;

pub mod canteen;
pub mod data;
pub mod material;
pub mod results;
pub mod time;
pub mod timeline;
pub mod timetable;
pub mod user;

pub use canteen::{Canteen, CanteenInfo, Meal, Menu, parse_canteen};
pub use data::ItemData;
pub use material::parse_material_attachments;
pub use results::{Event, Grade, Note, Results, parse_results};
pub use time::{DATE_FORMAT, PortalTime, TIME_FORMAT};
pub use timeline::{
    Homework, HomeworkNoticeView, ItemKind, MessageView, Timeline, TimelineItem, parse_timeline,
};
pub use timetable::{Timetable, TimetableItem, parse_timetable};
pub use user::{
    Class, Classroom, Dbi, EventType, NamedType, Parent, Period, ProcessState, ProcessType,
    Student, Subject, Teacher, User, UserRow, parse_user,
};
