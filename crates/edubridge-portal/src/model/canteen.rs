// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canteen menus scraped from the `edupageData` object on the menu page.
//!
//! Only one nested shape is known:
//! `{<school>: {novyListok: {addInfo: {...}, <YYYY-MM-DD>: {"2": ticket}}}}`,
//! where `"2"` is the lunch ticket.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use edubridge_core::PortalError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::de;
use super::time::DATE_FORMAT;

const LUNCH_TICKET: &str = "2";
const ORDERED_STATE: &str = "A";

/// Boarder account details attached to the menu.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanteenInfo {
    #[serde(rename = "stravnikid", default, deserialize_with = "de::string")]
    pub boarder_id: String,
    /// Remaining account fields as delivered.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub name: String,
    pub allergens: String,
    /// Allergen numbers flagged for this meal.
    pub allergen_ids: Vec<String>,
    pub weight: String,
}

/// One day's lunch ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    pub date: NaiveDate,
    pub available_from: Option<NaiveDateTime>,
    pub available_to: Option<NaiveDateTime>,
    pub orderable_from: Option<NaiveDateTime>,
    pub orderable_until: Option<NaiveDateTime>,
    pub cancelable_until: Option<NaiveDateTime>,
    pub ordered: bool,
    pub meals: Vec<Meal>,
}

impl Menu {
    /// Whether an order can be placed at `now`. An unknown bound is open.
    pub fn can_order(&self, now: NaiveDateTime) -> bool {
        self.orderable_from.is_none_or(|from| now >= from)
            && self.orderable_until.is_none_or(|until| now <= until)
    }

    /// Whether an existing order can still be cancelled at `now`.
    pub fn can_cancel(&self, now: NaiveDateTime) -> bool {
        self.cancelable_until.is_none_or(|until| now <= until)
    }

    /// Whether the lunch is being served at `now`.
    pub fn is_available(&self, now: NaiveDateTime) -> bool {
        self.available_from.is_none_or(|from| now >= from)
            && self.available_to.is_none_or(|to| now <= to)
    }
}

/// Menus by day plus the boarder info block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Canteen {
    pub info: CanteenInfo,
    pub days: BTreeMap<NaiveDate, Menu>,
}

impl Canteen {
    pub fn menu(&self, date: NaiveDate) -> Option<&Menu> {
        self.days.get(&date)
    }
}

#[derive(Default, Deserialize)]
struct RawTicket {
    #[serde(rename = "vydaj_od", default, deserialize_with = "de::string")]
    available_from: String,
    #[serde(rename = "vydaj_do", default, deserialize_with = "de::string")]
    available_to: String,
    #[serde(rename = "prihlas_od", default, deserialize_with = "de::string")]
    order_from: String,
    #[serde(rename = "prihlas_do", default, deserialize_with = "de::string")]
    order_until: String,
    #[serde(rename = "zmen_do", default, deserialize_with = "de::string")]
    change_until: String,
    #[serde(default, deserialize_with = "de::list")]
    rows: Vec<RawRow>,
    #[serde(rename = "evidencia", default)]
    record: RawRecord,
}

#[derive(Default, Deserialize)]
struct RawRow {
    #[serde(rename = "nazov", default, deserialize_with = "de::string")]
    name: String,
    #[serde(rename = "alergenyStr", default, deserialize_with = "de::string")]
    allergens: String,
    #[serde(
        rename = "alergenyIDS",
        alias = "alegenyIDS",
        default,
        deserialize_with = "de::flag_set"
    )]
    allergen_ids: Vec<String>,
    #[serde(rename = "hmotnostiStr", default, deserialize_with = "de::string")]
    weight: String,
}

#[derive(Default, Deserialize)]
struct RawRecord {
    #[serde(rename = "stav", default, deserialize_with = "de::string")]
    state: String,
}

/// Clock time on `date` (`11:30`), or a full `YYYY-MM-DD HH:MM[:SS]` stamp.
fn parse_moment(date: NaiveDate, text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveTime::parse_from_str(text, "%H:%M")
                .ok()
                .map(|t| date.and_time(t))
        })
}

fn build_menu(date: NaiveDate, ticket: RawTicket) -> Menu {
    let orderable_until = parse_moment(date, &ticket.order_until);
    Menu {
        date,
        available_from: parse_moment(date, &ticket.available_from),
        available_to: parse_moment(date, &ticket.available_to),
        orderable_from: parse_moment(date, &ticket.order_from),
        orderable_until,
        cancelable_until: parse_moment(date, &ticket.change_until).or(orderable_until),
        ordered: ticket.record.state == ORDERED_STATE,
        meals: ticket
            .rows
            .into_iter()
            .filter(|row| !row.name.trim().is_empty())
            .map(|row| Meal {
                name: row.name,
                allergens: row.allergens,
                allergen_ids: row.allergen_ids,
                weight: row.weight,
            })
            .collect(),
    }
}

/// Parse the `edupageData` object into menus and boarder info.
pub fn parse_canteen(json: &str) -> Result<Canteen, PortalError> {
    let root: Map<String, Value> = serde_json::from_str(json)
        .map_err(|e| PortalError::decode_with("edupageData is not an object", e))?;

    let listing = root
        .values()
        .find_map(|school| school.get("novyListok"))
        .and_then(Value::as_object)
        .ok_or_else(|| PortalError::decode("edupageData carries no menu listing"))?;

    let info = match listing.get("addInfo") {
        Some(raw) => CanteenInfo::deserialize(raw).unwrap_or_else(|err| {
            warn!(error = %err, "unreadable canteen account info");
            CanteenInfo::default()
        }),
        None => CanteenInfo::default(),
    };

    let mut days = BTreeMap::new();
    for (key, day) in listing {
        let Ok(date) = NaiveDate::parse_from_str(key, DATE_FORMAT) else {
            continue;
        };
        let Some(raw) = day.get(LUNCH_TICKET) else {
            continue;
        };
        match RawTicket::deserialize(raw) {
            Ok(ticket) => {
                days.insert(date, build_menu(date, ticket));
            }
            Err(err) => warn!(date = %key, error = %err, "skipping malformed lunch ticket"),
        }
    }

    Ok(Canteen { info, days })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> String {
        json!({
            "myschool": {
                "novyListok": {
                    "addInfo": {"stravnikid": 1234, "meno": "Jana"},
                    "2024-05-06": {"2": {
                        "vydaj_od": "11:30", "vydaj_do": "14:00",
                        "prihlas_od": "2024-04-22 00:00",
                        "prihlas_do": "2024-05-03 14:00",
                        "zmen_do": "2024-05-06 08:00",
                        "rows": [
                            {"nazov": "Soup", "alergenyStr": "1, 9", "alergenyIDS": {"1": true, "9": true, "7": false}, "hmotnostiStr": "0,25 l"},
                            {"nazov": "", "alergenyStr": ""}
                        ],
                        "evidencia": {"stav": "A"}
                    }},
                    "2024-05-07": {"2": {"vydaj_od": "11:30", "rows": [], "evidencia": {"stav": "X"}}},
                    "2024-05-08": {"1": {"rows": []}}
                }
            }
        })
        .to_string()
    }

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn returns_populated_menus_and_info() {
        let canteen = parse_canteen(&sample()).unwrap();
        assert_eq!(canteen.info.boarder_id, "1234");
        assert_eq!(canteen.info.extra.get("meno"), Some(&json!("Jana")));
        assert_eq!(canteen.days.len(), 2);

        let monday = canteen
            .menu(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap())
            .expect("monday menu");
        assert!(monday.ordered);
        assert_eq!(monday.meals.len(), 1);
        assert_eq!(monday.meals[0].name, "Soup");
        assert_eq!(monday.meals[0].allergen_ids, ["1", "9"]);
        assert_eq!(monday.available_from, Some(at("2024-05-06", "11:30")));
        assert!(monday.can_order(at("2024-05-03", "13:59")));
        assert!(monday.can_order(at("2024-04-22", "00:00")));
        assert!(!monday.can_order(at("2024-05-03", "14:01")));
        assert!(monday.can_cancel(at("2024-05-06", "07:00")));
        assert!(monday.is_available(at("2024-05-06", "12:00")));
        assert!(!monday.is_available(at("2024-05-06", "15:00")));

        let tuesday = &canteen.days[&NaiveDate::from_ymd_opt(2024, 5, 7).unwrap()];
        assert!(!tuesday.ordered);
        assert_eq!(tuesday.orderable_from, None);
        assert_eq!(tuesday.orderable_until, None);
    }

    #[test]
    fn ordering_is_refused_before_the_window_opens() {
        let canteen = parse_canteen(&sample()).unwrap();
        let monday = canteen
            .menu(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap())
            .expect("monday menu");
        assert_eq!(monday.orderable_from, Some(at("2024-04-22", "00:00")));
        assert!(!monday.can_order(at("2024-04-21", "23:59")));
        assert!(monday.can_order(at("2024-04-29", "09:00")));
        assert!(!monday.can_order(at("2024-05-04", "09:00")));
    }

    #[test]
    fn misspelled_allergen_key_is_accepted() {
        let data = json!({"s": {"novyListok": {
            "2024-05-06": {"2": {"rows": [{"nazov": "Stew", "alegenyIDS": {"3": true}}]}}
        }}})
        .to_string();
        let canteen = parse_canteen(&data).unwrap();
        let menu = canteen.menu(NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()).unwrap();
        assert_eq!(menu.meals[0].allergen_ids, ["3"]);
        assert!(menu.meals[0].allergens.is_empty());
    }

    #[test]
    fn missing_listing_is_a_decode_error() {
        let err = parse_canteen(r#"{"myschool":{}}"#).expect_err("no novyListok");
        assert_eq!(err.kind(), "decode");
        assert!(parse_canteen("[]").is_err());
    }

    #[test]
    #[tracing_test::traced_test]
    fn malformed_ticket_is_skipped_with_a_warning() {
        let data = json!({"s": {"novyListok": {
            "2024-05-06": {"2": "closed"},
            "2024-05-07": {"2": {"rows": [{"nazov": "Stew"}]}}
        }}})
        .to_string();
        let canteen = parse_canteen(&data).unwrap();
        assert_eq!(canteen.days.len(), 1);
        assert!(canteen.info.boarder_id.is_empty());
        assert!(logs_contain("skipping malformed lunch ticket"));
    }
}
