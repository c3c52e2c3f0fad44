// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON payloads shaped like real portal responses.

use chrono::{DateTime, Utc};
use edubridge_core::StoredUser;
use secrecy::SecretString;
use serde_json::{Value, json};

/// A `.userhome(...)` bootstrap object with a small reference table.
pub fn user_bootstrap(user_id: &str, student_id: &str) -> Value {
    json!({
        "userrow": {
            "UserID": user_id,
            "StudentID": student_id,
            "p_meno": "Jana",
            "p_priezvisko": "Novakova",
            "p_mail": "jana@example.org",
            "TriedaID": "7"
        },
        "items": [timeline_item("900", "sprava", "Welcome back")],
        "dbi": {
            "teachers": {
                "-12": {"id": "-12", "firstname": "Peter", "lastname": "Kral", "short": "KR"}
            },
            "classes": {"7": {"id": "7", "name": "III.A", "short": "3A"}},
            "subjects": {
                "9": {"id": "9", "name": "Mathematics", "short": "MAT"},
                "10": {"id": "10", "name": "Physics", "short": "FYZ"}
            },
            "classrooms": {"4": {"id": "4", "name": "Lab 1", "short": "L1"}},
            "periods": [
                {"id": "0", "starttime": "07:10", "endtime": "07:55", "name": "0"},
                {"id": "1", "starttime": "08:00", "endtime": "08:45", "name": "1"}
            ],
            "isstudentadult": false
        },
        "eventtypes": [],
        "usergroups": ["Student"],
        "dp": {},
        "meninyDnes": "Jana",
        "meninyZajtra": "Peter"
    })
}

/// One timeline record. `typ` is `sprava` for messages.
pub fn timeline_item(id: &str, typ: &str, text: &str) -> Value {
    json!({
        "timelineid": id,
        "typ": typ,
        "text": text,
        "cas_pridania": "2024-03-01 08:00:00",
        "cas_udalosti": "2024-03-01 08:00:00",
        "vlastnik_meno": "Peter Kral",
        "user": "Ucitel12",
        "data": json!({"messageContent": text}).to_string()
    })
}

/// A homework notice pointing at `superid`.
pub fn homework_item(id: &str, superid: &str) -> Value {
    json!({
        "timelineid": id,
        "typ": "homework",
        "text": "Exercise 4",
        "cas_pridania": "2024-03-02 10:00:00",
        "data": {"superid": superid, "etestCards": 1}
    })
}

pub fn homework(id: &str, superid: &str, test_id: &str) -> Value {
    json!({
        "hwkid": id,
        "e_superid": superid,
        "testid": test_id,
        "name": "Exercise 4",
        "predmetid": "9",
        "etestCards": 1
    })
}

/// A decoded timeline response.
pub fn timeline_body(items: Vec<Value>, homeworks: Vec<Value>) -> Value {
    json!({"timelineItems": items, "homeworks": homeworks})
}

/// A decoded results response with one grade, one event, and one note.
pub fn results_body() -> Value {
    json!({
        "status": "ok",
        "data": {
            "vsetkyZnamky": [
                {"znamkaid": "g1", "udalostid": "e1", "data": "1", "predmetid": "9"}
            ],
            "vsetkyUdalosti": {
                "edupage": {"e1": {"udalostID": "e1", "p_meno": "Quiz", "predmetid": "9"}}
            },
            "vsetkyVcelicky": [{"VcelickaID": "n1", "p_text": "Active in class"}]
        }
    })
}

/// A timetable response with two lessons on `date`.
pub fn timetable_body(date: &str) -> Value {
    json!({"r": {"ttitems": [
        {"type": "lesson", "date": date, "uniperiod": "1", "starttime": "08:00", "endtime": "08:45",
         "subjectid": "9", "teacherids": ["-12"], "classroomids": ["4"]},
        {"type": "lesson", "date": date, "uniperiod": "2", "starttime": "08:55", "endtime": "09:40",
         "subjectid": "10", "teacherids": ["-12"], "classroomids": ["4"]}
    ]}})
}

/// An `edupageData` object with one lunch on `date` orderable until `order_until`.
pub fn canteen_data(date: &str, order_until: &str, ordered: bool) -> Value {
    let mut listing = json!({
        "addInfo": {"stravnikid": "5501"}
    });
    listing[date] = json!({"2": {
        "vydaj_od": "11:30",
        "vydaj_do": "14:00",
        "prihlas_do": order_until,
        "zmen_do": order_until,
        "rows": [{"nazov": "Chicken soup", "alergenyStr": "1, 9", "hmotnostiStr": "0,33 l"}],
        "evidencia": {"stav": if ordered { "A" } else { "X" }}
    }});
    json!({"myschool": {"novyListok": listing}})
}

/// A stored account with a password.
pub fn stored_user(server: &str, username: &str, last_online: Option<DateTime<Utc>>) -> StoredUser {
    StoredUser {
        server: server.to_string(),
        username: username.to_string(),
        password: Some(SecretString::from("secret")),
        last_online,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canteen_fixture_places_ticket_under_date() {
        let data = canteen_data("2024-05-06", "2099-01-01 00:00", true);
        assert_eq!(
            data["myschool"]["novyListok"]["2024-05-06"]["2"]["evidencia"]["stav"],
            "A"
        );
    }

    #[test]
    fn stored_user_has_password() {
        let user = stored_user("myschool", "jana", None);
        assert!(user.password.is_some());
        assert_eq!(user.registry_key(), "myschooljana");
    }
}
