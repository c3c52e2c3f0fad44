// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lenient field decoders.
//!
//! The portal serializes from PHP: numbers arrive as strings and vice versa,
//! empty maps arrive as `[]`, and absent values as `null`. These helpers
//! coerce such shapes instead of failing the surrounding record.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

pub(crate) fn value_to_string(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        Value::Bool(b) => String::from(if b { "1" } else { "0" }),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// String, number, or bool as a string; `null` as empty.
pub(crate) fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(value_to_string(Value::deserialize(d)?))
}

/// Array of scalars as strings. A lone scalar becomes a one-element list.
pub(crate) fn strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items.into_iter().map(value_to_string).collect(),
        Value::Object(_) => Vec::new(),
        scalar => vec![value_to_string(scalar)],
    })
}

/// `true`, `1`, `"1"`, and `"true"` are true; everything else is false.
pub(crate) fn boolean<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(is_truthy(&Value::deserialize(d)?))
}

/// Integer from a number or numeric string; zero otherwise.
pub(crate) fn int<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        Value::Bool(b) => i64::from(b),
        _ => 0,
    })
}

/// Keys flagged true in a `{"1": true, "7": false}` set, numeric keys in
/// numeric order. A plain array lists the members directly.
pub(crate) fn flag_set<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    let mut members: Vec<String> = match Value::deserialize(d)? {
        Value::Object(obj) => obj
            .into_iter()
            .filter(|(_, flag)| is_truthy(flag))
            .map(|(key, _)| key)
            .collect(),
        Value::Array(items) => items.into_iter().map(value_to_string).collect(),
        _ => Vec::new(),
    };
    members.sort_by_key(|key| (key.parse::<u64>().unwrap_or(u64::MAX), key.clone()));
    Ok(members)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.as_str(), "1" | "true"),
        _ => false,
    }
}

/// Keyed table. Accepts an object, or an array keyed by index. Malformed
/// entries are dropped with a warning.
pub(crate) fn map<'de, D, T>(d: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let entries: Vec<(String, Value)> = match Value::deserialize(d)? {
        Value::Object(obj) => obj.into_iter().collect(),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    };

    Ok(entries
        .into_iter()
        .filter_map(|(key, value)| match T::deserialize(value) {
            Ok(parsed) => Some((key, parsed)),
            Err(err) => {
                warn!(key = %key, error = %err, "skipping malformed table entry");
                None
            }
        })
        .collect())
}

/// Record list. Malformed records are dropped with a warning.
pub(crate) fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(d)? {
        Value::Array(items) => items,
        Value::Object(obj) => obj.into_iter().map(|(_, v)| v).collect(),
        _ => Vec::new(),
    };

    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match T::deserialize(value) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!(index, error = %err, "skipping malformed record");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "string")]
        s: String,
        #[serde(default, deserialize_with = "strings")]
        v: Vec<String>,
        #[serde(default, deserialize_with = "boolean")]
        b: bool,
        #[serde(default, deserialize_with = "int")]
        i: i64,
        #[serde(default, deserialize_with = "map")]
        m: BTreeMap<String, i64>,
    }

    #[test]
    fn coerces_php_shapes() {
        let p: Fields =
            serde_json::from_str(r#"{"s":12,"v":["a",3],"b":"1","i":"42","m":[5,6]}"#).unwrap();
        assert_eq!(p.s, "12");
        assert_eq!(p.v, ["a", "3"]);
        assert!(p.b);
        assert_eq!(p.i, 42);
        assert_eq!(p.m.get("1"), Some(&6));
    }

    #[test]
    fn nulls_and_missing_fields_default() {
        let p: Fields = serde_json::from_str(r#"{"s":null,"v":null,"m":[]}"#).unwrap();
        assert_eq!(p.s, "");
        assert!(p.v.is_empty());
        assert!(!p.b);
        assert_eq!(p.i, 0);
        assert!(p.m.is_empty());
    }

    #[test]
    fn malformed_map_entries_are_dropped() {
        let p: Fields = serde_json::from_str(r#"{"m":{"a":1,"b":"x","c":3}}"#).unwrap();
        assert_eq!(p.m.len(), 2);
        assert!(!p.m.contains_key("b"));
    }

    #[derive(Debug, Deserialize)]
    struct Flags {
        #[serde(default, deserialize_with = "flag_set")]
        ids: Vec<String>,
    }

    #[test]
    fn flag_set_keeps_true_members_in_numeric_order() {
        let f: Flags =
            serde_json::from_str(r#"{"ids":{"10":true,"2":"1","3":false,"7":1}}"#).unwrap();
        assert_eq!(f.ids, ["2", "7", "10"]);

        let f: Flags = serde_json::from_str(r#"{"ids":[9,1]}"#).unwrap();
        assert_eq!(f.ids, ["1", "9"]);

        let f: Flags = serde_json::from_str(r#"{"ids":null}"#).unwrap();
        assert!(f.ids.is_empty());
    }
}
