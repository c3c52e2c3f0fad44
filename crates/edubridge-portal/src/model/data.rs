// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The free-form `data` payload carried by timeline items and homeworks.
//!
//! On the wire this field is an empty array, an object, a JSON string holding
//! an object, or a string holding such a string. It is decoded once, at parse
//! time, into [`ItemData`]. A payload that cannot be decoded never fails the
//! surrounding record.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// How many layers of string encoding are unwrapped before giving up.
const MAX_STRING_LAYERS: usize = 3;

/// Decoded `data` payload.
#[derive(Debug, Clone, Default)]
pub enum ItemData {
    /// `[]`, `null`, `{}`, or absent.
    #[default]
    Empty,
    /// A decoded key/value map.
    Object(Map<String, Value>),
    /// The payload could not be decoded. Behaves like an empty map.
    Error(String),
}

impl ItemData {
    /// Decode a raw `data` value.
    pub fn decode(raw: Value) -> Self {
        let mut current = raw;
        for _ in 0..=MAX_STRING_LAYERS {
            match current {
                Value::Null => return Self::Empty,
                Value::Array(items) if items.is_empty() => return Self::Empty,
                Value::Object(obj) if obj.is_empty() => return Self::Empty,
                Value::Object(obj) => return Self::Object(obj),
                Value::String(text) => match serde_json::from_str::<Value>(&text) {
                    Ok(inner) => current = inner,
                    Err(err) => return Self::Error(format!("string payload is not JSON: {err}")),
                },
                other => return Self::Error(format!("unexpected payload shape: {}", shape(&other))),
            }
        }
        Self::Error("payload is encoded too many times".to_string())
    }

    /// The decoded map, if any.
    pub fn object(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.object().and_then(|obj| obj.get(key))
    }

    pub fn is_empty(&self) -> bool {
        self.object().is_none_or(Map::is_empty)
    }

    pub fn len(&self) -> usize {
        self.object().map_or(0, Map::len)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Two payloads are equal when their decoded contents are equal; the reason
/// for a failed decode is not compared.
impl PartialEq for ItemData {
    fn eq(&self, other: &Self) -> bool {
        match (self.object(), other.object()) {
            (Some(a), Some(b)) => a == b,
            (a, b) => a.is_none_or(Map::is_empty) && b.is_none_or(Map::is_empty),
        }
    }
}

impl From<Map<String, Value>> for ItemData {
    fn from(obj: Map<String, Value>) -> Self {
        Self::decode(Value::Object(obj))
    }
}

impl<'de> Deserialize<'de> for ItemData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::decode(Value::deserialize(deserializer)?))
    }
}

impl Serialize for ItemData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Object(obj) => obj.serialize(serializer),
            Self::Empty | Self::Error(_) => Map::new().serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn decode_str(raw: &str) -> ItemData {
        serde_json::from_str(raw).expect("ItemData never fails on valid JSON")
    }

    #[test]
    fn empty_array_is_empty() {
        assert!(matches!(decode_str("[]"), ItemData::Empty));
    }

    #[test]
    fn object_is_decoded_directly() {
        let data = decode_str(r#"{"a":1}"#);
        assert_eq!(data.get("a"), Some(&json!(1)));
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn string_encoded_object_is_unwrapped() {
        let data = decode_str(r#""{\"a\":1}""#);
        assert_eq!(data.get("a"), Some(&json!(1)));
    }

    #[test]
    fn doubly_encoded_object_is_unwrapped() {
        let once = serde_json::to_string(&json!({"superid": "77"})).unwrap();
        let twice = serde_json::to_string(&once).unwrap();
        let thrice = serde_json::to_string(&twice).unwrap();
        let data = decode_str(&thrice);
        assert_eq!(data.get("superid"), Some(&json!("77")));
    }

    #[test]
    fn garbage_yields_empty_map_without_error() {
        for raw in [r#""{not json""#, "42", "[1,2]", "true"] {
            let data = decode_str(raw);
            assert!(data.is_error(), "{raw} should be an error variant");
            assert!(data.is_empty());
            assert_eq!(data, ItemData::Empty);
        }
    }

    #[test]
    fn serializes_as_plain_object() {
        let data = decode_str(r#""{\"k\":\"v\"}""#);
        assert_eq!(serde_json::to_string(&data).unwrap(), r#"{"k":"v"}"#);
        assert_eq!(serde_json::to_string(&ItemData::Empty).unwrap(), "{}");
        let back: ItemData = serde_json::from_str(&serde_json::to_string(&data).unwrap()).unwrap();
        assert_eq!(back, data);
    }
}
