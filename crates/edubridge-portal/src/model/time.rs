// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamps in the portal's `YYYY-MM-DD HH:MM:SS` text format.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Text format used for every portal timestamp.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Text format used for calendar dates in requests and keys.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A portal timestamp.
///
/// Unparsable input (including `null` and empty strings) decodes to the
/// zero time, `0001-01-01 00:00:00`, rather than an error. Use
/// [`PortalTime::is_zero`] to detect it, or [`PortalTime::try_parse`] for a
/// strict parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortalTime(NaiveDateTime);

impl PortalTime {
    /// The zero time.
    pub fn zero() -> Self {
        let zero = NaiveDate::from_ymd_opt(1, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or(NaiveDateTime::MIN);
        Self(zero)
    }

    pub fn new(at: NaiveDateTime) -> Self {
        Self(at)
    }

    /// Forgiving parse: unparsable input becomes [`PortalTime::zero`].
    pub fn parse(text: &str) -> Self {
        Self::try_parse(text).unwrap_or_else(|_| Self::zero())
    }

    /// Strict parse.
    pub fn try_parse(text: &str) -> Result<Self, chrono::ParseError> {
        NaiveDateTime::parse_from_str(text.trim(), TIME_FORMAT).map(Self)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    pub fn naive(&self) -> NaiveDateTime {
        self.0
    }
}

impl Default for PortalTime {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for PortalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIME_FORMAT))
    }
}

impl From<NaiveDateTime> for PortalTime {
    fn from(at: NaiveDateTime) -> Self {
        Self(at)
    }
}

impl Serialize for PortalTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PortalTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Self::parse(&s),
            _ => Self::zero(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_portal_format() {
        let t = PortalTime::parse("2024-03-05 07:45:10");
        assert!(!t.is_zero());
        assert_eq!(t.to_string(), "2024-03-05 07:45:10");
    }

    #[test]
    fn unparsable_input_is_zero_time() {
        for raw in [r#""""#, r#""2024-03-05T07:45:10Z""#, "null", "17", r#""0000-00-00 00:00:00""#] {
            let t: PortalTime = serde_json::from_str(raw).unwrap();
            assert!(t.is_zero(), "{raw} should decode to zero time");
        }
        assert!(PortalTime::try_parse("garbage").is_err());
    }

    #[test]
    fn serializes_in_portal_format() {
        let t = PortalTime::parse("2023-12-31 23:59:59");
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#""2023-12-31 23:59:59""#);
        let back: PortalTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);

        let zero = serde_json::to_string(&PortalTime::zero()).unwrap();
        assert_eq!(zero, r#""0001-01-01 00:00:00""#);
        assert!(serde_json::from_str::<PortalTime>(&zero).unwrap().is_zero());
    }
}
