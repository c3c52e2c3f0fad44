// SPDX-FileCopyrightText: 2026 Edubridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Date windows behind the `get_recent_*` operations, computed from "today".

use chrono::{Datelike, Days, NaiveDate, Weekday};
use edubridge_core::HalfYear;

const TIMELINE_LOOKBACK_DAYS: u64 = 30;
const TIMETABLE_LOOKBACK_DAYS: u64 = 1;
const TIMETABLE_LOOKAHEAD_DAYS: u64 = 7;

/// The last 30 days, ending today.
pub fn timeline_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Days::new(TIMELINE_LOOKBACK_DAYS), today)
}

/// Yesterday through a week from today.
pub fn timetable_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (
        today - Days::new(TIMETABLE_LOOKBACK_DAYS),
        today + Days::new(TIMETABLE_LOOKAHEAD_DAYS),
    )
}

/// School year and half-year that contain `today`.
///
/// A school year starts in September and is named after its first calendar
/// year. January still counts as the first half.
pub fn results_period(today: NaiveDate) -> (String, HalfYear) {
    let month = today.month();
    let year = if month >= 9 { today.year() } else { today.year() - 1 };
    let half = match month {
        2..=8 => HalfYear::P2,
        _ => HalfYear::P1,
    };
    (year.to_string(), half)
}

/// The day whose menu is relevant: weekends roll forward to Monday.
pub fn canteen_day(today: NaiveDate) -> NaiveDate {
    match today.weekday() {
        Weekday::Sat => today + Days::new(2),
        Weekday::Sun => today + Days::new(1),
        _ => today,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn timeline_looks_back_thirty_days() {
        assert_eq!(
            timeline_window(date(2024, 3, 15)),
            (date(2024, 2, 14), date(2024, 3, 15))
        );
    }

    #[test]
    fn timetable_spans_yesterday_to_next_week() {
        assert_eq!(
            timetable_window(date(2024, 12, 30)),
            (date(2024, 12, 29), date(2025, 1, 6))
        );
    }

    #[test]
    fn results_period_follows_school_year() {
        assert_eq!(results_period(date(2024, 1, 20)), ("2023".into(), HalfYear::P1));
        assert_eq!(results_period(date(2024, 2, 1)), ("2023".into(), HalfYear::P2));
        assert_eq!(results_period(date(2024, 8, 31)), ("2023".into(), HalfYear::P2));
        assert_eq!(results_period(date(2024, 9, 1)), ("2024".into(), HalfYear::P1));
        assert_eq!(results_period(date(2024, 12, 24)), ("2024".into(), HalfYear::P1));
    }

    #[test]
    fn weekend_canteen_rolls_to_monday() {
        // 2024-05-04 is a Saturday.
        assert_eq!(canteen_day(date(2024, 5, 4)), date(2024, 5, 6));
        assert_eq!(canteen_day(date(2024, 5, 5)), date(2024, 5, 6));
        assert_eq!(canteen_day(date(2024, 5, 7)), date(2024, 5, 7));
    }
}
