//! Week-key derivation. Goals are bucketed by the ISO Monday of their week,
//! encoded as a `YYYY-MM-DD` key that is always recomputed from an offset
//! relative to the current week, never stored on its own.

use chrono::{Datelike, Duration, Local, NaiveDate};

/// Monday of the week containing `today + offset weeks`.
pub fn week_monday(today: NaiveDate, offset: i64) -> NaiveDate {
    let shifted = today + Duration::weeks(offset);
    shifted - Duration::days(i64::from(shifted.weekday().num_days_from_monday()))
}

pub fn week_key_from(today: NaiveDate, offset: i64) -> String {
    week_monday(today, offset).format("%Y-%m-%d").to_string()
}

/// Week key for `offset` weeks away from the current week (0 = this week).
pub fn week_key(offset: i64) -> String {
    week_key_from(Local::now().date_naive(), offset)
}

/// Monday and Sunday of the week `offset` weeks away from `today`'s week.
pub fn week_range(today: NaiveDate, offset: i64) -> (NaiveDate, NaiveDate) {
    let monday = week_monday(today, offset);
    (monday, monday + Duration::days(6))
}

/// ISO-8601 week number: the week containing the year's first Thursday is
/// week 1.
pub fn iso_week_number(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

pub fn parse_week_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

/// Display form used in the export header, e.g. `1/6` for January 6th.
pub fn short_date(date: NaiveDate) -> String {
    format!("{}/{}", date.month(), date.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn iso_week_boundaries() {
        let new_year = date(2021, 1, 1);
        assert_eq!(iso_week_number(new_year), 53);
        assert_eq!(new_year.iso_week().year(), 2020);

        let monday = date(2023, 1, 2);
        assert_eq!(iso_week_number(monday), 1);
        assert_eq!(monday.iso_week().year(), 2023);
    }

    #[test]
    fn week_monday_is_constant_across_the_week() {
        let monday = date(2026, 8, 24);
        for day in 0..7 {
            let today = monday + Duration::days(day);
            assert_eq!(week_monday(today, 0), monday);
        }
        assert_eq!(monday.weekday(), Weekday::Mon);
    }

    #[test]
    fn previous_week_is_seven_days_earlier() {
        let today = date(2026, 8, 27);
        let this_week = week_monday(today, 0);
        let last_week = week_monday(today, -1);
        assert_eq!(this_week - last_week, Duration::days(7));
        assert_eq!(week_key_from(today, 0), "2026-08-24");
        assert_eq!(week_key_from(today, -1), "2026-08-17");
    }

    #[test]
    fn range_spans_monday_to_sunday() {
        let (start, end) = week_range(date(2025, 1, 8), 0);
        assert_eq!(start, date(2025, 1, 6));
        assert_eq!(end, date(2025, 1, 12));
        assert_eq!(start.weekday(), Weekday::Mon);
        assert_eq!(end.weekday(), Weekday::Sun);
    }

    #[test]
    fn week_key_round_trips_through_parse() {
        let key = week_key_from(date(2024, 12, 31), 0);
        assert_eq!(key, "2024-12-30");
        assert_eq!(parse_week_key(&key), Some(date(2024, 12, 30)));
        assert_eq!(parse_week_key("not-a-date"), None);
    }

    #[test]
    fn short_date_has_no_zero_padding() {
        assert_eq!(short_date(date(2025, 1, 6)), "1/6");
        assert_eq!(short_date(date(2025, 11, 30)), "11/30");
    }
}
