//! Half-open time windows derived from an explicit reference instant.
//!
//! Every time-scoped aggregate in this crate is computed against a window
//! produced here, from a reference instant the caller passes in. Nothing in
//! this module reads the system clock.

use time::{Date, Duration, Month, OffsetDateTime, Time, UtcOffset};

/// A half-open interval of time: `start` is included, `end` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// The first instant inside the window.
    pub start: OffsetDateTime,
    /// The first instant after the window.
    pub end: OffsetDateTime,
}

impl TimeWindow {
    /// Whether `instant` falls inside this window.
    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// The calendar month containing `reference`: from midnight on the first of
/// the month to midnight on the first of the following month.
///
/// Midnight is taken in the UTC offset carried by `reference`, so a caller
/// that resolves a local timezone first gets local month boundaries. Handles
/// year rollover (a December reference ends in January of the next year).
pub fn current_month_window(reference: OffsetDateTime) -> TimeWindow {
    let (next_year, next_month) = next_month(reference.year(), reference.month());

    TimeWindow {
        start: month_start(reference.year(), reference.month(), reference.offset()),
        end: month_start(next_year, next_month, reference.offset()),
    }
}

/// The calendar month immediately preceding [current_month_window].
pub fn prior_month_window(reference: OffsetDateTime) -> TimeWindow {
    let (prev_year, prev_month) = previous_month(reference.year(), reference.month());

    TimeWindow {
        start: month_start(prev_year, prev_month, reference.offset()),
        end: month_start(reference.year(), reference.month(), reference.offset()),
    }
}

/// The last `days` days up to (but excluding) `reference`.
pub fn rolling_window(reference: OffsetDateTime, days: i64) -> TimeWindow {
    TimeWindow {
        start: reference - Duration::days(days),
        end: reference,
    }
}

/// The `days`-day window immediately before [rolling_window], so that the
/// two windows tile the last `2 * days` days without overlap.
pub fn previous_rolling_window(reference: OffsetDateTime, days: i64) -> TimeWindow {
    TimeWindow {
        start: reference - Duration::days(2 * days),
        end: reference - Duration::days(days),
    }
}

/// The canonical "YYYY-MM" grouping key for the month containing `date`.
///
/// Zero-padded so that lexicographic order is chronological order.
pub fn month_key(date: Date) -> String {
    format!("{:04}-{:02}", date.year(), u8::from(date.month()))
}

/// A short human-readable month label, e.g. "Aug '24".
pub fn month_label(date: Date) -> String {
    format!("{} '{:02}", month_abbrev(date.month()), date.year() % 100)
}

pub(crate) fn month_start(year: i32, month: Month, offset: UtcOffset) -> OffsetDateTime {
    let date = Date::from_calendar_date(year, month, 1).expect("invalid month start date");

    OffsetDateTime::new_in_offset(date, Time::MIDNIGHT, offset)
}

pub(crate) fn next_month(year: i32, month: Month) -> (i32, Month) {
    match month {
        Month::December => (year + 1, Month::January),
        month => (year, month.next()),
    }
}

fn previous_month(year: i32, month: Month) -> (i32, Month) {
    match month {
        Month::January => (year - 1, Month::December),
        month => (year, month.previous()),
    }
}

pub(crate) fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

pub(crate) fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

pub(crate) fn month_abbrev(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime, offset};

    use super::{
        current_month_window, is_leap_year, last_day_of_month, month_key, month_label,
        previous_rolling_window, prior_month_window, rolling_window,
    };

    #[test]
    fn current_month_window_handles_year_rollover() {
        let window = current_month_window(datetime!(2024-12-15 10:00 UTC));

        assert_eq!(window.start, datetime!(2024-12-01 00:00 UTC));
        assert_eq!(window.end, datetime!(2025-01-01 00:00 UTC));
    }

    #[test]
    fn prior_month_window_precedes_current_month() {
        let window = prior_month_window(datetime!(2024-12-15 10:00 UTC));

        assert_eq!(window.start, datetime!(2024-11-01 00:00 UTC));
        assert_eq!(window.end, datetime!(2024-12-01 00:00 UTC));
    }

    #[test]
    fn prior_month_window_handles_january() {
        let window = prior_month_window(datetime!(2025-01-10 08:00 UTC));

        assert_eq!(window.start, datetime!(2024-12-01 00:00 UTC));
        assert_eq!(window.end, datetime!(2025-01-01 00:00 UTC));
    }

    #[test]
    fn month_window_is_half_open() {
        let window = current_month_window(datetime!(2024-02-29 23:59 UTC));

        assert!(window.contains(datetime!(2024-02-01 00:00 UTC)));
        assert!(window.contains(datetime!(2024-02-29 23:59:59 UTC)));
        assert!(!window.contains(datetime!(2024-03-01 00:00 UTC)));
    }

    #[test]
    fn month_window_uses_reference_offset() {
        let window = current_month_window(datetime!(2024-06-15 09:00 +12:00));

        assert_eq!(window.start, datetime!(2024-06-01 00:00 +12:00));
        assert_eq!(window.end, datetime!(2024-07-01 00:00 +12:00));
    }

    #[test]
    fn rolling_windows_tile_without_overlap() {
        let reference = datetime!(2024-08-20 12:00 UTC);

        let current = rolling_window(reference, 7);
        let previous = previous_rolling_window(reference, 7);

        assert_eq!(current.start, datetime!(2024-08-13 12:00 UTC));
        assert_eq!(current.end, reference);
        assert_eq!(previous.start, datetime!(2024-08-06 12:00 UTC));
        assert_eq!(previous.end, current.start);
        assert!(!previous.contains(current.start));
    }

    #[test]
    fn month_key_is_zero_padded_and_sorts_chronologically() {
        let september = month_key(date!(2024 - 09 - 30));
        let october = month_key(date!(2024 - 10 - 01));
        let next_january = month_key(date!(2025 - 01 - 15));

        assert_eq!(september, "2024-09");
        assert!(september < october);
        assert!(october < next_january);
    }

    #[test]
    fn month_label_abbreviates_month_and_year() {
        assert_eq!(month_label(date!(2024 - 08 - 15)), "Aug '24");
        assert_eq!(month_label(date!(2005 - 01 - 01)), "Jan '05");
    }

    #[test]
    fn last_day_of_month_handles_leap_years() {
        assert_eq!(last_day_of_month(2024, time::Month::February), 29);
        assert_eq!(last_day_of_month(2023, time::Month::February), 28);
        assert_eq!(last_day_of_month(1900, time::Month::February), 28);
        assert_eq!(last_day_of_month(2000, time::Month::February), 29);
        assert_eq!(last_day_of_month(2024, time::Month::April), 30);
        assert_eq!(last_day_of_month(2024, time::Month::December), 31);
    }

    #[test]
    fn leap_year_follows_gregorian_rules() {
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(2023));
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(2000));
    }

    // Keeps the reference offset on rolling boundaries as well.
    #[test]
    fn rolling_window_keeps_offset() {
        let window = rolling_window(datetime!(2024-08-20 12:00 +05:30), 7);

        assert_eq!(window.start, datetime!(2024-08-13 12:00 +05:30));
        assert_eq!(window.start.offset(), offset!(+05:30));
    }
}
