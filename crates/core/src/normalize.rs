//! Tolerant parsing for ledger values.
//!
//! The ledger is merged from several import batches that never agreed on a
//! number or date format. Everything in here is total: a value that cannot be
//! understood degrades to zero (amounts) or `None` (dates) and the caller
//! decides what "missing" means for its comparison.

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d"];

/// Parses a locale-formatted revenue string.
///
/// Comma is the decimal separator, spaces (including NBSP and narrow NBSP)
/// are thousands separators. Anything unparseable, non-finite or negative
/// becomes `0.0`.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '\u{a0}' | '\u{202f}' | '\t'))
        .map(|ch| if ch == ',' { '.' } else { ch })
        .collect();

    if cleaned.is_empty() {
        return 0.0;
    }

    cleaned.parse::<f64>().map(sanitize_amount).unwrap_or(0.0)
}

/// Clamps an already-numeric amount to a finite, non-negative value.
pub fn sanitize_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Parses the irregular date strings found in the ledger.
///
/// Returns `None` for empty or unrecognized input. Offsets are converted to
/// UTC; naive values are taken as UTC already.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc).naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(parsed.and_time(NaiveTime::MIN));
        }
    }

    None
}

/// Whole days elapsed between `date` and `now`, floored.
///
/// Future dates yield a negative count; callers comparing against a
/// threshold treat those as "not quiet".
pub fn days_between(date: NaiveDateTime, now: NaiveDateTime) -> i64 {
    (now - date).num_seconds().div_euclid(86_400)
}

/// Calendar granularity used to split "previous" and "current" windows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodGranularity {
    #[default]
    Month,
    Quarter,
}

/// Interval of naive UTC timestamps starting at `start`.
///
/// `end` is excluded unless `end_inclusive` is set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub end_inclusive: bool,
}

impl Window {
    pub fn contains(&self, value: NaiveDateTime) -> bool {
        value >= self.start && (value < self.end || (self.end_inclusive && value == self.end))
    }
}

/// Returns `(previous, current)` calendar windows around `now`.
///
/// The current window runs from the start of `now`'s month or quarter up to
/// and including `now`; the previous window is the whole preceding period.
pub fn period_windows(now: NaiveDateTime, granularity: PeriodGranularity) -> (Window, Window) {
    let months = match granularity {
        PeriodGranularity::Month => 1,
        PeriodGranularity::Quarter => 3,
    };
    let current_start = period_start(now.date(), granularity).and_time(NaiveTime::MIN);
    let previous_start = current_start
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDateTime::MIN);
    (
        Window { start: previous_start, end: current_start, end_inclusive: false },
        Window { start: current_start, end: now, end_inclusive: true },
    )
}

/// Trailing window of `months` calendar months ending at `now` (inclusive).
pub fn trailing_window(now: NaiveDateTime, months: u32) -> Window {
    let start = now.checked_sub_months(Months::new(months)).unwrap_or(NaiveDateTime::MIN);
    Window { start, end: now, end_inclusive: true }
}

fn period_start(date: NaiveDate, granularity: PeriodGranularity) -> NaiveDate {
    let month = match granularity {
        PeriodGranularity::Month => date.month(),
        PeriodGranularity::Quarter => ((date.month() - 1) / 3) * 3 + 1,
    };
    NaiveDate::from_ymd_opt(date.year(), month, 1).unwrap_or(date)
}

/// `(year, month)` bucket key for monthly grouping.
pub fn month_key(value: NaiveDateTime) -> (i32, u32) {
    (value.year(), value.month())
}

/// Renders a month bucket as `YYYY-MM`.
pub fn month_label((year, month): (i32, u32)) -> String {
    format!("{year:04}-{month:02}")
}
