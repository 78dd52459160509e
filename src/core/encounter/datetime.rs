//! Date and time resolution
//!
//! Encounter dates arrive as `YYYY-MM-DD` strings with a separate, optional
//! time column in compact `HHMM` form (`100` is 01:00). This module turns the
//! pair into a single timestamp, or `None` when the value cannot be resolved.
//! `None` always means "no information" and never an error.
//!
//! Day offsets are whole days, floored, so a procedure 23 hours before its
//! reference is at offset -1 and one 23 hours after is at offset 0.

use super::view::ProcedureEntry;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashSet;

const SECONDS_PER_DAY: i64 = 86_400;

/// Parses a date, ignoring any time-of-day suffix
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed
        .split(|c: char| c == 'T' || c.is_whitespace())
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Parses a compact time of day
///
/// Accepts up to four digits with an optional colon. Shorter values are
/// zero-padded on the left, so `"100"` and `"1:00"` are both 01:00.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let digits: String = raw.trim().chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || digits.len() > 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let padded = format!("{digits:0>4}");
    let hour: u32 = padded[..2].parse().ok()?;
    let minute: u32 = padded[2..].parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Combines a date and an optional time into one timestamp
///
/// A missing time means midnight. An unparseable date, or a time that is
/// present but unparseable, resolves to `None`.
///
/// # Examples
///
/// ```
/// use psi_engine::core::encounter::datetime::resolve;
///
/// let ts = resolve(Some("2024-03-01"), Some("100")).unwrap();
/// assert_eq!(ts.to_string(), "2024-03-01 01:00:00");
///
/// assert!(resolve(Some("03/01/2024"), None).is_none());
/// assert!(resolve(Some("2024-03-01"), Some("2575")).is_none());
/// assert!(resolve(None, Some("0800")).is_none());
/// ```
pub fn resolve(date: Option<&str>, time: Option<&str>) -> Option<NaiveDateTime> {
    let date = parse_date(date?)?;
    let time = match time.map(str::trim).filter(|t| !t.is_empty()) {
        Some(raw) => parse_time(raw)?,
        None => NaiveTime::from_hms_opt(0, 0, 0)?,
    };
    Some(date.and_time(time))
}

/// Whole days from `from` to `to`, floored; `None` if either is unresolved
pub fn days_between(from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> Option<i64> {
    let (from, to) = (from?, to?);
    Some((to - from).num_seconds().div_euclid(SECONDS_PER_DAY))
}

/// Earliest resolved timestamp among procedures whose code is in `codes`
pub fn first_procedure_date(procedures: &[ProcedureEntry], codes: &HashSet<String>) -> Option<NaiveDateTime> {
    matching_timestamps(procedures, codes).min()
}

/// Latest resolved timestamp among procedures whose code is in `codes`
pub fn last_procedure_date(procedures: &[ProcedureEntry], codes: &HashSet<String>) -> Option<NaiveDateTime> {
    matching_timestamps(procedures, codes).max()
}

fn matching_timestamps<'a>(
    procedures: &'a [ProcedureEntry],
    codes: &'a HashSet<String>,
) -> impl Iterator<Item = NaiveDateTime> + 'a {
    procedures
        .iter()
        .filter(move |p| codes.contains(&p.code))
        .filter_map(|p| p.timestamp)
}

/// Day-offset bounds relative to a reference timestamp
///
/// Each bound is optional and may be open or closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub min_inclusive: bool,
    pub max_inclusive: bool,
}

impl DayWindow {
    /// Offset `>= days`
    pub const fn at_least(days: i64) -> Self {
        Self {
            min: Some(days),
            max: None,
            min_inclusive: true,
            max_inclusive: true,
        }
    }

    /// Offset `> days`
    pub const fn after(days: i64) -> Self {
        Self {
            min: Some(days),
            max: None,
            min_inclusive: false,
            max_inclusive: true,
        }
    }

    /// Offset `<= days`
    pub const fn at_most(days: i64) -> Self {
        Self {
            min: None,
            max: Some(days),
            min_inclusive: true,
            max_inclusive: true,
        }
    }

    /// `min <= offset <= max`
    pub const fn between(min: i64, max: i64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            min_inclusive: true,
            max_inclusive: true,
        }
    }

    /// Whether a day offset falls inside the window
    pub fn contains(&self, offset: i64) -> bool {
        let above_min = match self.min {
            Some(min) if self.min_inclusive => offset >= min,
            Some(min) => offset > min,
            None => true,
        };
        let below_max = match self.max {
            Some(max) if self.max_inclusive => offset <= max,
            Some(max) => offset < max,
            None => true,
        };
        above_min && below_max
    }
}

/// Whether any procedure in `codes` falls inside `window` relative to `reference`
///
/// A `None` reference, an empty code set or procedures without a resolved
/// timestamp never match.
pub fn has_procedure_in_window(
    procedures: &[ProcedureEntry],
    reference: Option<NaiveDateTime>,
    codes: &HashSet<String>,
    window: DayWindow,
) -> bool {
    let Some(reference) = reference else {
        return false;
    };
    matching_timestamps(procedures, codes)
        .filter_map(|ts| days_between(Some(reference), Some(ts)))
        .any(|offset| window.contains(offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn ts(date: &str, time: Option<&str>) -> Option<NaiveDateTime> {
        resolve(Some(date), time)
    }

    fn proc(code: &str, date: &str) -> ProcedureEntry {
        ProcedureEntry {
            code: code.to_string(),
            slot: 1,
            timestamp: ts(date, None),
        }
    }

    fn codes(list: &[&str]) -> HashSet<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    #[test_case("100", 1, 0 ; "three digits")]
    #[test_case("0930", 9, 30 ; "four digits")]
    #[test_case("7", 0, 7 ; "single digit")]
    #[test_case("13:45", 13, 45 ; "with colon")]
    fn test_parse_time(raw: &str, hour: u32, minute: u32) {
        assert_eq!(parse_time(raw), NaiveTime::from_hms_opt(hour, minute, 0));
    }

    #[test_case("2400" ; "hour out of range")]
    #[test_case("1260" ; "minute out of range")]
    #[test_case("12345" ; "too long")]
    #[test_case("noon" ; "not numeric")]
    fn test_parse_time_invalid(raw: &str) {
        assert!(parse_time(raw).is_none());
    }

    #[test]
    fn test_date_suffix_is_ignored() {
        assert_eq!(parse_date("2024-02-29T13:00:00"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_date("2024-02-29 00:00:00"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert!(parse_date("2023-02-29").is_none());
    }

    #[test]
    fn test_blank_time_means_midnight() {
        let a = ts("2024-01-01", Some("  ")).unwrap();
        assert_eq!(a.to_string(), "2024-01-01 00:00:00");
    }

    #[test]
    fn test_days_between_is_floored_and_signed() {
        let admit = ts("2024-01-10", Some("2300"));
        assert_eq!(days_between(admit, ts("2024-01-11", Some("0100"))), Some(0));
        assert_eq!(days_between(admit, ts("2024-01-13", Some("2300"))), Some(3));
        assert_eq!(days_between(admit, ts("2024-01-10", Some("2200"))), Some(-1));
        assert_eq!(days_between(admit, None), None);
    }

    #[test]
    fn test_first_and_last_procedure_dates() {
        let procedures = vec![
            proc("B", "2024-01-05"),
            proc("A", "2024-01-03"),
            proc("A", "2024-01-09"),
            ProcedureEntry {
                code: "A".to_string(),
                slot: 4,
                timestamp: None,
            },
        ];
        let set = codes(&["A"]);

        assert_eq!(first_procedure_date(&procedures, &set), ts("2024-01-03", None));
        assert_eq!(last_procedure_date(&procedures, &set), ts("2024-01-09", None));
        assert_eq!(first_procedure_date(&procedures, &HashSet::new()), None);
    }

    #[test]
    fn test_window_bounds() {
        let procedures = vec![proc("X", "2024-01-01"), proc("X", "2024-01-31")];
        let set = codes(&["X"]);
        let index = ts("2024-01-01", None);

        assert!(has_procedure_in_window(&procedures, index, &set, DayWindow::at_least(0)));
        assert!(has_procedure_in_window(&procedures, index, &set, DayWindow::between(1, 30)));
        assert!(!has_procedure_in_window(&procedures, index, &set, DayWindow::between(1, 29)));
        assert!(has_procedure_in_window(&procedures, index, &set, DayWindow::at_most(0)));
        assert!(!has_procedure_in_window(&procedures[..1], index, &set, DayWindow::after(0)));
        assert!(!has_procedure_in_window(&procedures, None, &set, DayWindow::at_least(0)));
    }

    #[test]
    fn test_open_window_edges() {
        let window = DayWindow {
            min: Some(1),
            max: Some(5),
            min_inclusive: false,
            max_inclusive: false,
        };
        assert!(!window.contains(1));
        assert!(window.contains(2));
        assert!(window.contains(4));
        assert!(!window.contains(5));
    }
}
