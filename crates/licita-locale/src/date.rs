//! Date normalization.
//!
//! Pipeline, first success wins:
//!   trimmed, lowercased, whitespace-collapsed input
//!     ├─ Spanish long form   "26 de junio del 2025 23:59"
//!     ├─ explicit numeric formats (`NUMERIC_DATES`, `NUMERIC_DATETIMES`)
//!     └─ permissive parse: ISO, compact, English month names, then
//!        numeric day-first
//!
//! Anything else is [`FieldDate::Unbounded`].

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use licita_core::cell::{CellValue, FieldDate, is_missing_marker};
use regex::Regex;

use crate::{
  error::{Error, Result},
  text::month_number,
};

static SPANISH_LONG: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(\d{1,2}) de (\w+) del (\d{4}) ?(\d{2}:\d{2})?")
    .expect("valid spanish date pattern")
});

static LOOSE_NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"^(\d{1,4})[/.\-](\d{1,2})[/.\-](\d{1,4})(?:[ t]\d{1,2}:\d{2}(?::\d{2})?.*)?$",
  )
  .expect("valid loose date pattern")
});

static COMPACT: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(\d{4})(\d{2})(\d{2})$").expect("valid compact date pattern")
});

const NUMERIC_DATES: &[&str] = &["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y"];
const NUMERIC_DATETIMES: &[&str] = &["%d/%m/%Y %H:%M", "%Y-%m-%d %H:%M:%S"];

// `%b` accepts both short and full month names, in any case.
const TEXTUAL_DATES: &[&str] = &["%d %b %Y", "%b %d, %Y", "%b %d %Y"];
const TEXTUAL_DATETIMES: &[&str] = &["%d %b %Y %H:%M", "%b %d, %Y %H:%M"];

// ─── Public API ──────────────────────────────────────────────────────────────

/// Normalize a cell into a date. Null cells and unparseable text are
/// [`FieldDate::Unbounded`]; existing dates pass through.
pub fn parse_date(cell: &CellValue) -> FieldDate {
  match cell {
    CellValue::Null => FieldDate::Unbounded,
    CellValue::Date(d) => *d,
    CellValue::Text(s) => parse_date_str(s),
    CellValue::Number(n) => parse_date_str(&n.to_string()),
  }
}

/// Normalize a string into a date, falling back to
/// [`FieldDate::Unbounded`].
pub fn parse_date_str(input: &str) -> FieldDate {
  match try_parse_date(input) {
    Ok(d) => FieldDate::Known(d),
    Err(e) => {
      tracing::debug!(error = %e, "date left unbounded");
      FieldDate::Unbounded
    }
  }
}

/// Parse a date, reporting why it could not be read.
pub fn try_parse_date(input: &str) -> Result<NaiveDate> {
  let unparseable = || Error::UnparseableDate(input.to_string());

  let trimmed = input.trim();
  if is_missing_marker(trimmed) {
    return Err(unparseable());
  }
  let value = trimmed
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase();

  // A Spanish long form is authoritative: if it matches but does not make a
  // valid date, no other format is tried.
  if let Some(caps) = SPANISH_LONG.captures(&value) {
    return spanish_long(&caps).ok_or_else(unparseable);
  }

  for fmt in NUMERIC_DATES {
    if let Ok(d) = NaiveDate::parse_from_str(&value, fmt) {
      return Ok(d);
    }
  }
  for fmt in NUMERIC_DATETIMES {
    if let Ok(dt) = NaiveDateTime::parse_from_str(&value, fmt) {
      return Ok(dt.date());
    }
  }

  loose(trimmed, &value).ok_or_else(unparseable)
}

// ─── Formats ─────────────────────────────────────────────────────────────────

fn spanish_long(caps: &regex::Captures<'_>) -> Option<NaiveDate> {
  let day: u32 = caps[1].parse().ok()?;
  // Unrecognised month names fall back to January.
  let month = month_number(&caps[2]).unwrap_or(1);
  let year: i32 = caps[3].parse().ok()?;
  if let Some(time) = caps.get(4) {
    NaiveTime::parse_from_str(time.as_str(), "%H:%M").ok()?;
  }
  NaiveDate::from_ymd_opt(year, month, day)
}

/// Mixed-format fallback: ISO 8601 timestamps, compact `YYYYMMDD`, English
/// month names, and three-part numeric dates read day-first unless the first
/// part is a year.
fn loose(original: &str, value: &str) -> Option<NaiveDate> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(original) {
    return Some(dt.date_naive());
  }
  for fmt in [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
  ] {
    if let Ok(dt) = NaiveDateTime::parse_from_str(original, fmt) {
      return Some(dt.date());
    }
  }

  if let Some(caps) = COMPACT.captures(value) {
    return NaiveDate::from_ymd_opt(
      caps[1].parse().ok()?,
      caps[2].parse().ok()?,
      caps[3].parse().ok()?,
    );
  }

  for fmt in TEXTUAL_DATES {
    if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
      return Some(d);
    }
  }
  for fmt in TEXTUAL_DATETIMES {
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
      return Some(dt.date());
    }
  }

  let caps = LOOSE_NUMERIC.captures(value)?;
  let (a, b, c) = (&caps[1], &caps[2], &caps[3]);
  if a.len() == 4 {
    return NaiveDate::from_ymd_opt(a.parse().ok()?, b.parse().ok()?, c.parse().ok()?);
  }

  let year = expand_year(c)?;
  let first: u32 = a.parse().ok()?;
  let second: u32 = b.parse().ok()?;
  // Day-first, then month-first when the day-first reading is impossible.
  NaiveDate::from_ymd_opt(year, second, first)
    .or_else(|| NaiveDate::from_ymd_opt(year, first, second))
}

/// Two-digit years land in 1970..=2069.
fn expand_year(s: &str) -> Option<i32> {
  let y: i32 = s.parse().ok()?;
  match s.len() {
    4 => Some(y),
    1 | 2 if y < 70 => Some(2000 + y),
    1 | 2 => Some(1900 + y),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use licita_core::cell::sentinel_date;
  use proptest::prelude::*;

  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  // ── Spanish long form ────────────────────────────────────────────────────

  #[test]
  fn spanish_long_form_with_time() {
    assert_eq!(try_parse_date("26 de junio del 2025 23:59"), Ok(ymd(2025, 6, 26)));
  }

  #[test]
  fn spanish_long_form_without_time() {
    assert_eq!(try_parse_date("3 de Marzo del 2024"), Ok(ymd(2024, 3, 3)));
  }

  #[test]
  fn spanish_long_form_collapses_whitespace() {
    assert_eq!(try_parse_date("  1  de   enero del 2026 "), Ok(ymd(2026, 1, 1)));
  }

  #[test]
  fn unknown_month_name_defaults_to_january() {
    assert_eq!(try_parse_date("15 de brumario del 2025"), Ok(ymd(2025, 1, 15)));
  }

  #[test]
  fn impossible_spanish_date_is_unbounded() {
    assert_eq!(parse_date_str("31 de febrero del 2025"), FieldDate::Unbounded);
    assert_eq!(parse_date_str("1 de enero del 2025 25:99"), FieldDate::Unbounded);
  }

  // ── Numeric formats ──────────────────────────────────────────────────────

  #[test]
  fn explicit_numeric_formats() {
    assert_eq!(try_parse_date("26/06/2025"), Ok(ymd(2025, 6, 26)));
    assert_eq!(try_parse_date("2025-06-26"), Ok(ymd(2025, 6, 26)));
    assert_eq!(try_parse_date("26-06-2025"), Ok(ymd(2025, 6, 26)));
    assert_eq!(try_parse_date("26/06/2025 14:30"), Ok(ymd(2025, 6, 26)));
    assert_eq!(try_parse_date("2025-06-26 14:30:00"), Ok(ymd(2025, 6, 26)));
  }

  #[test]
  fn loose_formats_are_day_first() {
    assert_eq!(try_parse_date("05.06.2025"), Ok(ymd(2025, 6, 5)));
    assert_eq!(try_parse_date("5-6-2025 08:00"), Ok(ymd(2025, 6, 5)));
    assert_eq!(try_parse_date("26/06/2025 14:30:15"), Ok(ymd(2025, 6, 26)));
  }

  #[test]
  fn loose_swaps_when_day_first_is_impossible() {
    assert_eq!(try_parse_date("06.26.2025"), Ok(ymd(2025, 6, 26)));
  }

  #[test]
  fn english_month_names() {
    assert_eq!(try_parse_date("June 26, 2025"), Ok(ymd(2025, 6, 26)));
    assert_eq!(try_parse_date("26 Jun 2025"), Ok(ymd(2025, 6, 26)));
    assert_eq!(try_parse_date("26 june 2025 14:30"), Ok(ymd(2025, 6, 26)));
    assert_eq!(parse_date_str("Jun 31, 2025"), FieldDate::Unbounded);
  }

  #[test]
  fn iso_timestamps() {
    assert_eq!(try_parse_date("2025-06-26T10:15:00Z"), Ok(ymd(2025, 6, 26)));
    assert_eq!(try_parse_date("2025-06-26T10:15:00"), Ok(ymd(2025, 6, 26)));
    assert_eq!(try_parse_date("20250626"), Ok(ymd(2025, 6, 26)));
  }

  // ── Fallback ─────────────────────────────────────────────────────────────

  #[test]
  fn missing_values_are_unbounded() {
    assert_eq!(parse_date(&CellValue::Null), FieldDate::Unbounded);
    assert_eq!(parse_date(&CellValue::text("NaN")), FieldDate::Unbounded);
    assert_eq!(parse_date_str(""), FieldDate::Unbounded);
    assert_eq!(parse_date(&CellValue::text("NaN")).as_date(), ymd(2100, 12, 31));
  }

  #[test]
  fn free_text_is_unbounded() {
    assert_eq!(parse_date_str("a determinar"), FieldDate::Unbounded);
    assert_eq!(parse_date_str("Fecha: pendiente"), FieldDate::Unbounded);
    assert_eq!(parse_date_str("99/99/9999"), FieldDate::Unbounded);
  }

  #[test]
  fn existing_dates_pass_through() {
    let d = FieldDate::Known(ymd(2025, 1, 1));
    assert_eq!(parse_date(&CellValue::Date(d)), d);
  }

  proptest! {
    #[test]
    fn garbage_is_always_the_sentinel(s in "[a-zA-Z ]{0,24}") {
      prop_assert_eq!(parse_date_str(&s), FieldDate::Unbounded);
      prop_assert_eq!(parse_date_str(&s).as_date(), sentinel_date());
    }

    #[test]
    fn real_dates_sort_before_sentinel(
      y in 1900i32..2100,
      m in 1u32..=12,
      d in 1u32..=28,
    ) {
      let text = format!("{d:02}/{m:02}/{y}");
      let parsed = parse_date_str(&text);
      prop_assert_eq!(parsed, FieldDate::Known(ymd(y, m, d)));
      prop_assert!(parsed.as_date() < sentinel_date());
      prop_assert!(parsed < FieldDate::Unbounded);
    }
  }
}
