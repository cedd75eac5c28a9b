//! Cell values: the unit stored in raw and canonical tables.

use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

// ─── FieldDate ───────────────────────────────────────────────────────────────

/// A normalized date field.
///
/// Unparseable or missing dates are `Unbounded` rather than absent, so that a
/// "deadline on or after X" filter keeps them. The literal sentinel date only
/// appears when the value is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldDate {
  Known(NaiveDate),
  /// Sorts after every `Known` date.
  Unbounded,
}

impl FieldDate {
  /// Rendering of [`FieldDate::Unbounded`].
  pub const SENTINEL: &'static str = "2100-12-31";

  /// The calendar date this field renders as.
  pub fn as_date(self) -> NaiveDate {
    match self {
      Self::Known(d) => d,
      Self::Unbounded => sentinel_date(),
    }
  }

  pub fn known(self) -> Option<NaiveDate> {
    match self {
      Self::Known(d) => Some(d),
      Self::Unbounded => None,
    }
  }

  pub fn is_unbounded(self) -> bool { matches!(self, Self::Unbounded) }
}

/// `2100-12-31` as a date.
pub fn sentinel_date() -> NaiveDate {
  NaiveDate::from_ymd_opt(2100, 12, 31).unwrap_or(NaiveDate::MAX)
}

impl fmt::Display for FieldDate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Known(d) => write!(f, "{}", d.format("%Y-%m-%d")),
      Self::Unbounded => f.write_str(Self::SENTINEL),
    }
  }
}

impl Serialize for FieldDate {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

// ─── CellValue ───────────────────────────────────────────────────────────────

/// A single table cell.
///
/// Currency columns may legitimately hold a mix of `Number` and `Text`:
/// amounts that cannot be converted keep their original wording.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum CellValue {
  #[default]
  Null,
  Text(String),
  Number(f64),
  Date(FieldDate),
}

impl CellValue {
  /// Build a cell from scraped text; blank and pandas-style missing markers
  /// become `Null`.
  pub fn from_raw(raw: &str) -> Self {
    let trimmed = raw.trim();
    if is_missing_marker(trimmed) {
      Self::Null
    } else {
      Self::Text(raw.to_string())
    }
  }

  pub fn text(s: impl Into<String>) -> Self { Self::Text(s.into()) }

  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }

  pub fn as_text(&self) -> Option<&str> {
    match self {
      Self::Text(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_number(&self) -> Option<f64> {
    match self {
      Self::Number(n) => Some(*n),
      _ => None,
    }
  }

  pub fn as_date(&self) -> Option<FieldDate> {
    match self {
      Self::Date(d) => Some(*d),
      _ => None,
    }
  }

  /// The string this cell renders as in a snapshot, or `None` for null.
  pub fn render(&self) -> Option<String> {
    match self {
      Self::Null => None,
      Self::Text(s) => Some(s.clone()),
      Self::Number(n) => Some(render_number(*n)),
      Self::Date(d) => Some(d.to_string()),
    }
  }
}

impl fmt::Display for CellValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.render().as_deref().unwrap_or(""))
  }
}

/// `true` for the strings a dataframe export uses to mean "no value".
pub fn is_missing_marker(s: &str) -> bool {
  matches!(s, "" | "nan" | "NaN" | "NaT" | "None" | "null")
}

/// Shortest round-trip form, keeping a trailing `.0` on integral values.
fn render_number(n: f64) -> String { format!("{n:?}") }
