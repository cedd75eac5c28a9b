//! Currency normalization.
//!
//! Strips currency symbols and words, then decides between European
//! (`1.234,56`) and plain (`1,234.56` / `1234.56`) notation. The heuristic
//! is kept deliberately simple; a lone `1.234` is read as one point two.

use std::sync::LazyLock;

use licita_core::cell::CellValue;
use regex::Regex;

use crate::error::{Error, Result};

static CURRENCY_WORDS: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)(euros|€)").expect("valid currency pattern"));

/// Dot-grouped thousands followed by a comma decimal, e.g. `1.234,56`.
static EURO_GROUPED: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\d+\.\d+,\d+").expect("valid grouped pattern"));

/// A trailing two-digit comma decimal, e.g. `99,50`.
static EURO_DECIMAL: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\d+,\d{2}$").expect("valid decimal pattern"));

/// Normalize a currency cell.
///
/// Text that converts becomes a `Number`; text that does not is returned
/// unchanged. Nulls, numbers and dates pass through.
pub fn parse_amount(cell: &CellValue) -> CellValue {
  match cell {
    CellValue::Text(s) => match try_parse_amount(s) {
      Ok(n) => CellValue::Number(n),
      Err(e) => {
        tracing::debug!(error = %e, "amount kept as text");
        cell.clone()
      }
    },
    other => other.clone(),
  }
}

/// Convert a currency string to a number.
pub fn try_parse_amount(input: &str) -> Result<f64> {
  let stripped = CURRENCY_WORDS.replace_all(input, "");
  let stripped = stripped.trim();

  let digits = if EURO_GROUPED.is_match(stripped) || EURO_DECIMAL.is_match(stripped)
  {
    stripped.replace('.', "").replace(',', ".")
  } else {
    stripped.replace(',', "")
  };

  digits
    .trim()
    .parse::<f64>()
    .map_err(|_| Error::UnparseableAmount(input.to_string()))
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;

  fn amount(s: &str) -> CellValue { parse_amount(&CellValue::text(s)) }

  #[test]
  fn european_grouping_with_symbol() {
    assert_eq!(amount("1.234,56 €"), CellValue::Number(1234.56));
    assert_eq!(amount("12.345.678,90 euros"), CellValue::Number(12_345_678.90));
  }

  #[test]
  fn two_digit_comma_decimal() {
    assert_eq!(amount("99,50"), CellValue::Number(99.5));
    assert_eq!(amount("€ 1500,00"), CellValue::Number(1500.0));
  }

  #[test]
  fn plain_and_comma_grouped() {
    assert_eq!(amount("1234"), CellValue::Number(1234.0));
    assert_eq!(amount("1,234,567.89"), CellValue::Number(1_234_567.89));
    assert_eq!(amount("1234.5 EUROS"), CellValue::Number(1234.5));
  }

  #[test]
  fn ambiguous_dot_is_a_decimal_point() {
    assert_eq!(amount("1.234"), CellValue::Number(1.234));
  }

  #[test]
  fn unconvertible_text_is_returned_unchanged() {
    assert_eq!(amount("a determinar"), CellValue::text("a determinar"));
    assert_eq!(amount("1.000 € aprox."), CellValue::text("1.000 € aprox."));
    assert_eq!(
      try_parse_amount("a determinar"),
      Err(Error::UnparseableAmount("a determinar".into()))
    );
  }

  #[test]
  fn non_text_cells_pass_through() {
    assert_eq!(parse_amount(&CellValue::Null), CellValue::Null);
    assert_eq!(parse_amount(&CellValue::Number(7.5)), CellValue::Number(7.5));
  }

  proptest! {
    #[test]
    fn reparsing_output_is_idempotent(n in -1.0e12f64..1.0e12) {
      let first = parse_amount(&CellValue::text(format!("{n}")));
      let rendered = first.to_string();
      let second = parse_amount(&CellValue::text(rendered));
      prop_assert_eq!(first.clone(), second);
      prop_assert_eq!(parse_amount(&first), first);
    }

    #[test]
    fn european_cents_round_trip(units in 0u64..10_000_000, cents in 0u64..100) {
      let grouped = group_thousands(units);
      let text = format!("{grouped},{cents:02} €");
      let expected: f64 = format!("{units}.{cents:02}").parse().unwrap();
      prop_assert_eq!(amount(&text), CellValue::Number(expected));
    }
  }

  fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
      if i > 0 && (digits.len() - i) % 3 == 0 {
        out.push('.');
      }
      out.push(c);
    }
    out
  }
}
