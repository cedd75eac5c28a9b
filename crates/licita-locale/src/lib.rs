//! Spanish locale parsers for Licita.
//!
//! Normalizes the date and currency strings found on procurement portals into
//! typed values. Pure synchronous; no I/O.
//!
//! The `parse_*` functions never fail: unparseable dates become
//! [`FieldDate::Unbounded`](licita_core::cell::FieldDate::Unbounded) and
//! unconvertible amounts keep their original text. The `try_*` functions
//! expose the underlying failure.
//!
//! # Quick start
//!
//! ```
//! use licita_core::cell::{CellValue, FieldDate};
//! use licita_locale::{parse_amount, parse_date_str};
//!
//! let deadline = parse_date_str("26 de junio del 2025 23:59");
//! assert_eq!(deadline.to_string(), "2025-06-26");
//! assert_eq!(parse_date_str("sin fecha"), FieldDate::Unbounded);
//!
//! assert_eq!(parse_amount(&CellValue::text("1.234,56 €")), CellValue::Number(1234.56));
//! ```

mod currency;
mod date;
pub mod error;
mod text;

pub use currency::{parse_amount, try_parse_amount};
pub use date::{parse_date, parse_date_str, try_parse_date};
pub use error::{Error, Result};
pub use text::{fold, month_number};
