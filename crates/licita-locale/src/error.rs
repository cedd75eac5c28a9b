//! Error types for the locale parsers.
//!
//! These never escape the `parse_*` entry points; they are only returned by
//! the `try_*` variants.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  #[error("unparseable date: {0:?}")]
  UnparseableDate(String),

  #[error("unparseable amount: {0:?}")]
  UnparseableAmount(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
