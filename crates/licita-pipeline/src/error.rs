//! Error type for `licita-pipeline`.

use std::path::PathBuf;

use licita_core::source::Source;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A whole source table could not be loaded. Callers leave that source out
  /// of the unified dataset.
  #[error("source {portal} unavailable: {reason}")]
  SourceUnavailable { portal: Source, reason: String },

  #[error("key field {0:?} is not a canonical field")]
  MissingKeyField(String),

  #[error("field {0:?} is not a canonical field")]
  UnknownField(String),

  #[error("{0:?} has no header line")]
  EmptyFile(PathBuf),

  #[error("{path:?} has no {column:?} column")]
  MissingColumn { path: PathBuf, column: String },

  #[error("{path:?} line {line}: invalid run date {value:?}")]
  BadRunDate {
    path:  PathBuf,
    line:  usize,
    value: String,
  },

  #[error("i/o error on {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

impl Error {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
