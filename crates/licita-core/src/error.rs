//! Error types for `licita-core`.
//!
//! Every variant here is a configuration error: it is raised while loading the
//! column mapping and aborts the run before any table is produced.

use std::path::PathBuf;

use thiserror::Error;

use crate::source::Source;

#[derive(Debug, Error)]
pub enum Error {
  #[error("column mapping has no canonical fields")]
  EmptyCanonical,

  #[error("canonical index {index} is declared by both {first:?} and {second:?}")]
  DuplicateCanonicalIndex {
    index:  i64,
    first:  String,
    second: String,
  },

  #[error("canonical field {0:?} collides with a provenance column")]
  ReservedField(String),

  #[error(
    "{portal}: column {column:?} declares index {index}, which has no \
     canonical field"
  )]
  UnknownIndex {
    portal: Source,
    column: String,
    index:  i64,
  },

  #[error("no column mapping for source {0}")]
  MissingSourceMapping(Source),

  #[error("unknown source key {0:?} in column mapping")]
  UnknownSource(String),

  #[error("failed to read column mapping {path:?}: {source}")]
  ColumnsFile {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed column mapping: {0}")]
  ColumnsToml(#[from] toml::de::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
