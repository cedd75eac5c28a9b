//! Error type for `licita-watch`.
//!
//! Every variant describes why a single detail page could not be checked.
//! The engine never returns these; it records them as a failed row.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build http client: {0}")]
  Client(#[source] reqwest::Error),

  #[error("request to {url} failed: {source}")]
  Fetch {
    url:    String,
    #[source]
    source: reqwest::Error,
  },

  #[error("{url} answered {status}")]
  Status {
    url:    String,
    status: reqwest::StatusCode,
  },

  #[error("no answer from {url} within {secs}s")]
  Timeout { url: String, secs: u64 },

  #[error("row has no detail url")]
  MissingUrl,

  #[error("check task aborted: {0}")]
  Join(#[from] tokio::task::JoinError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
