//! HTTP transport for detail pages.

use std::{future::Future, time::Duration};

use licita_core::fetch::DetailFetcher;
use reqwest::Client;

use crate::{Error, Result};

/// Connection settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct HttpOptions {
  pub timeout:    Duration,
  pub user_agent: String,
}

impl Default for HttpOptions {
  fn default() -> Self {
    Self {
      timeout:    Duration::from_secs(20),
      user_agent: concat!("licita/", env!("CARGO_PKG_VERSION")).to_string(),
    }
  }
}

/// Loads detail pages over HTTP(S).
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based and pools
/// connections across rows.
#[derive(Clone)]
pub struct HttpFetcher {
  client:  Client,
  timeout: Duration,
}

impl HttpFetcher {
  pub fn new(options: &HttpOptions) -> Result<Self> {
    let client = Client::builder()
      .timeout(options.timeout)
      .user_agent(options.user_agent.clone())
      .redirect(reqwest::redirect::Policy::limited(5))
      .build()
      .map_err(Error::Client)?;
    Ok(Self {
      client,
      timeout: options.timeout,
    })
  }
}

impl DetailFetcher for HttpFetcher {
  type Error = Error;

  fn fetch<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<String>> + Send + 'a {
    async move {
      let fail = |source: reqwest::Error| {
        if source.is_timeout() {
          Error::Timeout {
            url:  url.to_string(),
            secs: self.timeout.as_secs(),
          }
        } else {
          Error::Fetch {
            url: url.to_string(),
            source,
          }
        }
      };

      let resp = self.client.get(url).send().await.map_err(fail)?;
      let status = resp.status();
      if !status.is_success() {
        return Err(Error::Status {
          url: url.to_string(),
          status,
        });
      }
      resp.text().await.map_err(fail)
    }
  }
}
