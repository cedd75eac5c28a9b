//! The `DetailFetcher` trait: how the change-detection engine loads a
//! tender's detail page.
//!
//! Implemented by transport backends (e.g. the HTTP fetcher in
//! `licita-watch`). The engine depends on this abstraction so it can be
//! driven by canned pages in tests.

use std::future::Future;

/// Loads the HTML of a detail page.
///
/// Each call is one independent visit; implementations must be safe to call
/// from several workers at once.
pub trait DetailFetcher: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the page at `url` and return its markup.
  fn fetch<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;
}
