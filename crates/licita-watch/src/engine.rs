//! The change-detection engine.

use std::{sync::Arc, time::Duration};

use licita_core::{
  fetch::DetailFetcher,
  watch::{ChangeDetectionResult, CheckState, FavoriteRecord},
};
use scraper::Html;
use tokio::{sync::Semaphore, task::JoinSet};

use crate::{Error, strategy::extractor_for};

/// Limits applied to a change-detection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
  /// Ceiling on loading one detail page.
  pub timeout:     Duration,
  /// Detail pages loaded at the same time. Zero is treated as one.
  pub concurrency: usize,
}

impl Default for WatchOptions {
  fn default() -> Self {
    Self {
      timeout:     Duration::from_secs(20),
      concurrency: 1,
    }
  }
}

/// Checks favorite rows for newly published documents.
pub struct ChangeDetector<F> {
  fetcher: Arc<F>,
  options: WatchOptions,
}

impl<F> ChangeDetector<F>
where
  F: DetailFetcher + 'static,
{
  pub fn new(fetcher: F, options: WatchOptions) -> Self {
    Self {
      fetcher: Arc::new(fetcher),
      options,
    }
  }

  /// Check every favorite and return one result per row, in input order.
  ///
  /// Never fails as a whole: a row whose page cannot be loaded in time is
  /// reported as failed and not updated, and the other rows carry on.
  pub async fn check(&self, favorites: Vec<FavoriteRecord>) -> Vec<ChangeDetectionResult> {
    let permits = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
    let mut join_set = JoinSet::new();

    for (idx, favorite) in favorites.iter().cloned().enumerate() {
      let fetcher = Arc::clone(&self.fetcher);
      let permits = Arc::clone(&permits);
      let timeout = self.options.timeout;
      join_set.spawn(async move {
        // The semaphore is never closed.
        let _permit = permits.acquire_owned().await.ok();
        (idx, check_one(fetcher.as_ref(), favorite, timeout).await)
      });
    }

    let mut slots: Vec<Option<ChangeDetectionResult>> = vec![None; favorites.len()];
    while let Some(joined) = join_set.join_next().await {
      match joined {
        Ok((idx, result)) => slots[idx] = Some(result),
        Err(e) => tracing::warn!(error = %Error::Join(e), "check task did not finish"),
      }
    }

    let results: Vec<ChangeDetectionResult> = slots
      .into_iter()
      .zip(favorites)
      .map(|(slot, favorite)| {
        slot.unwrap_or_else(|| {
          ChangeDetectionResult::new(
            favorite,
            CheckState::Pending.fail("check task aborted"),
            Vec::new(),
          )
        })
      })
      .collect();

    let updated = results.iter().filter(|r| r.updated()).count();
    let failed = results
      .iter()
      .filter(|r| matches!(r.state, CheckState::Failed { .. }))
      .count();
    tracing::info!(rows = results.len(), updated, failed, "change detection finished");
    results
  }
}

/// Check a single favorite row.
pub async fn check_one<F: DetailFetcher>(
  fetcher: &F,
  favorite: FavoriteRecord,
  timeout: Duration,
) -> ChangeDetectionResult {
  let state = CheckState::Pending;

  let Some(source) = favorite.single_source() else {
    tracing::warn!(
      expediente = %favorite.expediente,
      fuente = %favorite.record.fuente_label(),
      "row has no single source; not checked"
    );
    return ChangeDetectionResult::new(favorite, state.skip(), Vec::new());
  };
  let Some(extractor) = extractor_for(source) else {
    tracing::debug!(expediente = %favorite.expediente, source = %source, "no detail check for source");
    return ChangeDetectionResult::new(favorite, state.skip(), Vec::new());
  };
  let Some(url) = favorite.url.clone() else {
    let e = Error::MissingUrl;
    tracing::warn!(expediente = %favorite.expediente, error = %e, "check failed");
    return ChangeDetectionResult::new(favorite, state.fail(e.to_string()), Vec::new());
  };

  let page = match tokio::time::timeout(timeout, fetcher.fetch(&url)).await {
    Ok(Ok(page)) => page,
    Ok(Err(e)) => {
      tracing::warn!(expediente = %favorite.expediente, url = %url, error = %e, "check failed");
      return ChangeDetectionResult::new(favorite, state.fail(e.to_string()), Vec::new());
    }
    Err(_) => {
      let e = Error::Timeout {
        url,
        secs: timeout.as_secs(),
      };
      tracing::warn!(expediente = %favorite.expediente, error = %e, "check failed");
      return ChangeDetectionResult::new(favorite, state.fail(e.to_string()), Vec::new());
    }
  };

  let state = state.visit();
  let documents = extractor.extract(&Html::parse_document(&page), favorite.last_run);
  let state = state.settle(&documents);
  tracing::debug!(
    expediente = %favorite.expediente,
    source = %source,
    new_documents = documents.len(),
    "checked detail page"
  );
  ChangeDetectionResult::new(favorite, state, documents)
}
