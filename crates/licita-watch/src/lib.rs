//! Change detection for favorite tenders.
//!
//! For every favorite row the engine loads the tender's detail page through a
//! [`DetailFetcher`](licita_core::fetch::DetailFetcher), hands the markup to
//! the extraction strategy for the row's source, and keeps the documents
//! published at or after the row's cutoff:
//!
//! ```text
//! FavoriteRecord ─ extractor_for(fuente) ─ fetch(url) ─ extract(page, cutoff)
//!                        │ none                │ error / timeout
//!                        └─ NoChange           └─ Failed (never updated)
//! ```
//!
//! Rows are independent; [`ChangeDetector`] runs them on a bounded number of
//! workers, each with its own per-page timeout.

pub mod engine;
pub mod error;
pub mod http;
pub mod strategy;

pub use engine::{ChangeDetector, WatchOptions};
pub use error::{Error, Result};
pub use http::{HttpFetcher, HttpOptions};
pub use strategy::{DocumentExtractor, extract_new_documents, extractor_for};
