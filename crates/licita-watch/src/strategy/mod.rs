//! Per-source extraction strategies.
//!
//! Each portal renders its detail page differently, so each has its own
//! [`DocumentExtractor`]. The lookup is a closed table over
//! [`Source`]; a source without a strategy has nothing to check.

mod andalucia;
mod espana;
mod madrid;

use chrono::NaiveDateTime;
use licita_core::{source::Source, watch::NewDocument};
use scraper::{ElementRef, Html};

pub use andalucia::Andalucia;
pub use espana::Espana;
pub use madrid::Madrid;

/// Finds the documents published on a detail page.
pub trait DocumentExtractor: Send + Sync {
  fn source(&self) -> Source;

  /// Documents on `page` published at or after `cutoff`, in page order.
  ///
  /// A page that lacks the expected section yields no documents; this never
  /// fails.
  fn extract(&self, page: &Html, cutoff: NaiveDateTime) -> Vec<NewDocument>;
}

/// The strategy for `source`, or `None` when the portal has no detail-page
/// check.
pub fn extractor_for(source: Source) -> Option<&'static dyn DocumentExtractor> {
  match source {
    Source::Andalucia => Some(&Andalucia),
    Source::Espana => Some(&Espana),
    Source::Madrid => Some(&Madrid),
    Source::Euskadi => None,
  }
}

/// Parse `markup` and run the strategy for `source` over it.
pub fn extract_new_documents(
  source: Source,
  markup: &str,
  cutoff: NaiveDateTime,
) -> Vec<NewDocument> {
  match extractor_for(source) {
    Some(extractor) => extractor.extract(&Html::parse_document(markup), cutoff),
    None => Vec::new(),
  }
}

// ─── Shared helpers ──────────────────────────────────────────────────────────

/// Every element of the page, in document order.
fn elements(page: &Html) -> Vec<ElementRef<'_>> {
  page
    .root_element()
    .descendants()
    .filter_map(ElementRef::wrap)
    .collect()
}

/// The elements after the first one matching `marker`.
fn after<'a, 'p>(
  elements: &'a [ElementRef<'p>],
  marker: impl Fn(&ElementRef<'p>) -> bool,
) -> Option<&'a [ElementRef<'p>]> {
  let pos = elements.iter().position(marker)?;
  Some(&elements[pos + 1..])
}

/// The element's text with whitespace runs collapsed.
fn text_of(el: &ElementRef<'_>) -> String {
  el.text()
    .flat_map(str::split_whitespace)
    .collect::<Vec<_>>()
    .join(" ")
}

fn is(el: &ElementRef<'_>, name: &str) -> bool { el.value().name() == name }

fn has_class(el: &ElementRef<'_>, class: &str) -> bool {
  el.value().classes().any(|c| c == class)
}
