//! Junta de Andalucía: a "Documentación complementaria" heading followed by a
//! `div.contenido` whose paragraphs carry `dd/mm/yyyy hh:mm` stamps.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use licita_core::{source::Source, watch::NewDocument};
use licita_locale::fold;
use regex::Regex;
use scraper::{Html, Selector};

use super::{DocumentExtractor, after, elements, has_class, is, text_of};

const MARKER: &str = "documentacion complementaria";
const STAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

static STAMP: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\d{2}/\d{2}/\d{4} \d{2}:\d{2}").expect("valid stamp pattern")
});

static PARAGRAPH: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("p").expect("valid paragraph selector"));

pub struct Andalucia;

impl DocumentExtractor for Andalucia {
  fn source(&self) -> Source { Source::Andalucia }

  fn extract(&self, page: &Html, cutoff: NaiveDateTime) -> Vec<NewDocument> {
    let elements = elements(page);
    let Some(rest) = after(&elements, |e| {
      is(e, "h2") && fold(&text_of(e)).contains(MARKER)
    }) else {
      tracing::debug!(source = %self.source(), "no complementary documentation section");
      return Vec::new();
    };
    let Some(content) = rest.iter().find(|e| is(e, "div") && has_class(e, "contenido"))
    else {
      return Vec::new();
    };

    let mut documents = Vec::new();
    for p in content.select(&PARAGRAPH) {
      let text = text_of(&p);
      for stamp in STAMP.find_iter(&text) {
        match NaiveDateTime::parse_from_str(stamp.as_str(), STAMP_FORMAT) {
          Ok(ts) if ts >= cutoff => documents.push(NewDocument {
            timestamp:   ts,
            description: text.clone(),
          }),
          Ok(_) => {}
          Err(e) => tracing::debug!(stamp = stamp.as_str(), error = %e, "bad stamp"),
        }
      }
    }
    documents
  }
}
