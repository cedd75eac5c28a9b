//! Comunidad de Madrid: every `div.field--name-field-titulo` after the
//! "Pliegos de condiciones" heading reads
//! `<title> (… Publicado el 3 de marzo del 2025 10:00 …)`.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use licita_core::{source::Source, watch::NewDocument};
use licita_locale::{fold, month_number};
use regex::{Captures, Regex};
use scraper::Html;

use super::{DocumentExtractor, after, elements, has_class, is, text_of};

const MARKER: &str = "pliegos de condiciones";
const TITLE_CLASS: &str = "field--name-field-titulo";

static PUBLISHED: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"Publicado el (\d{1,2}) de (\w+) del (\d{4}) (\d{2}:\d{2})")
    .expect("valid published pattern")
});

pub struct Madrid;

impl DocumentExtractor for Madrid {
  fn source(&self) -> Source { Source::Madrid }

  fn extract(&self, page: &Html, cutoff: NaiveDateTime) -> Vec<NewDocument> {
    let elements = elements(page);
    let Some(rest) =
      after(&elements, |e| is(e, "h2") && fold(&text_of(e)).contains(MARKER))
    else {
      tracing::debug!(source = %self.source(), "no tender documents section");
      return Vec::new();
    };

    rest
      .iter()
      .filter(|e| is(e, "div") && has_class(e, TITLE_CLASS))
      .filter_map(|e| {
        let text = text_of(e);
        let ts = PUBLISHED.captures(&text).and_then(|c| published_at(&c))?;
        let title = text.split('(').next().unwrap_or_default().trim();
        (ts >= cutoff).then(|| NewDocument {
          timestamp:   ts,
          description: title.to_string(),
        })
      })
      .collect()
  }
}

/// Unknown month names make the entry unreadable rather than defaulting.
fn published_at(caps: &Captures<'_>) -> Option<NaiveDateTime> {
  let day: u32 = caps[1].parse().ok()?;
  let month = month_number(&caps[2])?;
  let year: i32 = caps[3].parse().ok()?;
  let time = NaiveTime::parse_from_str(&caps[4], "%H:%M").ok()?;
  Some(NaiveDate::from_ymd_opt(year, month, day)?.and_time(time))
}
