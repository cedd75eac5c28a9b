//! Plataforma de Contratación del Sector Público.
//!
//! The "Resumen Licitación" summary table lists one document per row with a
//! `dd/mm/yyyy hh:mm:ss` publication stamp. When that table yields nothing
//! new, the page's "last updated" stamp stands in for a single document of
//! unknown type.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use licita_core::{source::Source, watch::NewDocument};
use licita_locale::fold;
use scraper::{ElementRef, Html, Selector};

use super::{DocumentExtractor, after, elements, has_class, is, text_of};

const MARKER: &str = "resumen licitacion";
const ROW_FORMAT: &str = "%d/%m/%Y %H:%M:%S";
const UPDATED_FORMAT: &str = "%d/%m/%Y %H:%M";
const UPDATED_ID: &str = "FechaActualizacion";
const UNKNOWN_DOCUMENT: &str = "desconocido";

static ROWS: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("tbody tr").expect("valid row selector"));
static ROW_DATE: LazyLock<Selector> = LazyLock::new(|| {
  Selector::parse("td.fechaPubLeft div").expect("valid date cell selector")
});
static ROW_KIND: LazyLock<Selector> = LazyLock::new(|| {
  Selector::parse("td.tipoDocumento div").expect("valid kind cell selector")
});

pub struct Espana;

impl DocumentExtractor for Espana {
  fn source(&self) -> Source { Source::Espana }

  fn extract(&self, page: &Html, cutoff: NaiveDateTime) -> Vec<NewDocument> {
    let elements = elements(page);
    let documents = summary_documents(&elements, cutoff);
    if !documents.is_empty() {
      return documents;
    }
    last_updated(&elements, cutoff).into_iter().collect()
  }
}

fn summary_documents(
  elements: &[ElementRef<'_>],
  cutoff: NaiveDateTime,
) -> Vec<NewDocument> {
  let Some(rest) = after(elements, |e| {
    is(e, "span") && e.value().attr("title").is_some_and(|t| fold(t) == MARKER)
  }) else {
    tracing::debug!(source = %Source::Espana, "no summary section");
    return Vec::new();
  };
  let Some(table) = rest.iter().find(|e| is(e, "table")) else {
    return Vec::new();
  };

  let mut documents = Vec::new();
  for row in table.select(&ROWS) {
    let (Some(date), Some(kind)) =
      (row.select(&ROW_DATE).next(), row.select(&ROW_KIND).next())
    else {
      continue;
    };
    let stamp = text_of(&date);
    match NaiveDateTime::parse_from_str(&stamp, ROW_FORMAT) {
      Ok(ts) if ts >= cutoff => documents.push(NewDocument {
        timestamp:   ts,
        description: text_of(&kind),
      }),
      Ok(_) => {}
      Err(e) => tracing::debug!(stamp = %stamp, error = %e, "bad stamp"),
    }
  }
  documents
}

fn last_updated(
  elements: &[ElementRef<'_>],
  cutoff: NaiveDateTime,
) -> Option<NewDocument> {
  let span = elements.iter().find(|e| {
    is(e, "span")
      && has_class(e, "outputText")
      && e.value().id().is_some_and(|id| id.contains(UPDATED_ID))
  })?;
  let stamp = text_of(span);
  let ts = NaiveDateTime::parse_from_str(&stamp, UPDATED_FORMAT)
    .inspect_err(|e| tracing::debug!(stamp = %stamp, error = %e, "bad update stamp"))
    .ok()?;
  (ts >= cutoff).then(|| NewDocument {
    timestamp:   ts,
    description: UNKNOWN_DOCUMENT.to_string(),
  })
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn cutoff() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
      .unwrap()
      .and_hms_opt(0, 0, 0)
      .unwrap()
  }

  fn page(rows: &str, updated: &str) -> Html {
    Html::parse_document(&format!(
      r#"<html><body>
        <span title="Resumen Licitación">Resumen Licitación</span>
        <table>
          <thead><tr><th>Fecha</th><th>Documento</th></tr></thead>
          <tbody>{rows}</tbody>
        </table>
        <span class="outputText" id="viewns:form:text_FechaActualizacion">{updated}</span>
      </body></html>"#
    ))
  }

  fn row(stamp: &str, kind: &str) -> String {
    format!(
      r#"<tr><td class="fechaPubLeft"><div>{stamp}</div></td>
             <td class="tipoDocumento"><div> {kind} </div></td></tr>"#
    )
  }

  #[test]
  fn summary_rows_after_cutoff() {
    let rows = [
      row("30/12/2024 12:00:00", "Anuncio previo"),
      row("02/01/2025 10:15:00", "Pliego"),
      row("not a date", "Roto"),
    ]
    .concat();
    let docs = Espana.extract(&page(&rows, "01/02/2025 10:00"), cutoff());
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].description, "Pliego");
    assert_eq!(docs[0].timestamp.to_string(), "2025-01-02 10:15:00");
  }

  #[test]
  fn falls_back_to_update_stamp() {
    let rows = row("30/12/2024 12:00:00", "Anuncio previo");
    let docs = Espana.extract(&page(&rows, "03/01/2025 08:00"), cutoff());
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].description, "desconocido");
    assert_eq!(docs[0].timestamp.to_string(), "2025-01-03 08:00:00");
  }

  #[test]
  fn old_update_stamp_is_not_new() {
    let docs = Espana.extract(&page("", "31/12/2024 23:59"), cutoff());
    assert!(docs.is_empty());
  }

  #[test]
  fn update_stamp_without_summary_section() {
    let html = Html::parse_document(
      r#"<html><body>
        <h1>Detalle</h1>
        <span class="outputText" id="viewns:form:text_FechaActualizacion">05/01/2025 09:30</span>
      </body></html>"#,
    );
    let docs = Espana.extract(&html, cutoff());
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].description, "desconocido");
    assert_eq!(docs[0].timestamp.to_string(), "2025-01-05 09:30:00");
  }

  #[test]
  fn unrelated_page_yields_nothing() {
    let html = Html::parse_document("<p>Mantenimiento</p>");
    assert!(Espana.extract(&html, cutoff()).is_empty());
  }
}
