//! Record normalizer: one source's raw table → canonical table.
//!
//! Steps, per source:
//!   select mapped columns ─ rename ─ reindex to canonical order
//!     └─ parse `fecha` columns ─ parse currency columns ─ stamp provenance

use chrono::NaiveDate;
use licita_core::{
  cell::CellValue,
  columns::ColumnConfig,
  source::Source,
  table::{CanonicalRecord, CanonicalTable, RawTable},
};
use licita_locale::{parse_amount, parse_date};

use crate::mapper::rename_map;

const CURRENCY_MARKERS: [&str; 3] = ["importe", "valor", "presupuesto"];

/// How a canonical column's values are normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnKind {
  Date,
  Currency,
  Plain,
}

impl ColumnKind {
  /// Classify by canonical name. A name that reads as both a date and an
  /// amount is treated as a date.
  pub(crate) fn of(name: &str) -> Self {
    if name.contains("fecha") {
      Self::Date
    } else {
      let lower = name.to_lowercase();
      if CURRENCY_MARKERS.iter().any(|m| lower.contains(m)) {
        Self::Currency
      } else {
        Self::Plain
      }
    }
  }

  pub(crate) fn apply(self, cell: &CellValue) -> CellValue {
    match self {
      Self::Date => CellValue::Date(parse_date(cell)),
      Self::Currency => parse_amount(cell),
      Self::Plain => cell.clone(),
    }
  }
}

/// Normalizes raw tables for a single run.
pub struct Normalizer<'a> {
  config:        &'a ColumnConfig,
  fecha_proceso: NaiveDate,
}

impl<'a> Normalizer<'a> {
  /// `fecha_proceso` is stamped on every record this normalizer produces.
  pub fn new(config: &'a ColumnConfig, fecha_proceso: NaiveDate) -> Self {
    Self {
      config,
      fecha_proceso,
    }
  }

  pub fn fecha_proceso(&self) -> NaiveDate { self.fecha_proceso }

  /// Produce the canonical table for `raw`.
  ///
  /// Never fails: an empty input yields an empty table with the full
  /// canonical header, and unparseable values degrade to their documented
  /// defaults.
  pub fn normalize(&self, source: Source, raw: &RawTable) -> CanonicalTable {
    let dups = raw.duplicate_columns();
    if !dups.is_empty() {
      tracing::warn!(
        source = %source,
        columns = ?dups,
        "duplicate raw columns; keeping first occurrence"
      );
    }

    let renames = rename_map(self.config, source);

    // Mapped columns present in the raw table, as (raw position, canonical).
    let mut selected: Vec<(usize, &str)> = Vec::with_capacity(renames.len());
    for (native, canonical) in renames.iter() {
      let Some(pos) = raw.column_index(native) else {
        continue;
      };
      if selected.iter().any(|(_, c)| *c == canonical) {
        tracing::warn!(
          source = %source,
          column = %native,
          field = %canonical,
          "second column for the same field; keeping first"
        );
        continue;
      }
      selected.push((pos, canonical));
    }

    let fields = self.config.canonical_names();
    let plan: Vec<(Option<usize>, ColumnKind)> = fields
      .iter()
      .map(|f| {
        let pos = selected.iter().find(|(_, c)| *c == f.as_str()).map(|(p, _)| *p);
        (pos, ColumnKind::of(f))
      })
      .collect();

    let mut table = CanonicalTable::new(fields);
    for row in raw.rows() {
      let values = plan
        .iter()
        .map(|(pos, kind)| {
          let cell = pos.and_then(|p| row.get(p)).cloned().unwrap_or_default();
          kind.apply(&cell)
        })
        .collect();
      table.push(CanonicalRecord {
        values,
        fuente: vec![source],
        fecha_proceso: self.fecha_proceso,
      });
    }

    tracing::info!(source = %source, rows = table.len(), "normalized source table");
    table
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classifies_columns_by_name() {
    assert_eq!(ColumnKind::of("fecha_limite_presentacion"), ColumnKind::Date);
    assert_eq!(ColumnKind::of("importe_licitacion"), ColumnKind::Currency);
    assert_eq!(ColumnKind::of("Valor_Estimado"), ColumnKind::Currency);
    assert_eq!(ColumnKind::of("presupuesto_base"), ColumnKind::Currency);
    assert_eq!(ColumnKind::of("fecha_valor"), ColumnKind::Date);
    assert_eq!(ColumnKind::of("objeto"), ColumnKind::Plain);
  }
}
