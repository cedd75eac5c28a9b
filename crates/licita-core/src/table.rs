//! Raw and canonical tables.
//!
//! A [`RawTable`] is what a portal scraper hands over: native column names,
//! any number of rows, possibly repeated headers. A [`CanonicalTable`] has
//! exactly the canonical field set, in canonical order, plus provenance.

use chrono::NaiveDate;

use crate::{cell::CellValue, source::Source};

/// Name of the provenance column holding the source display name(s).
pub const FUENTE: &str = "fuente";
/// Name of the provenance column holding the run date.
pub const FECHA_PROCESO: &str = "fecha_proceso";

// ─── RawTable ────────────────────────────────────────────────────────────────

/// An untyped table keyed by native column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
  columns: Vec<String>,
  rows:    Vec<Vec<CellValue>>,
}

impl RawTable {
  pub fn new(columns: Vec<String>) -> Self {
    Self {
      columns,
      rows: Vec::new(),
    }
  }

  /// Append a row. Short rows are padded with nulls and long rows truncated
  /// so every row matches the header width.
  pub fn push_row(&mut self, mut row: Vec<CellValue>) {
    row.resize(self.columns.len(), CellValue::Null);
    self.rows.push(row);
  }

  pub fn columns(&self) -> &[String] { &self.columns }

  pub fn rows(&self) -> &[Vec<CellValue>] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  /// Position of the first column called `name`.
  pub fn column_index(&self, name: &str) -> Option<usize> {
    self.columns.iter().position(|c| c == name)
  }

  /// Column names that appear more than once, each reported once.
  pub fn duplicate_columns(&self) -> Vec<&str> {
    let mut dups: Vec<&str> = Vec::new();
    for (i, name) in self.columns.iter().enumerate() {
      if self.columns[..i].contains(name) && !dups.contains(&name.as_str()) {
        dups.push(name);
      }
    }
    dups
  }
}

// ─── CanonicalRecord ─────────────────────────────────────────────────────────

/// One canonical row. `values` is aligned with the owning table's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
  pub values:        Vec<CellValue>,
  /// Usually a single source; several after cross-source merging.
  pub fuente:        Vec<Source>,
  pub fecha_proceso: NaiveDate,
}

impl CanonicalRecord {
  /// The `fuente` column as rendered in snapshots.
  pub fn fuente_label(&self) -> String {
    self
      .fuente
      .iter()
      .map(|s| s.display_name())
      .collect::<Vec<_>>()
      .join(", ")
  }
}

// ─── CanonicalTable ──────────────────────────────────────────────────────────

/// A table in the canonical schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalTable {
  fields:  Vec<String>,
  records: Vec<CanonicalRecord>,
}

impl CanonicalTable {
  /// An empty table with the given canonical fields.
  pub fn new(fields: Vec<String>) -> Self {
    Self {
      fields,
      records: Vec::new(),
    }
  }

  /// Append a record, padding or truncating its values to the field count.
  pub fn push(&mut self, mut record: CanonicalRecord) {
    record.values.resize(self.fields.len(), CellValue::Null);
    self.records.push(record);
  }

  /// Canonical fields, without the provenance columns.
  pub fn fields(&self) -> &[String] { &self.fields }

  /// Full header: canonical fields followed by `fuente` and `fecha_proceso`.
  pub fn header(&self) -> Vec<&str> {
    self
      .fields
      .iter()
      .map(String::as_str)
      .chain([FUENTE, FECHA_PROCESO])
      .collect()
  }

  pub fn records(&self) -> &[CanonicalRecord] { &self.records }

  pub fn into_records(self) -> Vec<CanonicalRecord> { self.records }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }

  pub fn field_index(&self, name: &str) -> Option<usize> {
    self.fields.iter().position(|f| f == name)
  }

  /// The value of `field` in `record`, if the field is part of this table.
  pub fn value<'a>(
    &self,
    record: &'a CanonicalRecord,
    field: &str,
  ) -> Option<&'a CellValue> {
    self.field_index(field).and_then(|i| record.values.get(i))
  }

  /// Rearrange columns into `fields` order. Fields this table lacks become
  /// null; fields not listed are dropped.
  pub fn reindexed(&self, fields: &[String]) -> Self {
    let positions: Vec<Option<usize>> =
      fields.iter().map(|f| self.field_index(f)).collect();
    let records = self
      .records
      .iter()
      .map(|r| CanonicalRecord {
        values:        positions
          .iter()
          .map(|p| p.and_then(|i| r.values.get(i).cloned()).unwrap_or_default())
          .collect(),
        fuente:        r.fuente.clone(),
        fecha_proceso: r.fecha_proceso,
      })
      .collect();
    Self {
      fields: fields.to_vec(),
      records,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date() -> NaiveDate { NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() }

  #[test]
  fn raw_rows_are_padded_to_header_width() {
    let mut t = RawTable::new(vec!["a".into(), "b".into(), "c".into()]);
    t.push_row(vec![CellValue::text("1")]);
    t.push_row(vec![
      CellValue::text("1"),
      CellValue::text("2"),
      CellValue::text("3"),
      CellValue::text("4"),
    ]);
    assert!(t.rows().iter().all(|r| r.len() == 3));
    assert_eq!(t.rows()[0][2], CellValue::Null);
  }

  #[test]
  fn duplicate_columns_reported_once() {
    let t = RawTable::new(vec!["a".into(), "b".into(), "a".into(), "a".into()]);
    assert_eq!(t.duplicate_columns(), vec!["a"]);
    assert_eq!(t.column_index("a"), Some(0));
  }

  #[test]
  fn reindex_moves_and_fills_columns() {
    let mut t = CanonicalTable::new(vec!["b".into(), "a".into()]);
    t.push(CanonicalRecord {
      values:        vec![CellValue::text("B"), CellValue::text("A")],
      fuente:        vec![Source::Euskadi],
      fecha_proceso: date(),
    });

    let r = t.reindexed(&["a".into(), "b".into(), "c".into()]);
    assert_eq!(r.fields(), ["a", "b", "c"]);
    assert_eq!(r.records()[0].values, vec![
      CellValue::text("A"),
      CellValue::text("B"),
      CellValue::Null,
    ]);
    assert_eq!(r.header(), vec!["a", "b", "c", "fuente", "fecha_proceso"]);
  }

  #[test]
  fn fuente_label_joins_sources() {
    let r = CanonicalRecord {
      values:        vec![],
      fuente:        vec![Source::Andalucia, Source::Madrid],
      fecha_proceso: date(),
    };
    assert_eq!(r.fuente_label(), "Andalucía, Comunidad de Madrid");
  }
}
