//! Unifier: concatenation of per-source tables and the optional merge of rows
//! sharing a business key.

use std::collections::HashMap;

use licita_core::{
  cell::CellValue,
  source::Source,
  table::{CanonicalRecord, CanonicalTable},
};

use crate::{Error, Result};

/// Concatenate normalized tables, source by source, into the canonical
/// column order given by `fields`.
///
/// Row order within and across tables is preserved. Sources that produced no
/// table are simply not passed in; with no tables at all the result is an
/// empty table with the canonical header.
pub fn unify(
  fields: &[String],
  tables: impl IntoIterator<Item = CanonicalTable>,
) -> CanonicalTable {
  let mut unified = CanonicalTable::new(fields.to_vec());
  let mut parts = 0usize;

  for table in tables {
    parts += 1;
    let table = if table.fields() == fields {
      table
    } else {
      table.reindexed(fields)
    };
    for record in table.into_records() {
      unified.push(record);
    }
  }

  if parts == 0 {
    tracing::warn!("no source tables to unify; dataset is empty");
  }
  tracing::info!(tables = parts, rows = unified.len(), "unified dataset");
  unified
}

// ─── Merge by key ────────────────────────────────────────────────────────────

/// How rows sharing a key are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
  /// The business key, normally the tender reference number.
  pub key_field:    String,
  /// Fields whose distinct values are joined rather than coalesced.
  /// `fuente` is always joined.
  pub merge_fields: Vec<String>,
}

impl Default for MergeOptions {
  fn default() -> Self {
    Self {
      key_field:    "numero_expediente".into(),
      merge_fields: vec!["enlace".into(), "pdf".into()],
    }
  }
}

/// Collapse every group of rows sharing `key_field` into one row.
///
/// Groups come out in first-appearance order of their key. In a merged row,
/// `fuente` and each merge field hold the group's distinct values joined with
/// `", "`; every other field takes the first non-null value in group order.
/// Rows with a null key are never merged and never dropped.
pub fn merge_by_key(
  table: &CanonicalTable,
  opts: &MergeOptions,
) -> Result<CanonicalTable> {
  let key_pos = table
    .field_index(&opts.key_field)
    .ok_or_else(|| Error::MissingKeyField(opts.key_field.clone()))?;

  let joined: Vec<bool> = table
    .fields()
    .iter()
    .map(|f| opts.merge_fields.iter().any(|m| m == f))
    .collect();

  let mut groups: Vec<Vec<&CanonicalRecord>> = Vec::new();
  let mut by_key: HashMap<String, usize> = HashMap::new();
  for record in table.records() {
    let key = record.values.get(key_pos).and_then(CellValue::render);
    match key {
      Some(key) => {
        let slot = *by_key.entry(key).or_insert_with(|| {
          groups.push(Vec::new());
          groups.len() - 1
        });
        groups[slot].push(record);
      }
      None => groups.push(vec![record]),
    }
  }

  let mut merged = CanonicalTable::new(table.fields().to_vec());
  let mut collapsed = 0usize;
  for group in groups {
    match group.as_slice() {
      [only] => merged.push((*only).clone()),
      rows => {
        collapsed += rows.len() - 1;
        merged.push(merge_group(rows, &joined));
      }
    }
  }

  tracing::info!(
    before = table.len(),
    after = merged.len(),
    merged = collapsed,
    key = %opts.key_field,
    "merged rows by key"
  );
  Ok(merged)
}

fn merge_group(rows: &[&CanonicalRecord], joined: &[bool]) -> CanonicalRecord {
  let values = joined
    .iter()
    .enumerate()
    .map(|(i, &join)| {
      let mut column = rows.iter().filter_map(|r| r.values.get(i));
      if join {
        join_distinct(column)
      } else {
        column.find(|v| !v.is_null()).cloned().unwrap_or_default()
      }
    })
    .collect();

  let mut fuente: Vec<Source> = Vec::new();
  for source in rows.iter().flat_map(|r| r.fuente.iter()) {
    if !fuente.contains(source) {
      fuente.push(*source);
    }
  }

  CanonicalRecord {
    values,
    fuente,
    fecha_proceso: rows[0].fecha_proceso,
  }
}

fn join_distinct<'a>(values: impl Iterator<Item = &'a CellValue>) -> CellValue {
  let mut seen: Vec<String> = Vec::new();
  for v in values.filter_map(CellValue::render) {
    if !seen.contains(&v) {
      seen.push(v);
    }
  }
  if seen.is_empty() {
    CellValue::Null
  } else {
    CellValue::Text(seen.join(", "))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn join_distinct_keeps_first_appearance() {
    let cells = [
      CellValue::text("b"),
      CellValue::Null,
      CellValue::text("a"),
      CellValue::text("b"),
    ];
    assert_eq!(join_distinct(cells.iter()), CellValue::text("b, a"));
    assert_eq!(join_distinct([CellValue::Null].iter()), CellValue::Null);
  }

  #[test]
  fn default_options_merge_links() {
    let opts = MergeOptions::default();
    assert_eq!(opts.key_field, "numero_expediente");
    assert_eq!(opts.merge_fields, vec!["enlace", "pdf"]);
  }
}
