//! The index-keyed column mapping.
//!
//! Canonical field names and each portal's native column names live in two
//! independent name spaces, joined only through shared integer indices. The
//! mapping is loaded once per run into an immutable [`ColumnConfig`] and
//! validated eagerly: a source index with no canonical counterpart is a
//! configuration error, not a silently dropped column.
//!
//! # File format
//!
//! ```toml
//! [canonical]
//! numero_expediente = 1
//! objeto            = 2
//!
//! [sources.and]
//! "Nº Expediente" = 1
//! "Objeto"        = 2
//! ```

use std::{collections::HashMap, path::Path};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::{
  Error, Result,
  source::Source,
  table::{FECHA_PROCESO, FUENTE},
};

// ─── Types ───────────────────────────────────────────────────────────────────

/// A canonical field and its index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalField {
  pub name:  String,
  pub index: i64,
}

/// Two native columns of one source declaring the same index. Both stay in
/// the mapping; the first in configuration order that a raw table actually
/// carries is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexCollision {
  pub index:    i64,
  pub first:    String,
  pub fallback: String,
}

/// One source's native-column → index mapping, in configuration order.
#[derive(Debug, Clone)]
pub struct SourceColumns {
  pub source: Source,
  columns:    Vec<(String, i64)>,
  collisions: Vec<IndexCollision>,
}

impl SourceColumns {
  /// Native columns and their indices, in configuration order.
  pub fn columns(&self) -> &[(String, i64)] { &self.columns }

  /// Index collisions found when the mapping was loaded.
  pub fn collisions(&self) -> &[IndexCollision] { &self.collisions }
}

/// The validated, immutable mapping for all sources.
#[derive(Debug, Clone)]
pub struct ColumnConfig {
  /// Sorted by ascending index; this is the canonical column order.
  canonical: Vec<CanonicalField>,
  by_index:  HashMap<i64, usize>,
  /// One entry per source, in [`Source::ALL`] order.
  sources:   Vec<SourceColumns>,
}

/// Shape of the column mapping file.
#[derive(Debug, Deserialize)]
struct ColumnsFile {
  canonical: IndexMap<String, i64>,
  #[serde(default)]
  sources:   IndexMap<String, IndexMap<String, i64>>,
}

// ─── Construction ────────────────────────────────────────────────────────────

impl ColumnConfig {
  /// Validate and build the mapping.
  ///
  /// Fails if the canonical table is empty, reuses an index, or names a
  /// provenance column; if any source lacks a mapping; or if a source
  /// declares an index absent from the canonical table.
  pub fn new(
    canonical: IndexMap<String, i64>,
    sources: IndexMap<Source, IndexMap<String, i64>>,
  ) -> Result<Self> {
    if canonical.is_empty() {
      return Err(Error::EmptyCanonical);
    }

    let mut fields: Vec<CanonicalField> = Vec::with_capacity(canonical.len());
    let mut seen: HashMap<i64, String> = HashMap::new();
    for (name, index) in canonical {
      if name == FUENTE || name == FECHA_PROCESO {
        return Err(Error::ReservedField(name));
      }
      if let Some(first) = seen.get(&index) {
        return Err(Error::DuplicateCanonicalIndex {
          index,
          first: first.clone(),
          second: name,
        });
      }
      seen.insert(index, name.clone());
      fields.push(CanonicalField { name, index });
    }
    fields.sort_by_key(|f| f.index);

    let by_index = fields
      .iter()
      .enumerate()
      .map(|(pos, f)| (f.index, pos))
      .collect::<HashMap<_, _>>();

    let mut sources = sources;
    let mut resolved = Vec::with_capacity(Source::ALL.len());
    for source in Source::ALL {
      let native = sources
        .shift_remove(&source)
        .ok_or(Error::MissingSourceMapping(source))?;
      resolved.push(resolve_source(source, native, &by_index)?);
    }

    Ok(Self {
      canonical: fields,
      by_index,
      sources: resolved,
    })
  }

  /// Parse a mapping from TOML text.
  pub fn from_toml_str(input: &str) -> Result<Self> {
    let file: ColumnsFile = toml::from_str(input)?;
    let mut sources = IndexMap::with_capacity(file.sources.len());
    for (key, native) in file.sources {
      let source =
        Source::from_key(&key).ok_or_else(|| Error::UnknownSource(key.clone()))?;
      sources.insert(source, native);
    }
    Self::new(file.canonical, sources)
  }

  /// Read and parse a mapping file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let text =
      std::fs::read_to_string(path).map_err(|source| Error::ColumnsFile {
        path: path.to_path_buf(),
        source,
      })?;
    Self::from_toml_str(&text)
  }

  // ─── Lookups ────────────────────────────────────────────────────────────────

  /// Canonical fields in canonical order.
  pub fn canonical(&self) -> &[CanonicalField] { &self.canonical }

  /// Canonical field names in canonical order.
  pub fn canonical_names(&self) -> Vec<String> {
    self.canonical.iter().map(|f| f.name.clone()).collect()
  }

  /// The canonical field name for `index`.
  pub fn canonical_name(&self, index: i64) -> Option<&str> {
    self
      .by_index
      .get(&index)
      .map(|&pos| self.canonical[pos].name.as_str())
  }

  pub fn canonical_index(&self, name: &str) -> Option<i64> {
    self.canonical.iter().find(|f| f.name == name).map(|f| f.index)
  }

  pub fn source(&self, source: Source) -> &SourceColumns {
    &self.sources[source.ordinal()]
  }
}

fn resolve_source(
  source: Source,
  native: IndexMap<String, i64>,
  by_index: &HashMap<i64, usize>,
) -> Result<SourceColumns> {
  let mut columns: Vec<(String, i64)> = Vec::with_capacity(native.len());
  let mut collisions = Vec::new();

  for (column, index) in native {
    if !by_index.contains_key(&index) {
      return Err(Error::UnknownIndex {
        portal: source,
        column,
        index,
      });
    }
    if let Some((first, _)) = columns.iter().find(|(_, i)| *i == index) {
      collisions.push(IndexCollision {
        index,
        first: first.clone(),
        fallback: column.clone(),
      });
    }
    columns.push((column, index));
  }

  Ok(SourceColumns {
    source,
    columns,
    collisions,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  const MAPPING: &str = r#"
[canonical]
objeto = 2
numero_expediente = 1
fecha_limite_presentacion = 3

[sources.and]
"Nº Expediente" = 1
"Objeto del contrato" = 2

[sources.esp]
"Expediente" = 1
"Fecha fin de presentación" = 3

[sources.eus]
"Código" = 1

[sources.mad]
"Referencia" = 1
"Título" = 2
"Nombre" = 2
"#;

  #[test]
  fn canonical_order_follows_index() {
    let cfg = ColumnConfig::from_toml_str(MAPPING).unwrap();
    assert_eq!(cfg.canonical_names(), vec![
      "numero_expediente",
      "objeto",
      "fecha_limite_presentacion",
    ]);
    assert_eq!(cfg.canonical_name(2), Some("objeto"));
    assert_eq!(cfg.canonical_index("fecha_limite_presentacion"), Some(3));
    assert_eq!(cfg.canonical_name(9), None);
  }

  #[test]
  fn source_columns_keep_config_order() {
    let cfg = ColumnConfig::from_toml_str(MAPPING).unwrap();
    let and = cfg.source(Source::Andalucia);
    assert_eq!(and.columns()[0], ("Nº Expediente".to_string(), 1));
    assert_eq!(and.columns()[1], ("Objeto del contrato".to_string(), 2));
  }

  #[test]
  fn index_collision_keeps_both_in_order() {
    let cfg = ColumnConfig::from_toml_str(MAPPING).unwrap();
    let mad = cfg.source(Source::Madrid);
    assert_eq!(mad.columns(), [
      ("Referencia".to_string(), 1),
      ("Título".to_string(), 2),
      ("Nombre".to_string(), 2),
    ]);
    assert_eq!(mad.collisions(), [IndexCollision {
      index:    2,
      first:    "Título".into(),
      fallback: "Nombre".into(),
    }]);
  }

  #[test]
  fn unknown_source_index_fails_fast() {
    let input = MAPPING.replace("\"Código\" = 1", "\"Código\" = 7");
    let err = ColumnConfig::from_toml_str(&input).unwrap_err();
    assert!(matches!(
      err,
      Error::UnknownIndex { portal: Source::Euskadi, index: 7, .. }
    ));
  }

  #[test]
  fn missing_source_section_fails() {
    let input = MAPPING.replace("[sources.eus]\n\"Código\" = 1\n", "");
    let err = ColumnConfig::from_toml_str(&input).unwrap_err();
    assert!(matches!(err, Error::MissingSourceMapping(Source::Euskadi)));
  }

  #[test]
  fn unknown_source_key_fails() {
    let input = format!("{MAPPING}\n[sources.cat]\n\"X\" = 1\n");
    let err = ColumnConfig::from_toml_str(&input).unwrap_err();
    assert!(matches!(err, Error::UnknownSource(k) if k == "cat"));
  }

  #[test]
  fn duplicate_canonical_index_fails() {
    let input = MAPPING.replace("objeto = 2", "objeto = 1");
    let err = ColumnConfig::from_toml_str(&input).unwrap_err();
    assert!(matches!(err, Error::DuplicateCanonicalIndex { index: 1, .. }));
  }

  #[test]
  fn provenance_names_are_reserved() {
    let input = MAPPING.replace("objeto = 2", "fuente = 2");
    let err = ColumnConfig::from_toml_str(&input).unwrap_err();
    assert!(matches!(err, Error::ReservedField(f) if f == "fuente"));
  }

  #[test]
  fn malformed_toml_is_config_error() {
    let err = ColumnConfig::from_toml_str("[canonical\n").unwrap_err();
    assert!(matches!(err, Error::ColumnsToml(_)));
  }

  #[test]
  fn empty_canonical_fails() {
    let err = ColumnConfig::new(IndexMap::new(), IndexMap::new()).unwrap_err();
    assert!(matches!(err, Error::EmptyCanonical));
  }
}
