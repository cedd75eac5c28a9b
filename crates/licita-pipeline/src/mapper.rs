//! Column schema mapper: native column names → canonical field names.

use indexmap::IndexMap;
use licita_core::{columns::ColumnConfig, source::Source};

/// Native → canonical renames for one source, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameMap {
  pairs: IndexMap<String, String>,
}

impl RenameMap {
  /// The canonical name for a native column.
  pub fn get(&self, native: &str) -> Option<&str> {
    self.pairs.get(native).map(String::as_str)
  }

  /// `(native, canonical)` pairs in configuration order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.pairs.iter().map(|(n, c)| (n.as_str(), c.as_str()))
  }

  pub fn len(&self) -> usize { self.pairs.len() }

  pub fn is_empty(&self) -> bool { self.pairs.is_empty() }
}

/// Join a source's native columns to canonical fields through their shared
/// index.
///
/// Native columns whose index has no canonical field are left out; canonical
/// fields with no native column are simply absent. Colliding native columns
/// all map to their shared field, in configuration order; collisions found
/// when the mapping was loaded are reported here, once per call.
pub fn rename_map(config: &ColumnConfig, source: Source) -> RenameMap {
  let columns = config.source(source);

  for c in columns.collisions() {
    tracing::warn!(
      source = %source,
      index = c.index,
      first = %c.first,
      fallback = %c.fallback,
      "index collision in column mapping; first column present wins"
    );
  }

  let pairs = columns
    .columns()
    .iter()
    .filter_map(|(native, index)| {
      config
        .canonical_name(*index)
        .map(|canonical| (native.clone(), canonical.to_string()))
    })
    .collect();

  RenameMap { pairs }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tests::config;

  #[test]
  fn joins_on_shared_index() {
    let cfg = config();
    let map = rename_map(&cfg, Source::Andalucia);
    assert_eq!(map.get("Nº Expediente"), Some("numero_expediente"));
    assert_eq!(map.get("Importe"), Some("importe_licitacion"));
    assert_eq!(map.get("Desconocida"), None);
  }

  #[test]
  fn keeps_configuration_order() {
    let cfg = config();
    let map = rename_map(&cfg, Source::Espana);
    let natives: Vec<&str> = map.iter().map(|(n, _)| n).collect();
    assert_eq!(natives, vec![
      "Expediente",
      "Objeto del contrato",
      "Presupuesto base",
      "Fecha fin presentación",
      "Enlace",
    ]);
  }

  #[test]
  fn colliding_natives_share_their_field() {
    let cfg = config();
    let map = rename_map(&cfg, Source::Madrid);
    assert_eq!(map.get("Título"), Some("objeto"));
    assert_eq!(map.get("Descripción"), Some("objeto"));
    let natives: Vec<&str> = map.iter().map(|(n, _)| n).collect();
    assert_eq!(natives, vec![
      "Referencia",
      "Título",
      "Descripción",
      "Importe",
      "Enlace",
    ]);
  }

  #[test]
  fn missing_canonical_fields_are_absent() {
    let cfg = config();
    let map = rename_map(&cfg, Source::Euskadi);
    assert_eq!(map.len(), 2);
    assert!(map.iter().all(|(_, c)| c != "importe_licitacion"));
  }
}
