//! Favorite selection and date-window filtering over a canonical table.

use std::collections::HashSet;

use chrono::NaiveDate;
use licita_core::{
  cell::{CellValue, FieldDate},
  table::{CanonicalRecord, CanonicalTable},
  watch::FavoriteRecord,
};
use licita_locale::parse_date;

use crate::{Error, Result};

/// Favorites named by reference number.
///
/// A row is selected when its trimmed key equals one of the trimmed
/// `expedientes`. Rows come out in table order; rows with a null key are
/// never selected.
pub fn select_favorites(
  table: &CanonicalTable,
  key_field: &str,
  url_field: &str,
  expedientes: &[String],
) -> Result<Vec<FavoriteRecord>> {
  let wanted: HashSet<&str> = expedientes
    .iter()
    .map(|e| e.trim())
    .filter(|e| !e.is_empty())
    .collect();

  let columns = Columns::resolve(table, key_field, url_field)?;
  let favorites: Vec<FavoriteRecord> = table
    .records()
    .iter()
    .filter_map(|r| {
      let key = columns.key(r)?;
      wanted.contains(key.as_str()).then(|| columns.favorite(r, key))
    })
    .collect();

  tracing::info!(
    requested = wanted.len(),
    selected = favorites.len(),
    "selected favorites by reference"
  );
  Ok(favorites)
}

/// Favorites driven by a per-row boolean column such as `Favorito`.
///
/// `flags` is aligned with the table's rows; missing trailing flags count as
/// unflagged.
pub fn select_flagged(
  table: &CanonicalTable,
  flags: &[bool],
  key_field: &str,
  url_field: &str,
) -> Result<Vec<FavoriteRecord>> {
  let columns = Columns::resolve(table, key_field, url_field)?;
  let favorites: Vec<FavoriteRecord> = table
    .records()
    .iter()
    .zip(flags.iter().copied().chain(std::iter::repeat(false)))
    .filter(|(_, flagged)| *flagged)
    .map(|(r, _)| {
      let key = columns.key(r).unwrap_or_default();
      columns.favorite(r, key)
    })
    .collect();

  tracing::info!(selected = favorites.len(), "selected flagged favorites");
  Ok(favorites)
}

/// Rows whose `field` date is on or after `from`. Unparseable and missing
/// dates are unbounded and always kept.
pub fn open_from(
  table: &CanonicalTable,
  field: &str,
  from: NaiveDate,
) -> Result<CanonicalTable> {
  let pos = table
    .field_index(field)
    .ok_or_else(|| Error::UnknownField(field.to_string()))?;
  let from = FieldDate::Known(from);

  let mut open = CanonicalTable::new(table.fields().to_vec());
  for record in table.records() {
    let date = record.values.get(pos).map(parse_date);
    if date.unwrap_or(FieldDate::Unbounded) >= from {
      open.push(record.clone());
    }
  }
  Ok(open)
}

/// Positions of the key and URL columns.
struct Columns {
  key: usize,
  url: usize,
}

impl Columns {
  fn resolve(table: &CanonicalTable, key_field: &str, url_field: &str) -> Result<Self> {
    Ok(Self {
      key: table
        .field_index(key_field)
        .ok_or_else(|| Error::MissingKeyField(key_field.to_string()))?,
      url: table
        .field_index(url_field)
        .ok_or_else(|| Error::UnknownField(url_field.to_string()))?,
    })
  }

  fn key(&self, record: &CanonicalRecord) -> Option<String> {
    let key = record.values.get(self.key).and_then(CellValue::render)?;
    Some(key.trim().to_string())
  }

  fn favorite(&self, record: &CanonicalRecord, key: String) -> FavoriteRecord {
    let url = record
      .values
      .get(self.url)
      .and_then(CellValue::render)
      .map(|u| u.trim().to_string())
      .filter(|u| !u.is_empty());
    FavoriteRecord::from_record(record.clone(), key, url)
  }
}
