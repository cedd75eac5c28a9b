//! Snapshot files: tab-separated UTF-8 with a byte-order mark.
//!
//! Raw per-source snapshots are named `licitaciones_<slug>_<YYYY-MM-DD>.csv`;
//! the unified dataset is `licitaciones.csv`; change-detection results are
//! `licitaciones_favs_actualizadas_<YYYY-MM-DD>.csv`. Despite the extension,
//! every file is TSV.

use std::{
  fs,
  io::{self, BufWriter, Write},
  mem::take,
  path::{Path, PathBuf},
};

use chrono::NaiveDate;
use licita_core::{
  cell::{CellValue, FieldDate},
  columns::ColumnConfig,
  source::Source,
  table::{CanonicalRecord, CanonicalTable, FECHA_PROCESO, FUENTE, RawTable},
  watch::ChangeDetectionResult,
};

use crate::{Error, Result, normalize::ColumnKind};

const BOM: char = '\u{feff}';
const SEP: char = '\t';
const DATE_FORMAT: &str = "%Y-%m-%d";

/// File name of the unified dataset.
pub const CANONICAL_FILE_NAME: &str = "licitaciones.csv";
/// The boolean column the dashboard adds to mark favorites.
pub const FLAG_COLUMN: &str = "Favorito";

// ─── File names ──────────────────────────────────────────────────────────────

/// `licitaciones_<slug>_<YYYY-MM-DD>.csv`
pub fn source_file_name(source: Source, date: NaiveDate) -> String {
  format!("licitaciones_{}_{}.csv", source.slug(), date.format(DATE_FORMAT))
}

/// `licitaciones_favs_actualizadas_<YYYY-MM-DD>.csv`
pub fn results_file_name(date: NaiveDate) -> String {
  format!("licitaciones_favs_actualizadas_{}.csv", date.format(DATE_FORMAT))
}

/// Find a source's raw snapshot in `dir`.
///
/// With a `date`, that day's file must exist. Without one, the file with the
/// most recent date in its name is chosen.
pub fn locate_source_file(
  dir: &Path,
  source: Source,
  date: Option<NaiveDate>,
) -> Result<PathBuf> {
  let unavailable = |reason: String| Error::SourceUnavailable {
    portal: source,
    reason,
  };

  if let Some(date) = date {
    let path = dir.join(source_file_name(source, date));
    return if path.is_file() {
      Ok(path)
    } else {
      Err(unavailable(format!("{} not found", path.display())))
    };
  }

  let prefix = format!("licitaciones_{}_", source.slug());
  let entries = fs::read_dir(dir)
    .map_err(|e| unavailable(format!("cannot list {}: {e}", dir.display())))?;

  let mut latest: Option<(NaiveDate, PathBuf)> = None;
  for entry in entries.flatten() {
    let name = entry.file_name();
    let Some(name) = name.to_str() else { continue };
    let Some(stamp) = name
      .strip_prefix(&prefix)
      .and_then(|rest| rest.strip_suffix(".csv"))
    else {
      continue;
    };
    let Ok(date) = NaiveDate::parse_from_str(stamp, DATE_FORMAT) else {
      continue;
    };
    if latest.as_ref().is_none_or(|(best, _)| date > *best) {
      latest = Some((date, entry.path()));
    }
  }

  latest
    .map(|(_, path)| path)
    .ok_or_else(|| unavailable(format!("no snapshot in {}", dir.display())))
}

// ─── Reading ─────────────────────────────────────────────────────────────────

/// Read a raw per-source snapshot. Every cell is text or null.
pub fn read_raw_table(path: &Path) -> Result<RawTable> {
  let (header, rows) = read_rows(path)?;
  let mut table = RawTable::new(header);
  for row in rows {
    table.push_row(row.iter().map(|c| CellValue::from_raw(c)).collect());
  }
  tracing::debug!(path = %path.display(), rows = table.len(), "read raw snapshot");
  Ok(table)
}

/// A canonical snapshot read back from disk, with any columns beyond the
/// canonical schema kept aside.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
  pub table:     CanonicalTable,
  extra_columns: Vec<String>,
  /// Aligned with `table`'s records.
  extra_rows:    Vec<Vec<String>>,
}

impl Snapshot {
  /// Names of the non-canonical columns, in file order.
  pub fn extra_columns(&self) -> &[String] { &self.extra_columns }

  /// A boolean extra column, one flag per record. Accepts `True`/`true`/`1`.
  pub fn flags(&self, column: &str) -> Option<Vec<bool>> {
    let pos = self.extra_columns.iter().position(|c| c == column)?;
    Some(
      self
        .extra_rows
        .iter()
        .map(|row| {
          row
            .get(pos)
            .is_some_and(|v| matches!(v.trim(), "True" | "true" | "TRUE" | "1"))
        })
        .collect(),
    )
  }
}

/// Read a canonical snapshot written by [`write_canonical`] (or by the
/// dashboard, which may add columns such as [`FLAG_COLUMN`]).
///
/// Canonical fields missing from the file are null. Date columns are
/// re-parsed, with the rendered sentinel read back as unbounded; currency
/// columns are converted again.
pub fn read_canonical(path: &Path, config: &ColumnConfig) -> Result<Snapshot> {
  let (header, rows) = read_rows(path)?;
  let position = |name: &str| header.iter().position(|h| h == name);
  let missing = |column: &str| Error::MissingColumn {
    path:   path.to_path_buf(),
    column: column.to_string(),
  };

  let fuente_pos = position(FUENTE).ok_or_else(|| missing(FUENTE))?;
  let run_pos = position(FECHA_PROCESO).ok_or_else(|| missing(FECHA_PROCESO))?;

  let fields = config.canonical_names();
  let plan: Vec<(Option<usize>, ColumnKind)> = fields
    .iter()
    .map(|f| (position(f), ColumnKind::of(f)))
    .collect();
  let extra: Vec<usize> = (0..header.len())
    .filter(|i| {
      *i != fuente_pos && *i != run_pos && !fields.contains(&header[*i])
    })
    .collect();

  let mut table = CanonicalTable::new(fields);
  let mut extra_rows = Vec::with_capacity(rows.len());
  for (n, row) in rows.iter().enumerate() {
    let cell = |pos: usize| row.get(pos).map(String::as_str).unwrap_or("");

    let values = plan
      .iter()
      .map(|(pos, kind)| {
        let raw = pos.map(cell).unwrap_or("");
        match kind {
          ColumnKind::Date if raw.trim() == FieldDate::SENTINEL => {
            CellValue::Date(FieldDate::Unbounded)
          }
          kind => kind.apply(&CellValue::from_raw(raw)),
        }
      })
      .collect();

    let fuente = parse_fuente(cell(fuente_pos));
    let run = cell(run_pos).trim();
    let fecha_proceso =
      NaiveDate::parse_from_str(run, DATE_FORMAT).map_err(|_| Error::BadRunDate {
        path:  path.to_path_buf(),
        // One for the header, one for 1-based numbering.
        line:  n + 2,
        value: run.to_string(),
      })?;

    table.push(CanonicalRecord {
      values,
      fuente,
      fecha_proceso,
    });
    extra_rows.push(extra.iter().map(|&i| cell(i).to_string()).collect());
  }

  tracing::info!(path = %path.display(), rows = table.len(), "read canonical snapshot");
  Ok(Snapshot {
    table,
    extra_columns: extra.iter().map(|&i| header[i].clone()).collect(),
    extra_rows,
  })
}

fn parse_fuente(cell: &str) -> Vec<Source> {
  cell
    .split(", ")
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .filter_map(|name| {
      let source = Source::from_display_name(name);
      if source.is_none() {
        tracing::warn!(fuente = %name, "unknown source name in snapshot");
      }
      source
    })
    .collect()
}

/// Header and data rows of a TSV file. Fails on a file with no header.
fn read_rows(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>)> {
  let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
  let text = text.strip_prefix(BOM).unwrap_or(&text);
  let mut rows = parse_rows(text, SEP);
  if rows.is_empty() {
    return Err(Error::EmptyFile(path.to_path_buf()));
  }
  let header = rows.remove(0).into_iter().map(|h| h.trim().to_string()).collect();
  Ok((header, rows))
}

/// Quote-aware row splitter; tolerates CRLF and skips blank lines.
fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
  let mut rows = Vec::new();
  let mut field = String::new();
  let mut row = Vec::new();
  let mut in_quotes = false;
  let mut chars = text.chars().peekable();

  while let Some(ch) = chars.next() {
    match ch {
      '"' if in_quotes => {
        if chars.peek() == Some(&'"') {
          chars.next();
          field.push('"');
        } else {
          in_quotes = false;
        }
      }
      '"' if field.is_empty() => in_quotes = true,
      c if c == sep && !in_quotes => row.push(take(&mut field)),
      '\n' | '\r' if !in_quotes => {
        if ch == '\r' && chars.peek() == Some(&'\n') {
          chars.next();
        }
        row.push(take(&mut field));
        if row.len() == 1 && row[0].is_empty() {
          row.clear();
        } else {
          rows.push(take(&mut row));
        }
      }
      _ => field.push(ch),
    }
  }

  if !field.is_empty() || !row.is_empty() {
    row.push(field);
    rows.push(row);
  }
  rows
}

// ─── Writing ─────────────────────────────────────────────────────────────────

/// Write the unified dataset. The parent directory is created if needed.
pub fn write_canonical(path: &Path, table: &CanonicalTable) -> Result<()> {
  let mut out = create(path)?;
  let header: Vec<String> = table.header().into_iter().map(String::from).collect();

  let emit = |out: &mut BufWriter<fs::File>| -> io::Result<()> {
    write_row(&mut *out, &header)?;
    for record in table.records() {
      write_row(&mut *out, &record_cells(record))?;
    }
    out.flush()
  };
  emit(&mut out).map_err(|e| Error::io(path, e))?;

  tracing::info!(path = %path.display(), rows = table.len(), "wrote canonical snapshot");
  Ok(())
}

/// Write change-detection results into `dir` and return the file's path.
///
/// Columns: `fields`, the provenance columns, then `new_documents` (a JSON
/// list of `{fecha, documento}`), `updated`, `estado` and `fecha_ejecucion`.
pub fn write_check_results(
  dir: &Path,
  results: &[ChangeDetectionResult],
  fields: &[String],
  run_date: NaiveDate,
) -> Result<PathBuf> {
  let path = dir.join(results_file_name(run_date));
  let mut out = create(&path)?;

  let mut header: Vec<String> = fields.to_vec();
  header.extend(
    [FUENTE, FECHA_PROCESO, "new_documents", "updated", "estado", "fecha_ejecucion"]
      .map(String::from),
  );
  let run_date = run_date.format(DATE_FORMAT).to_string();

  let mut lines = Vec::with_capacity(results.len());
  for r in results {
    let mut cells = record_cells(&r.favorite.record);
    cells.extend([
      serde_json::to_string(&r.new_documents)?,
      python_bool(r.updated()).to_string(),
      r.state.as_str().to_string(),
      run_date.clone(),
    ]);
    lines.push(cells);
  }

  let emit = |out: &mut BufWriter<fs::File>| -> io::Result<()> {
    write_row(&mut *out, &header)?;
    for cells in &lines {
      write_row(&mut *out, cells)?;
    }
    out.flush()
  };
  emit(&mut out).map_err(|e| Error::io(&path, e))?;

  tracing::info!(path = %path.display(), rows = results.len(), "wrote check results");
  Ok(path)
}

fn create(path: &Path) -> Result<BufWriter<fs::File>> {
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
  }
  let file = fs::File::create(path).map_err(|e| Error::io(path, e))?;
  let mut out = BufWriter::new(file);
  write!(out, "{BOM}").map_err(|e| Error::io(path, e))?;
  Ok(out)
}

fn record_cells(record: &CanonicalRecord) -> Vec<String> {
  record
    .values
    .iter()
    .map(|v| v.render().unwrap_or_default())
    .chain([
      record.fuente_label(),
      record.fecha_proceso.format(DATE_FORMAT).to_string(),
    ])
    .collect()
}

fn python_bool(b: bool) -> &'static str { if b { "True" } else { "False" } }

/// Tabs and line breaks inside a value become spaces; values containing a
/// quote are quoted.
fn write_row<W: Write>(mut w: W, row: &[String]) -> io::Result<()> {
  for (i, cell) in row.iter().enumerate() {
    if i > 0 {
      write!(w, "{SEP}")?;
    }
    let cell = cell.replace(['\t', '\n', '\r'], " ");
    if cell.contains('"') {
      write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
    } else {
      w.write_all(cell.as_bytes())?;
    }
  }
  writeln!(w)
}
