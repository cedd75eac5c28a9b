//! Change-detection types: favorites, discovered documents, and per-row
//! check state.
//!
//! Results are computed on demand for one user-initiated check and never
//! written back into the canonical dataset.

use std::fmt;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Serialize, Serializer, ser::SerializeStruct};

use crate::{source::Source, table::CanonicalRecord};

// ─── NewDocument ─────────────────────────────────────────────────────────────

/// A document or update published on a tender's detail page at or after the
/// row's cutoff.
///
/// The full timestamp is kept for the cutoff comparison; `fecha` is
/// serialised as the publication day only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewDocument {
  #[serde(rename = "fecha", serialize_with = "serialize_day")]
  pub timestamp:   NaiveDateTime,
  #[serde(rename = "documento")]
  pub description: String,
}

fn serialize_day<S: Serializer>(
  timestamp: &NaiveDateTime,
  serializer: S,
) -> Result<S::Ok, S::Error> {
  serializer.collect_str(&timestamp.date().format("%Y-%m-%d"))
}

// ─── FavoriteRecord ──────────────────────────────────────────────────────────

/// A canonical row the user flagged for change tracking.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteRecord {
  pub expediente:  String,
  pub url:         Option<String>,
  pub is_favorite: bool,
  /// Documents published at or after this instant count as new.
  pub last_run:    NaiveDateTime,
  pub record:      CanonicalRecord,
}

impl FavoriteRecord {
  /// Build a favorite whose cutoff is the start of the record's run date.
  pub fn from_record(
    record: CanonicalRecord,
    expediente: impl Into<String>,
    url: Option<String>,
  ) -> Self {
    Self {
      expediente: expediente.into(),
      url,
      is_favorite: true,
      last_run: record.fecha_proceso.and_time(NaiveTime::MIN),
      record,
    }
  }

  /// The single source this row came from, if it is unambiguous.
  pub fn single_source(&self) -> Option<Source> {
    match self.record.fuente.as_slice() {
      [only] => Some(*only),
      _ => None,
    }
  }
}

// ─── CheckState ──────────────────────────────────────────────────────────────

/// Per-row progress: `Pending → Visited → {NoChange | Changed} | Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckState {
  Pending,
  Visited,
  NoChange,
  Changed,
  Failed { reason: String },
}

impl CheckState {
  /// The detail page has been loaded.
  pub fn visit(self) -> Self {
    match self {
      Self::Pending => Self::Visited,
      other => other,
    }
  }

  /// Settle a visited row from its discovered documents.
  pub fn settle(self, documents: &[NewDocument]) -> Self {
    match self {
      Self::Visited if documents.is_empty() => Self::NoChange,
      Self::Visited => Self::Changed,
      other => other,
    }
  }

  /// Nothing to visit for this row (no strategy for its source).
  pub fn skip(self) -> Self {
    match self {
      Self::Pending => Self::NoChange,
      other => other,
    }
  }

  /// Loading or parsing the page failed.
  pub fn fail(self, reason: impl Into<String>) -> Self {
    match self {
      Self::Pending | Self::Visited => Self::Failed {
        reason: reason.into(),
      },
      other => other,
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::NoChange | Self::Changed | Self::Failed { .. })
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Visited => "visited",
      Self::NoChange => "no_change",
      Self::Changed => "changed",
      Self::Failed { .. } => "failed",
    }
  }
}

impl fmt::Display for CheckState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Failed { reason } => write!(f, "failed: {reason}"),
      other => f.write_str(other.as_str()),
    }
  }
}

// ─── ChangeDetectionResult ───────────────────────────────────────────────────

/// A favorite row augmented with what the check found.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeDetectionResult {
  pub favorite:      FavoriteRecord,
  pub new_documents: Vec<NewDocument>,
  pub state:         CheckState,
}

impl ChangeDetectionResult {
  /// Assemble a result. A failed row never carries documents, so it can never
  /// be reported as updated.
  pub fn new(
    favorite: FavoriteRecord,
    state: CheckState,
    new_documents: Vec<NewDocument>,
  ) -> Self {
    let new_documents = match state {
      CheckState::Failed { .. } => Vec::new(),
      _ => new_documents,
    };
    Self {
      favorite,
      new_documents,
      state,
    }
  }

  pub fn updated(&self) -> bool { !self.new_documents.is_empty() }
}

impl Serialize for ChangeDetectionResult {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut s = serializer.serialize_struct("ChangeDetectionResult", 7)?;
    s.serialize_field("expediente", &self.favorite.expediente)?;
    s.serialize_field("fuente", &self.favorite.record.fuente)?;
    s.serialize_field("url", &self.favorite.url)?;
    s.serialize_field("last_run", &self.favorite.last_run)?;
    s.serialize_field("estado", self.state.as_str())?;
    s.serialize_field("updated", &self.updated())?;
    s.serialize_field("new_documents", &self.new_documents)?;
    s.end()
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn favorite() -> FavoriteRecord {
    FavoriteRecord::from_record(
      CanonicalRecord {
        values:        vec![],
        fuente:        vec![Source::Andalucia],
        fecha_proceso: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
      },
      "EXP-1",
      Some("https://example.test/1".into()),
    )
  }

  fn doc() -> NewDocument {
    NewDocument {
      timestamp:   NaiveDate::from_ymd_opt(2025, 1, 2)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap(),
      description: "Anuncio".into(),
    }
  }

  #[test]
  fn cutoff_is_start_of_run_date() {
    let fav = favorite();
    assert_eq!(fav.last_run.to_string(), "2025-01-01 00:00:00");
    assert_eq!(fav.single_source(), Some(Source::Andalucia));
  }

  #[test]
  fn state_machine_transitions() {
    let s = CheckState::Pending.visit();
    assert_eq!(s, CheckState::Visited);
    assert_eq!(s.clone().settle(&[]), CheckState::NoChange);
    assert_eq!(s.settle(&[doc()]), CheckState::Changed);
    assert_eq!(CheckState::Pending.skip(), CheckState::NoChange);
    assert!(matches!(
      CheckState::Visited.fail("timeout"),
      CheckState::Failed { .. }
    ));
    // Terminal states are sticky.
    assert_eq!(CheckState::Changed.fail("late"), CheckState::Changed);
    assert!(!CheckState::Visited.is_terminal());
  }

  #[test]
  fn failed_rows_are_never_updated() {
    let result = ChangeDetectionResult::new(
      favorite(),
      CheckState::Failed {
        reason: "boom".into(),
      },
      vec![doc()],
    );
    assert!(!result.updated());
    assert!(result.new_documents.is_empty());
  }

  #[test]
  fn updated_iff_documents_present() {
    let changed =
      ChangeDetectionResult::new(favorite(), CheckState::Changed, vec![doc()]);
    assert!(changed.updated());
    let unchanged =
      ChangeDetectionResult::new(favorite(), CheckState::NoChange, vec![]);
    assert!(!unchanged.updated());
  }

  #[test]
  fn serializes_documents_as_fecha_documento() {
    let result =
      ChangeDetectionResult::new(favorite(), CheckState::Changed, vec![doc()]);
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["expediente"], "EXP-1");
    assert_eq!(json["fuente"][0], "Andalucía");
    assert_eq!(json["updated"], true);
    assert_eq!(json["estado"], "changed");
    assert_eq!(json["new_documents"][0]["documento"], "Anuncio");
    assert_eq!(json["new_documents"][0]["fecha"], "2025-01-02");
  }
}
