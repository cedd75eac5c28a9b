//! Source: the closed set of portals a tender can come from.

use std::fmt;

use serde::{Serialize, Serializer};

/// One of the four procurement portals the aggregator understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
  Andalucia,
  Espana,
  Euskadi,
  Madrid,
}

impl Source {
  /// Every source, in the order the unifier concatenates them.
  pub const ALL: [Source; 4] =
    [Self::Andalucia, Self::Espana, Self::Euskadi, Self::Madrid];

  /// Short key used for the per-source sections of the column mapping.
  pub fn key(self) -> &'static str {
    match self {
      Self::Andalucia => "and",
      Self::Espana => "esp",
      Self::Euskadi => "eus",
      Self::Madrid => "mad",
    }
  }

  /// Slug embedded in raw snapshot file names
  /// (`licitaciones_<slug>_<date>.csv`).
  pub fn slug(self) -> &'static str {
    match self {
      Self::Andalucia => "andalucia",
      Self::Espana => "espana",
      Self::Euskadi => "euskadi",
      Self::Madrid => "madrid",
    }
  }

  /// The `fuente` value stamped on canonical rows.
  pub fn display_name(self) -> &'static str {
    match self {
      Self::Andalucia => "Andalucía",
      Self::Espana => "España",
      Self::Euskadi => "Euskadi",
      Self::Madrid => "Comunidad de Madrid",
    }
  }

  pub fn from_key(key: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|s| s.key() == key)
  }

  /// Exact match on [`Source::display_name`]; anything else is unknown.
  pub fn from_display_name(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|s| s.display_name() == name)
  }

  /// Position of this source in [`Source::ALL`].
  pub(crate) fn ordinal(self) -> usize { self as usize }
}

impl fmt::Display for Source {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.display_name())
  }
}

impl Serialize for Source {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.display_name())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_names_round_trip() {
    for source in Source::ALL {
      assert_eq!(Source::from_display_name(source.display_name()), Some(source));
      assert_eq!(Source::from_key(source.key()), Some(source));
    }
  }

  #[test]
  fn unknown_display_name_is_none() {
    assert_eq!(Source::from_display_name("Madrid"), None);
    assert_eq!(Source::from_display_name("andalucía"), None);
  }

  #[test]
  fn ordinal_matches_all() {
    for (i, source) in Source::ALL.into_iter().enumerate() {
      assert_eq!(source.ordinal(), i);
    }
  }
}
