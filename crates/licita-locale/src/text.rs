//! Case/accent folding and the Spanish month table.

/// Lowercase, strip Spanish diacritics and collapse runs of whitespace.
///
/// Used for every "does this header read X" comparison, so that
/// `Documentación  Complementaria` and `documentacion complementaria` match.
pub fn fold(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for word in s.split_whitespace() {
    if !out.is_empty() {
      out.push(' ');
    }
    for c in word.chars().flat_map(char::to_lowercase) {
      out.push(strip_accent(c));
    }
  }
  out
}

fn strip_accent(c: char) -> char {
  match c {
    'á' | 'à' | 'â' | 'ä' | 'ã' => 'a',
    'é' | 'è' | 'ê' | 'ë' => 'e',
    'í' | 'ì' | 'î' | 'ï' => 'i',
    'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
    'ú' | 'ù' | 'û' | 'ü' => 'u',
    'ñ' => 'n',
    'ç' => 'c',
    other => other,
  }
}

/// Month number for a Spanish month name (`"junio"` → 6).
///
/// Case- and accent-insensitive; `setiembre` is accepted alongside
/// `septiembre`.
pub fn month_number(name: &str) -> Option<u32> {
  let n = match fold(name).as_str() {
    "enero" => 1,
    "febrero" => 2,
    "marzo" => 3,
    "abril" => 4,
    "mayo" => 5,
    "junio" => 6,
    "julio" => 7,
    "agosto" => 8,
    "septiembre" | "setiembre" => 9,
    "octubre" => 10,
    "noviembre" => 11,
    "diciembre" => 12,
    _ => return None,
  };
  Some(n)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fold_strips_case_accents_and_spacing() {
    assert_eq!(
      fold("  Documentación   Complementaria "),
      "documentacion complementaria"
    );
    assert_eq!(fold("RESUMEN LICITACIÓN"), "resumen licitacion");
    assert_eq!(fold("España"), "espana");
  }

  #[test]
  fn month_names() {
    assert_eq!(month_number("enero"), Some(1));
    assert_eq!(month_number("Junio"), Some(6));
    assert_eq!(month_number("setiembre"), Some(9));
    assert_eq!(month_number("diciembre"), Some(12));
    assert_eq!(month_number("june"), None);
  }
}
