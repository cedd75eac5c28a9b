//! Runtime settings: `licita.toml` layered with `LICITA__*` environment
//! variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use licita_pipeline::MergeOptions;
use licita_watch::{HttpOptions, WatchOptions};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Where the per-source raw snapshots live.
  pub input_dir:      PathBuf,
  /// Where `licitaciones.csv` is written.
  pub output_dir:     PathBuf,
  /// Where change-detection results are written.
  pub output_dir_fav: PathBuf,
  /// The column index mapping.
  pub columns_path:   PathBuf,
  pub key_field:      String,
  pub url_field:      String,
  pub merge_fields:   Vec<String>,
  /// Merge rows sharing `key_field` on every unify run.
  pub dedup:          bool,
  pub watch:          WatchSettings,
}

impl Default for Settings {
  fn default() -> Self {
    let merge = MergeOptions::default();
    Self {
      input_dir:      PathBuf::from("./datos"),
      output_dir:     PathBuf::from("./output_final"),
      output_dir_fav: PathBuf::from("./datos"),
      columns_path:   PathBuf::from("./config/columns.toml"),
      key_field:      merge.key_field,
      url_field:      "enlace".to_string(),
      merge_fields:   merge.merge_fields,
      dedup:          false,
      watch:          WatchSettings::default(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WatchSettings {
  pub timeout_secs: u64,
  pub concurrency:  usize,
  pub user_agent:   String,
}

impl Default for WatchSettings {
  fn default() -> Self {
    let watch = WatchOptions::default();
    Self {
      timeout_secs: watch.timeout.as_secs(),
      concurrency:  watch.concurrency,
      user_agent:   HttpOptions::default().user_agent,
    }
  }
}

impl Settings {
  /// Read `path` (optional) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("LICITA").separator("__"))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  pub fn merge_options(&self) -> MergeOptions {
    MergeOptions {
      key_field:    self.key_field.clone(),
      merge_fields: self.merge_fields.clone(),
    }
  }
}

impl WatchSettings {
  pub fn watch_options(&self) -> WatchOptions {
    WatchOptions {
      timeout:     Duration::from_secs(self.timeout_secs),
      concurrency: self.concurrency,
    }
  }

  pub fn http_options(&self) -> HttpOptions {
    HttpOptions {
      timeout:    Duration::from_secs(self.timeout_secs),
      user_agent: self.user_agent.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(settings.input_dir, PathBuf::from("./datos"));
    assert_eq!(settings.key_field, "numero_expediente");
    assert_eq!(settings.merge_fields, vec!["enlace", "pdf"]);
    assert_eq!(settings.watch.timeout_secs, 20);
    assert_eq!(settings.watch.concurrency, 1);
  }

  #[test]
  fn file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("licita.toml");
    std::fs::write(
      &path,
      r#"
output_dir = "/srv/licita"
dedup = true
merge_fields = ["enlace"]

[watch]
timeout_secs = 5
concurrency = 4
"#,
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.output_dir, PathBuf::from("/srv/licita"));
    assert!(settings.dedup);
    assert_eq!(settings.merge_options().merge_fields, vec!["enlace"]);
    assert_eq!(settings.watch.watch_options(), WatchOptions {
      timeout:     Duration::from_secs(5),
      concurrency: 4,
    });
    assert_eq!(settings.input_dir, PathBuf::from("./datos"));
    assert!(settings.watch.user_agent.starts_with("licita/"));
  }
}
