use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;

const CONFIG_FILE: &str = "cricket";
const ENV_PREFIX: &str = "CRICKET";

/// Where raw documents, the CSV artifact and the SQLite store live.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub csv_path: PathBuf,
    pub db_path: PathBuf,
    /// Raw document suffix, without the dot.
    pub file_suffix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("cricsheet_data"),
            csv_path: PathBuf::from("processed_matches.csv"),
            db_path: PathBuf::from("cricket_analytics.db"),
            file_suffix: "json".to_string(),
        }
    }
}

impl Settings {
    /// Defaults, then `cricket.toml` if present, then `CRICKET_*` env vars.
    pub fn load() -> Result<Self> {
        let defaults = Settings::default();
        let settings = Config::builder()
            .set_default("data_dir", defaults.data_dir.to_string_lossy().into_owned())?
            .set_default("csv_path", defaults.csv_path.to_string_lossy().into_owned())?
            .set_default("db_path", defaults.db_path.to_string_lossy().into_owned())?
            .set_default("file_suffix", defaults.file_suffix.as_str())?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn with_overrides(mut self, data_dir: Option<PathBuf>, db_path: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(db) = db_path {
            self.db_path = db;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_given_paths() {
        let s = Settings::default().with_overrides(Some(PathBuf::from("raw")), None);
        assert_eq!(s.data_dir, PathBuf::from("raw"));
        assert_eq!(s.db_path, PathBuf::from("cricket_analytics.db"));
        assert_eq!(s.file_suffix, "json");
    }

    #[test]
    fn load_falls_back_to_defaults() {
        let s = Settings::load().unwrap();
        let defaults = Settings::default();
        assert_eq!(s.csv_path, defaults.csv_path);
        assert_eq!(s.file_suffix, defaults.file_suffix);
    }
}
