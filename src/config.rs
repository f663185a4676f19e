use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;

/// Application configuration loaded from TOML config file.
/// All fields have sensible defaults — the config file is optional.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the three CSV files (used when no CLI override).
    pub data_dir: Option<PathBuf>,
    /// Explicit path to the setlist+audio-feature merged CSV.
    pub setlist_csv: Option<PathBuf>,
    /// Explicit path to the venue coordinates CSV.
    pub venues_csv: Option<PathBuf>,
    /// Explicit path to the full-discography CSV.
    pub discography_csv: Option<PathBuf>,
    /// Directory where rendered SVG charts are written.
    pub out_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Load config from `~/.config/erascope/config.toml`.
    /// Returns default config if file doesn't exist.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        match config_path {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Resolve the three CSV paths: explicit per-file config entries win,
    /// otherwise well-known filenames under the data directory.
    pub fn resolve_csv_paths(&self, data_dir_override: Option<&PathBuf>) -> CsvPaths {
        let data_dir = data_dir_override
            .cloned()
            .or_else(|| self.data_dir.clone())
            .unwrap_or_else(|| PathBuf::from("data"));

        CsvPaths {
            setlist: self
                .setlist_csv
                .clone()
                .unwrap_or_else(|| data_dir.join("setlist_audio_features.csv")),
            venues: self
                .venues_csv
                .clone()
                .unwrap_or_else(|| data_dir.join("venue_coordinates.csv")),
            discography: self
                .discography_csv
                .clone()
                .unwrap_or_else(|| data_dir.join("discography.csv")),
        }
    }

    /// Resolve the chart output directory: CLI > config > current dir.
    pub fn resolve_out_dir(&self, out_override: Option<&PathBuf>) -> PathBuf {
        out_override
            .cloned()
            .or_else(|| self.out_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

/// Resolved locations of the three data sources.
#[derive(Debug, Clone)]
pub struct CsvPaths {
    pub setlist: PathBuf,
    pub venues: PathBuf,
    pub discography: PathBuf,
}
