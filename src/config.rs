use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::dedup::BestResultPolicy;
use crate::error::ConfigError;

pub const DEFAULT_CONFIG_FILE: &str = "skillquest.toml";
pub const DATA_DIR_ENV: &str = "SKILLQUEST_DATA_DIR";

/// Export dates of the SkillQuest files shipped with the dashboard.
const EXPORT_DATES: [&str; 32] = [
    "2025-10-06",
    "2025-10-08",
    "2025-10-14",
    "2025-10-24",
    "2025-11-03",
    "2025-11-04",
    "2025-11-05",
    "2025-11-17",
    "2025-11-25",
    "2025-11-28",
    "2025-12-08",
    "2025-12-09",
    "2025-12-10",
    "2025-12-12",
    "2025-12-15",
    "2025-12-16",
    "2025-12-17",
    "2025-12-19",
    "2026-01-05",
    "2026-01-06",
    "2026-01-13",
    "2026-01-19",
    "2026-01-20",
    "2026-01-21",
    "2026-01-23",
    "2026-01-26",
    "2026-02-03",
    "2026-02-09",
    "2026-02-10",
    "2026-02-16",
    "2026-02-17",
    "2026-02-18",
];

pub fn default_file_names() -> Vec<String> {
    EXPORT_DATES
        .iter()
        .map(|date| format!("xp_SkillQuest_{date}.xlsx"))
        .collect()
}

/// Header names of the export columns.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnNames {
    pub student: String,
    pub skill: String,
    pub date: String,
    pub time: String,
    pub outcome: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            student: "Mail".to_string(),
            skill: "Compétence".to_string(),
            date: "Date".to_string(),
            time: "Heure".to_string(),
            outcome: "xp".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub data_dir: PathBuf,
    pub files: Vec<String>,
    pub columns: ColumnNames,
    pub date_formats: Vec<String>,
    pub time_formats: Vec<String>,
    pub best_result_policy: BestResultPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("."),
            files: default_file_names(),
            columns: ColumnNames::default(),
            date_formats: vec!["%Y-%m-%d".to_string(), "%d/%m/%Y".to_string()],
            time_formats: vec![
                "%H:%M:%S".to_string(),
                "%H:%M:%S%.f".to_string(),
                "%H:%M".to_string(),
            ],
            best_result_policy: BestResultPolicy::default(),
        }
    }
}

impl Config {
    /// Reads the given config file, or `skillquest.toml` when present, and
    /// applies the data directory environment override.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                debug!("no config file, using defaults");
                Config::default()
            }
        };

        Ok(config.with_data_dir_override(std::env::var(DATA_DIR_ENV).ok()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn with_data_dir_override(mut self, data_dir: Option<String>) -> Self {
        if let Some(dir) = data_dir.filter(|dir| !dir.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        self
    }

    /// Input paths in configured order, resolved against the data directory.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .map(|name| self.data_dir.join(name))
            .collect()
    }
}
