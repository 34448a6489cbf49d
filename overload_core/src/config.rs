//! Configuration file support for Overload.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/overload/config.toml`.

use crate::{build_default_catalog, Catalog, Error, ExerciseDefinition, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub sheets: SheetsConfig,

    #[serde(default)]
    pub goals: GoalsConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Which store backs the tracker
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// JSONL log and JSON values under the data directory
    #[default]
    Local,
    /// Google Sheets read API plus an Apps Script write endpoint
    Sheets,
    /// Nothing is persisted
    Memory,
}

impl std::str::FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Backend::Local),
            "sheets" => Ok(Backend::Sheets),
            "memory" => Ok(Backend::Memory),
            other => Err(Error::Config(format!("Unknown backend: {}", other))),
        }
    }
}

/// Persistence behaviour
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct SyncConfig {
    #[serde(default)]
    pub backend: Backend,

    /// Write each progression to the store immediately instead of only at
    /// the end of the workout
    #[serde(default)]
    pub save_on_progression: bool,
}

/// Remote spreadsheet settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SheetsConfig {
    #[serde(default)]
    pub sheet_id: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_sheets_api")]
    pub sheets_api: String,

    /// Apps Script web app that performs writes
    #[serde(default)]
    pub script_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            sheet_id: String::new(),
            api_key: String::new(),
            sheets_api: default_sheets_api(),
            script_url: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SheetsConfig {
    /// Check that every field the HTTP gateway needs is filled in
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("sheet_id", &self.sheet_id),
            ("api_key", &self.api_key),
            ("sheets_api", &self.sheets_api),
            ("script_url", &self.script_url),
        ]
        .iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| *k)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "[sheets] is missing: {}",
                missing.join(", ")
            )))
        }
    }
}

/// Dashboard goals
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GoalsConfig {
    #[serde(default = "default_weekly_goal")]
    pub weekly_goal: u32,
}

impl Default for GoalsConfig {
    fn default() -> Self {
        Self {
            weekly_goal: default_weekly_goal(),
        }
    }
}

/// Optional replacement for the built-in exercise list
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub exercises: Vec<ExerciseDefinition>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    base.join("overload")
}

fn default_sheets_api() -> String {
    "https://sheets.googleapis.com/v4/spreadsheets".into()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_weekly_goal() -> u32 {
    3
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        base.join("overload").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// The workout catalog: the configured override if any, else the default
    ///
    /// An override that fails validation is rejected as a whole.
    pub fn catalog(&self) -> Result<Catalog> {
        let catalog = if self.catalog.exercises.is_empty() {
            build_default_catalog()
        } else {
            Catalog {
                exercises: self.catalog.exercises.clone(),
            }
        };

        let errors = catalog.validate();
        if !errors.is_empty() {
            return Err(Error::CatalogValidation(errors.join("; ")));
        }
        Ok(catalog)
    }
}
