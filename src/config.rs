// ⚙️ Import Configuration - JSON file with serde defaults

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Env var pointing at the config file
pub const CONFIG_ENV_VAR: &str = "FLEET_IMPORT_CONFIG";

/// Looked up in the working directory when the env var isn't set
pub const DEFAULT_CONFIG_FILE: &str = "fleet-import.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// SQLite file receiving committed trips
    pub database_path: PathBuf,

    pub vehicles_path: PathBuf,
    pub drivers_path: PathBuf,
    pub rules_path: PathBuf,

    /// Default for the "first line is a header" toggle
    pub has_header: bool,

    /// Actor recorded on audit events
    pub actor: String,

    pub server_addr: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        ImportConfig {
            database_path: PathBuf::from("fleet.db"),
            vehicles_path: PathBuf::from("data/vehicles.csv"),
            drivers_path: PathBuf::from("data/drivers.csv"),
            rules_path: PathBuf::from("data/commission_rules.csv"),
            has_header: false,
            actor: "bulk_import".to_string(),
            server_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl ImportConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// $FLEET_IMPORT_CONFIG, then ./fleet-import.json, then defaults
    pub fn load() -> Result<Self> {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            info!("Loading config from {} (${})", path, CONFIG_ENV_VAR);
            return Self::from_file(path);
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            info!("Loading config from {}", local.display());
            return Self::from_file(local);
        }

        Ok(Self::default())
    }
}
