// ⚙️ Configuration - database location, bind address, CORS origins
//
// Precedence: defaults < TOML file < environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const ENV_DB_PATH: &str = "CATALOG_DB_PATH";
pub const ENV_PORT: &str = "PORT";
pub const ENV_ALLOWED_ORIGINS: &str = "ALLOWED_ORIGINS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite catalog file
    pub db_path: PathBuf,

    /// Address the HTTP server listens on
    pub bind_addr: String,

    /// Origins allowed by CORS
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from("catalog.db"),
            bind_addr: "0.0.0.0:3001".to_string(),
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}

impl Config {
    /// Load from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// TOML file only, no environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config TOML")
    }

    /// Override fields from `lookup` (normally `std::env::var`)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DB_PATH).filter(|v| !v.is_empty()) {
            self.db_path = PathBuf::from(path);
        }

        if let Some(port) = lookup(ENV_PORT).filter(|v| !v.is_empty()) {
            self.bind_addr = format!("0.0.0.0:{}", port.trim());
        }

        if let Some(origins) = lookup(ENV_ALLOWED_ORIGINS) {
            let origins: Vec<String> = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
            if !origins.is_empty() {
                self.allowed_origins = origins;
            }
        }
    }
}
