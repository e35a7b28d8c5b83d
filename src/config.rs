// ⚙️ Config - settings shared by the CLI and server binaries
//
// Load order: defaults -> TOML file -> FARM_EQUIPMENT_* env overrides

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DB_PATH_ENV: &str = "FARM_EQUIPMENT_DB";
pub const BIND_ADDR_ENV: &str = "FARM_EQUIPMENT_BIND";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// SQLite database file; absent means an in-memory registry
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    /// Listen address for the HTTP server
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Default tracing filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: None,
            bind_addr: default_bind_addr(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).context("Failed to parse config")
    }

    /// Read `path` if given (defaults otherwise), then apply env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                Self::from_toml_str(&raw)
                    .with_context(|| format!("Invalid config {}", path.display()))?
            }
            None => Config::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db_path) = lookup(DB_PATH_ENV).filter(|v| !v.is_empty()) {
            self.db_path = Some(PathBuf::from(db_path));
        }
        if let Some(bind_addr) = lookup(BIND_ADDR_ENV).filter(|v| !v.is_empty()) {
            self.bind_addr = bind_addr;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.db_path.is_none());
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_parse_full_file() {
        let config = Config::from_toml_str(
            r#"
db_path = "/var/lib/farm/equipment.db"
bind_addr = "127.0.0.1:8080"
log_level = "debug"
"#,
        )
        .unwrap();

        assert_eq!(config.db_path, Some(PathBuf::from("/var/lib/farm/equipment.db")));
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(Config::from_toml_str("database = \"x.db\"").is_err());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config::from_toml_str("bind_addr = \"127.0.0.1:8080\"").unwrap();

        config.apply_overrides(|key| match key {
            DB_PATH_ENV => Some("/tmp/equipment.db".to_string()),
            BIND_ADDR_ENV => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/equipment.db")));
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("farm.toml");
        std::fs::write(&path, "log_level = \"warn\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.log_level, "warn");
    }
}
