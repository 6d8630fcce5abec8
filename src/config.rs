//! Runtime configuration from `MYRTLE_*` environment variables, after
//! loading a `.env` file when one exists.

use std::env;
use std::path::PathBuf;

use crate::data::{DEFAULT_OPERATORS_PATH, DEFAULT_SPECS_PATH};

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_UNPACKER_PYTHON: &str = "python3";
pub const DEFAULT_UNPACKER_SCRIPT: &str = "scripts/ark-unpacker.py";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind: String,
    pub data_dir: PathBuf,
    pub environment: Environment,
    pub unpacker_python: String,
    pub unpacker_script: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            environment: Environment::default(),
            unpacker_python: DEFAULT_UNPACKER_PYTHON.to_string(),
            unpacker_script: PathBuf::from(DEFAULT_UNPACKER_SCRIPT),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("loaded environment from '{}'", path.display());
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or blank keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let environment = match get("MYRTLE_ENV") {
            Some(raw) => Environment::parse(&raw).unwrap_or_else(|| {
                tracing::warn!("unknown MYRTLE_ENV '{raw}', using production");
                Environment::Production
            }),
            None => defaults.environment,
        };

        Self {
            bind: get("MYRTLE_BIND").unwrap_or(defaults.bind),
            data_dir: get("MYRTLE_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            environment,
            unpacker_python: get("MYRTLE_UNPACKER_PYTHON").unwrap_or(defaults.unpacker_python),
            unpacker_script: get("MYRTLE_UNPACKER_SCRIPT")
                .map_or(defaults.unpacker_script, PathBuf::from),
        }
    }

    pub fn operators_path(&self) -> PathBuf {
        self.data_file(DEFAULT_OPERATORS_PATH)
    }

    pub fn specs_path(&self) -> PathBuf {
        self.data_file(DEFAULT_SPECS_PATH)
    }

    /// Re-roots a default `data/...` path under the configured data dir.
    fn data_file(&self, default_path: &str) -> PathBuf {
        let file_name = default_path
            .strip_prefix("data/")
            .unwrap_or(default_path);
        self.data_dir.join(file_name)
    }
}
