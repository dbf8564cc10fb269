//! Configuration file handling for repofan

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::target::Target;

/// Location type assumed when a repository entry does not name one
pub const LOCAL_LOCATION_TYPE: &str = "local";

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No config file found in current directory or its parents: {0}")]
    ConfigNotFound(PathBuf),
    #[error("Unable to read config file {path}: {source}")]
    Read {
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("Unknown working directory: {0}")]
    UnknownWorkingDirectory(String),
    #[error("Unable to parse YAML config file {path}: {source}")]
    Yaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("Unable to parse JSON config file {path}: {source}")]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("Duplicate repository name found: {0}")]
    DuplicateName(String),
    #[error("Invalid config: {0}")]
    Validation(String),
}

/// Configuration for a single repository entry
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConfigRepository {
    pub name: String,
    pub location: PathBuf,
    #[serde(rename = "locationtype")]
    pub location_type: Option<String>,
}

impl ConfigRepository {
    /// Convert into a [`Target`], resolving a relative local location against `base`.
    #[must_use]
    pub fn into_target(self, base: &Path) -> Target {
        let location_type = self
            .location_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| LOCAL_LOCATION_TYPE.to_string());
        let is_local = location_type == LOCAL_LOCATION_TYPE;
        let working_directory = if is_local && self.location.is_relative() {
            base.join(self.location)
        } else {
            self.location
        };
        Target {
            name: self.name,
            working_directory,
            location_type,
            is_local,
        }
    }
}

/// Root configuration structure for repofan
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub repositories: Vec<ConfigRepository>,
}

/// List of supported configuration file names
const FILENAMES: [&str; 3] = [".repofan.yaml", ".repofan.yml", ".repofan.json"];

impl Config {
    /// Loads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read, or
    /// `ConfigError::Yaml`/`ConfigError::Json` if parsing fails.
    pub fn from_file(file: &Path) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(file).map_err(|e| ConfigError::Read {
            source: e,
            path: file.to_path_buf(),
        })?;
        let config: Config = if file.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents).map_err(|e| ConfigError::Json {
                source: e,
                path: file.to_path_buf(),
            })?
        } else {
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Yaml {
                source: e,
                path: file.to_path_buf(),
            })?
        };
        debug!(
            "Parsed {} repositories from {}",
            config.repositories.len(),
            file.display()
        );
        Ok(config)
    }

    /// Convert every repository entry into a [`Target`], in file order.
    #[must_use]
    pub fn into_targets(self, base: &Path) -> Vec<Target> {
        self.repositories
            .into_iter()
            .map(|repo| repo.into_target(base))
            .collect()
    }

    /// Searches for a configuration file in the current directory and its parents.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownWorkingDirectory` if the cwd cannot be determined,
    /// or `ConfigError::ConfigNotFound` if no config file is found.
    pub fn find_config() -> Result<PathBuf, ConfigError> {
        let cwd = std::env::current_dir()
            .map_err(|e| ConfigError::UnknownWorkingDirectory(e.to_string()))?;
        Self::find_config_from(&cwd)
    }

    /// Searches for a configuration file in `start` and its parents.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if no config file is found.
    pub fn find_config_from(start: &Path) -> Result<PathBuf, ConfigError> {
        let mut path = start.to_path_buf();
        debug!("Searching for config file in {}", start.display());
        loop {
            for file in &FILENAMES {
                let config_path = path.join(file);
                if config_path.exists() {
                    info!("Found config file: {}", config_path.display());
                    return Ok(config_path);
                }
            }
            if !path.pop() {
                return Err(ConfigError::ConfigNotFound(start.to_path_buf()));
            }
        }
    }
}
