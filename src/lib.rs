//! Core implementation of repofan
//!
//! Repofan runs one command across a configured set of directories (usually
//! repository checkouts) and reports every directory's outcome in
//! configuration order, whether the command ran one directory at a time or
//! in parallel.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config_file::{Config, ConfigError};
use crate::target::Target;

pub mod config_file;
pub mod exec;
pub mod logger;
pub mod report;
pub mod selection;
pub mod target;
pub mod theme;

/// Load configuration from a file (or auto-detect), returning the targets and config file path.
///
/// # Errors
///
/// Returns `ConfigError` if the config file is not found, cannot be parsed,
/// or contains duplicate or empty repository names.
pub fn load_config(config_file: Option<&Path>) -> Result<(Vec<Target>, PathBuf), ConfigError> {
    let config_path = match config_file {
        Some(file) => {
            if !file.exists() {
                return Err(ConfigError::ConfigNotFound(file.to_path_buf()));
            }
            file.to_path_buf()
        }
        None => Config::find_config()?,
    };
    let config_path = std::path::absolute(&config_path)
        .map_err(|e| ConfigError::UnknownWorkingDirectory(e.to_string()))?;
    let base = config_path
        .parent()
        .ok_or_else(|| ConfigError::ConfigNotFound(config_path.clone()))?
        .to_path_buf();
    debug!(
        "Loading targets from config file: {} (base: {})",
        config_path.display(),
        base.display()
    );

    let targets = Config::from_file(&config_path)?.into_targets(&base);
    validate_targets(&targets)?;
    Ok((targets, config_path))
}

/// Reject configurations the execution core must never see
fn validate_targets(targets: &[Target]) -> Result<(), ConfigError> {
    if targets.is_empty() {
        warn!("Config defines no repositories");
    }
    let mut seen = HashSet::new();
    for target in targets {
        if target.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Repository at '{}' has an empty name",
                target.working_directory.display()
            )));
        }
        if !seen.insert(target.name.as_str()) {
            return Err(ConfigError::DuplicateName(target.name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_name_detection() {
        let targets = vec![
            Target::local("api", "/a"),
            Target::local("web", "/w"),
            Target::local("api", "/b"),
        ];
        match validate_targets(&targets) {
            Err(ConfigError::DuplicateName(name)) => assert_eq!(name, "api"),
            other => panic!("Expected DuplicateName, got: {other:?}"),
        }
    }

    #[test]
    fn test_empty_name_rejected() {
        let targets = vec![Target::local("  ", "/a")];
        assert!(matches!(
            validate_targets(&targets),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_unique_names_pass() {
        let targets = vec![Target::local("api", "/a"), Target::local("web", "/w")];
        assert!(validate_targets(&targets).is_ok());
    }
}
