use std::path::PathBuf;

/// One configured working directory eligible for command execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    /// Absolute for local targets; verbatim from the config otherwise
    pub working_directory: PathBuf,
    pub location_type: String,
    /// Non-local targets are never invoked, only reported as skipped
    pub is_local: bool,
}

impl Target {
    #[must_use]
    pub fn local(name: impl Into<String>, working_directory: impl Into<PathBuf>) -> Self {
        Target {
            name: name.into(),
            working_directory: working_directory.into(),
            location_type: crate::config_file::LOCAL_LOCATION_TYPE.to_string(),
            is_local: true,
        }
    }

    #[must_use]
    pub fn non_local(
        name: impl Into<String>,
        location: impl Into<PathBuf>,
        location_type: impl Into<String>,
    ) -> Self {
        Target {
            name: name.into(),
            working_directory: location.into(),
            location_type: location_type.into(),
            is_local: false,
        }
    }
}
