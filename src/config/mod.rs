//! Configuration management.
//!
//! Values are layered: built-in defaults, then the TOML config file, then
//! `CRMCHECK_*` environment variables.
//!
//! ```toml
//! [duplicates]
//! endpoint = "https://crm.example.com/api/duplicates/check"
//! debounce_ms = 500
//! timeout_secs = 10
//!
//! [logging]
//! format = "json"
//! filter = "crmcheck=debug"
//! file = "/var/log/crmcheck.log"
//! ```

use crate::services::duplicates::{DuplicateCheckConfig, DuplicateCheckSettings};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration for crmcheck.
#[derive(Debug, Clone, Default)]
pub struct CrmCheckConfig {
    /// Duplicate-check settings.
    pub duplicates: DuplicateCheckConfig,
    /// Logging settings from the config file.
    pub logging: LoggingSettings,
}

/// `[logging]` section of the config file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Output format: `pretty` or `json`.
    pub format: Option<String>,
    /// Filter directives, `RUST_LOG` syntax.
    pub filter: Option<String>,
    /// Append log output to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Duplicate-check section.
    pub duplicates: Option<DuplicateCheckSettings>,
    /// Logging section.
    pub logging: Option<LoggingSettings>,
}

impl CrmCheckConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from an explicit path or the default location,
    /// then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {e}", path.display()),
            })?;

        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the platform config dir (`~/.config/crmcheck/config.toml` on
    /// Linux) and returns defaults if no readable file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(dirs) = directories::ProjectDirs::from("", "", "crmcheck") else {
            return Self::default();
        };

        let path = dirs.config_dir().join("config.toml");
        if path.exists() {
            match Self::load_from_file(&path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                },
            }
        }

        Self::default()
    }

    /// Applies `CRMCHECK_*` environment overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        self.duplicates = self.duplicates.with_env_overrides();
        self
    }

    /// Converts a `ConfigFile` to `CrmCheckConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(duplicates) = file.duplicates {
            config.duplicates = config.duplicates.with_file_settings(&duplicates);
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        config
    }
}
