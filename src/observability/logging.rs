//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;

/// Default filter when neither config nor environment sets one.
const DEFAULT_FILTER: &str = "crmcheck=info,warn";

/// Filter used when verbose output is requested.
const VERBOSE_FILTER: &str = "crmcheck=debug,info";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name, falling back to `Pretty`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Resolved logging configuration.
///
/// # Environment Variables
///
/// | Variable | Description |
/// |----------|-------------|
/// | `CRMCHECK_LOG` | Filter directives (`RUST_LOG` syntax) |
/// | `CRMCHECK_LOG_FORMAT` | `pretty` or `json` |
/// | `CRMCHECK_LOG_FILE` | Append to this file instead of stderr |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Filter directives.
    pub filter: String,
    /// Optional log file.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: DEFAULT_FILTER.to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Builds a logging config from file settings, with env overrides.
    ///
    /// `verbose` raises the default filter to debug but does not override an
    /// explicitly configured filter.
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        let mut config = Self::default();
        if verbose {
            config.filter = VERBOSE_FILTER.to_string();
        }

        if let Some(settings) = settings {
            if let Some(ref format) = settings.format {
                config.format = LogFormat::parse(format);
            }
            if let Some(ref filter) = settings.filter {
                config.filter.clone_from(filter);
            }
            if let Some(ref file) = settings.file {
                config.file = Some(file.clone());
            }
        }

        if let Ok(format) = std::env::var("CRMCHECK_LOG_FORMAT") {
            config.format = LogFormat::parse(&format);
        }
        if let Ok(filter) = std::env::var("CRMCHECK_LOG") {
            if !filter.trim().is_empty() {
                config.filter = filter;
            }
        }
        if let Ok(file) = std::env::var("CRMCHECK_LOG_FILE") {
            if !file.trim().is_empty() {
                config.file = Some(PathBuf::from(file));
            }
        }

        config
    }
}
