//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a filter directive.
pub const LOG_FILTER_ENV: &str = "SHEETSYNC_LOG";

/// Default filter when nothing else is configured.
const DEFAULT_FILTER: &str = "sheetsync=info";
/// Filter used with `--verbose`.
const VERBOSE_FILTER: &str = "sheetsync=debug";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    /// Parses a format name; unknown names yield `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Line format.
    pub format: LogFormat,
    /// Event filter.
    pub filter: EnvFilter,
    /// Optional log file; stderr otherwise.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Builds the logging config from file settings and the environment.
    ///
    /// Filter precedence: `SHEETSYNC_LOG`, `RUST_LOG`, `--verbose`, the
    /// config file, then the default.
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        let format = settings
            .and_then(|s| s.format.as_deref())
            .and_then(|name| {
                let parsed = LogFormat::parse(name);
                if parsed.is_none() {
                    tracing::warn!(format = name, "Unknown log format, using pretty");
                }
                parsed
            })
            .unwrap_or_default();

        let directive = std::env::var(LOG_FILTER_ENV)
            .ok()
            .or_else(|| std::env::var(EnvFilter::DEFAULT_ENV).ok())
            .or_else(|| verbose.then(|| VERBOSE_FILTER.to_string()))
            .or_else(|| settings.and_then(|s| s.filter.clone()))
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        let filter =
            EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        Self {
            format,
            filter,
            file: settings.and_then(|s| s.file.clone()),
        }
    }
}
