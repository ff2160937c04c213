//! Configuration management.
//!
//! # Sources
//!
//! 1. `--config <path>` on the command line
//! 2. `SHEETSYNC_CONFIG_PATH`
//! 3. `<platform config dir>/sheetsync/config.toml`
//! 4. Built-in defaults
//!
//! `SHEETSYNC_WRITE_BACK_SCOPE` and `SHEETSYNC_PATH_ROOT` override the loaded
//! values.
//!
//! ```toml
//! write_back_scope = "root_only"
//! save_on_import = false
//! path_root = "/Game/Data"
//!
//! [logging]
//! format = "json"
//! filter = "sheetsync=debug"
//! file = "/tmp/sheetsync.log"
//! ```

use crate::services::PathPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "SHEETSYNC_CONFIG_PATH";
/// Environment variable overriding the write-back scope.
pub const WRITE_BACK_SCOPE_ENV: &str = "SHEETSYNC_WRITE_BACK_SCOPE";
/// Environment variable overriding the path policy root.
pub const PATH_ROOT_ENV: &str = "SHEETSYNC_PATH_ROOT";

/// Which columns an import writes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteBackScope {
    /// Only leaf columns of the root object.
    RootOnly,
    /// Root leaves plus everything reached through expand fields.
    #[default]
    RootAndExpanded,
}

impl WriteBackScope {
    /// Parses a scope name (`root_only`, `root-and-expanded`, ...).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "root_only" | "root" => Some(Self::RootOnly),
            "root_and_expanded" | "expanded" | "all" => Some(Self::RootAndExpanded),
            _ => None,
        }
    }

    /// Canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RootOnly => "root_only",
            Self::RootAndExpanded => "root_and_expanded",
        }
    }
}

impl fmt::Display for WriteBackScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Logging section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingSettings {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// `EnvFilter` directive.
    pub filter: Option<String>,
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Write-back scope name.
    pub write_back_scope: Option<String>,
    /// Whether imports persist their target.
    pub save_on_import: Option<bool>,
    /// Root that created records must live under.
    pub path_root: Option<String>,
    /// Logging settings.
    pub logging: Option<LoggingSettings>,
}

/// Main configuration for sheetsync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Write-back scope for imports.
    pub write_back_scope: WriteBackScope,
    /// Where imports may create records.
    pub path_policy: PathPolicy,
    /// Whether imports persist their target.
    pub save_on_import: bool,
    /// Logging settings.
    pub logging: LoggingSettings,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            write_back_scope: WriteBackScope::default(),
            path_policy: PathPolicy::default(),
            save_on_import: true,
            logging: LoggingSettings::default(),
        }
    }
}

impl SyncConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or holds an
    /// unknown scope name.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Self::from_config_file(file)
    }

    /// Loads configuration from `SHEETSYNC_CONFIG_PATH` or the platform
    /// config directory.
    ///
    /// Returns default configuration if no config file is found or the file
    /// found does not load.
    #[must_use]
    pub fn load_default() -> Self {
        let candidate = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .or_else(|| {
                directories::ProjectDirs::from("", "", "sheetsync")
                    .map(|dirs| dirs.config_dir().join("config.toml"))
            });

        match candidate {
            Some(path) if path.exists() => Self::load_from_file(&path).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    /// Converts a `ConfigFile` to `SyncConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(scope) = file.write_back_scope {
            config.write_back_scope = WriteBackScope::parse(&scope).ok_or_else(|| {
                Error::InvalidInput(format!("unknown write_back_scope '{scope}'"))
            })?;
        }
        if let Some(save) = file.save_on_import {
            config.save_on_import = save;
        }
        if let Some(root) = file.path_root {
            config.path_policy = PathPolicy::new(root)?;
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }

        Ok(config)
    }

    /// Applies `SHEETSYNC_*` environment overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`; invalid values are logged and ignored.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(WRITE_BACK_SCOPE_ENV) {
            match WriteBackScope::parse(&value) {
                Some(scope) => self.write_back_scope = scope,
                None => tracing::warn!(value = %value, "Ignoring unknown {WRITE_BACK_SCOPE_ENV}"),
            }
        }
        if let Some(value) = lookup(PATH_ROOT_ENV) {
            match PathPolicy::new(&value) {
                Ok(policy) => self.path_policy = policy,
                Err(e) => tracing::warn!(value = %value, error = %e, "Ignoring invalid {PATH_ROOT_ENV}"),
            }
        }
        self
    }

    /// Sets the write-back scope.
    #[must_use]
    pub const fn with_scope(mut self, scope: WriteBackScope) -> Self {
        self.write_back_scope = scope;
        self
    }

    /// Sets whether imports persist their target.
    #[must_use]
    pub const fn with_save_on_import(mut self, save: bool) -> Self {
        self.save_on_import = save;
        self
    }

    /// Sets the path policy.
    #[must_use]
    pub fn with_path_policy(mut self, policy: PathPolicy) -> Self {
        self.path_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    #[test_case("root_only", Some(WriteBackScope::RootOnly) ; "snake")]
    #[test_case("Root-And-Expanded", Some(WriteBackScope::RootAndExpanded) ; "kebab mixed case")]
    #[test_case("everything", None ; "unknown")]
    fn test_scope_parse(input: &str, expected: Option<WriteBackScope>) {
        assert_eq!(WriteBackScope::parse(input), expected);
    }

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.write_back_scope, WriteBackScope::RootAndExpanded);
        assert!(config.save_on_import);
        assert_eq!(config.path_policy.root(), "/Game");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            write_back_scope = "root_only"
            save_on_import = false
            path_root = "/Game/Data"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        let config = SyncConfig::load_from_file(&path).unwrap();
        assert_eq!(config.write_back_scope, WriteBackScope::RootOnly);
        assert!(!config.save_on_import);
        assert_eq!(config.path_policy.root(), "/Game/Data");
        assert_eq!(config.logging.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_unknown_scope_in_file() {
        let file = ConfigFile {
            write_back_scope: Some("sideways".to_string()),
            ..ConfigFile::default()
        };
        assert!(matches!(
            SyncConfig::from_config_file(file),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (WRITE_BACK_SCOPE_ENV, "root_only"),
            (PATH_ROOT_ENV, "not-a-root"),
        ]);
        let config = SyncConfig::default()
            .with_overrides(|key| env.get(key).map(|v| (*v).to_string()));
        assert_eq!(config.write_back_scope, WriteBackScope::RootOnly);
        // Invalid root is ignored.
        assert_eq!(config.path_policy.root(), "/Game");
    }
}
