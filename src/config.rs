//! Configuration module for milou.

use serde::Deserialize;
use std::path::Path;

use crate::{MilouError, Result};

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/milou.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Directory (address resolution) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Domain appended to address tokens that carry no domain separator.
    #[serde(default = "default_domain")]
    pub default_domain: String,
}

fn default_domain() -> String {
    "milou.com".to_string()
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            default_domain: default_domain(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Console-only when unset.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Directory configuration.
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(MilouError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| MilouError::Config(format!("config parse error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.database.path, "data/milou.db");
        assert_eq!(config.directory.default_domain, "milou.com");
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [database]
            path = "/tmp/test.db"

            [directory]
            default_domain = "example.org"

            [logging]
            level = "debug"
            file = "logs/milou.log"
        "#;

        let config = Config::parse(toml).unwrap();
        assert_eq!(config.database.path, "/tmp/test.db");
        assert_eq!(config.directory.default_domain, "example.org");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file.as_deref(), Some("logs/milou.log"));
    }

    #[test]
    fn test_parse_partial_config_uses_defaults() {
        let toml = r#"
            [directory]
            default_domain = "corp.example"
        "#;

        let config = Config::parse(toml).unwrap();
        assert_eq!(config.directory.default_domain, "corp.example");
        assert_eq!(config.database.path, "data/milou.db");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.directory.default_domain, "milou.com");
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = Config::parse("not [valid toml");
        assert!(matches!(result, Err(MilouError::Config(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("/nonexistent/milou.toml").unwrap();
        assert_eq!(config.database.path, "data/milou.db");
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("milou.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "[logging]\nlevel = \"warn\"").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.logging.level, "warn");
    }
}
