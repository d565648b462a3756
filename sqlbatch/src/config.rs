//! Configuration handling for sqlbatch

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default TDS port
pub const DEFAULT_PORT: u16 = 1433;

/// Default per-round-trip request timeout
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Load configuration from a TOML file
pub fn load_from_file(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?;

    config.validate()?;
    Ok(config)
}

/// Represents the complete sqlbatch configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub apply: ApplyConfig,
    #[serde(default)]
    pub query: QueryConfig,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    /// Build a configuration from `DB_SERVER`, `DB_NAME`, `DB_USER` and `DB_PASSWORD`.
    ///
    /// `DB_PORT`, `DB_TRUST_SERVER_CERTIFICATE` and `DB_TIMEOUT_SECONDS` are optional.
    pub fn from_env() -> Result<Self> {
        let port = optional_var("DB_PORT")
            .map(|v| {
                v.parse::<u16>()
                    .map_err(|e| Error::ConfigError(format!("Invalid DB_PORT '{}': {}", v, e)))
            })
            .transpose()?;

        let trust_server_certificate = optional_var("DB_TRUST_SERVER_CERTIFICATE")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"));

        let timeout_seconds = optional_var("DB_TIMEOUT_SECONDS")
            .map(|v| {
                v.parse::<u64>().map_err(|e| {
                    Error::ConfigError(format!("Invalid DB_TIMEOUT_SECONDS '{}': {}", v, e))
                })
            })
            .transpose()?;

        let config = Config {
            database: DatabaseConfig {
                server: required_var("DB_SERVER")?,
                port,
                database: required_var("DB_NAME")?,
                user: required_var("DB_USER")?,
                password: required_var("DB_PASSWORD")?,
                trust_server_certificate,
                timeout_seconds,
            },
            apply: ApplyConfig::default(),
            query: QueryConfig::default(),
            logging: None,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check that the connection section names a server, database and login
    pub fn validate(&self) -> Result<()> {
        let db = &self.database;
        for (field, value) in [
            ("server", &db.server),
            ("database", &db.database),
            ("user", &db.user),
        ] {
            if value.trim().is_empty() {
                return Err(Error::ConfigError(format!(
                    "database.{} must not be empty",
                    field
                )));
            }
        }

        if db.timeout_seconds == Some(0) {
            return Err(Error::ConfigError(
                "database.timeout_seconds must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn required_var(name: &str) -> Result<String> {
    optional_var(name)
        .ok_or_else(|| Error::ConfigError(format!("Missing required environment variable: {}", name)))
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Database connection configuration
///
/// Transport encryption is always required; it is not configurable.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub server: String,
    pub port: Option<u16>,
    pub database: String,
    pub user: String,
    pub password: String,
    pub trust_server_certificate: Option<bool>,
    pub timeout_seconds: Option<u64>,
}

impl DatabaseConfig {
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    pub fn trust_server_certificate(&self) -> bool {
        self.trust_server_certificate.unwrap_or(false)
    }
}

/// Schema application settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApplyConfig {
    #[serde(default = "default_true")]
    pub use_transaction: bool,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            use_transaction: true,
        }
    }
}

/// Ad-hoc query settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct QueryConfig {
    #[serde(default)]
    pub read_only: bool,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: String,
    pub stdout: bool,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const FULL_CONFIG: &str = r#"
        [database]
        server = "db.example.internal"
        port = 14330
        database = "TaskMaster"
        user = "deploy"
        password = "hunter2"
        trust_server_certificate = true
        timeout_seconds = 10

        [apply]
        use_transaction = false

        [query]
        read_only = true

        [logging]
        level = "debug"
        format = "json"
        stdout = false
    "#;

    #[test]
    fn parses_full_config() {
        let config: Config = toml::from_str(FULL_CONFIG).unwrap();

        assert_eq!(config.database.server, "db.example.internal");
        assert_eq!(config.database.port(), 14330);
        assert_eq!(config.database.request_timeout(), Duration::from_secs(10));
        assert!(config.database.trust_server_certificate());
        assert!(!config.apply.use_transaction);
        assert!(config.query.read_only);
        assert_eq!(config.logging.unwrap().format, "json");
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [database]
            server = "localhost"
            database = "master"
            user = "sa"
            password = ""
            "#,
        )
        .unwrap();

        assert_eq!(config.database.port(), DEFAULT_PORT);
        assert_eq!(
            config.database.request_timeout(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)
        );
        assert!(!config.database.trust_server_certificate());
        assert!(config.apply.use_transaction);
        assert!(!config.query.read_only);
        assert!(config.logging.is_none());
    }

    #[test]
    fn load_from_file_rejects_blank_server() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "[database]\nserver = \"  \"\ndatabase = \"db\"\nuser = \"u\"\npassword = \"p\"\n"
        )
        .unwrap();

        let err = load_from_file(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::ConfigError(msg) if msg.contains("database.server")));
    }

    #[test]
    fn load_from_file_reports_missing_file() {
        let err = load_from_file("/nonexistent/sqlbatch.toml").unwrap_err();
        assert!(matches!(err, Error::ConfigError(msg) if msg.starts_with("Failed to read")));
    }
}
