//! Configuration management for query-gate.
//!
//! Handles loading configuration from a TOML file and environment variables.
//! Configuration is read once at startup and shared read-only afterwards.

use crate::db::DatabaseBackend;
use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Environment variable holding the database address.
pub const ENV_DSN: &str = "DB_DSN";
/// Environment variable holding the database user.
pub const ENV_USER: &str = "DB_USER";
/// Environment variable holding the database password.
pub const ENV_PASSWORD: &str = "DB_PASSWORD";
/// Environment variable selecting the backend explicitly.
pub const ENV_BACKEND: &str = "DB_BACKEND";

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database connection settings.
    #[serde(default)]
    pub database: ConnectionConfig,

    /// Log file settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Append LIMIT/OFFSET to every query and echo the window back.
    #[serde(default)]
    pub paginate: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            paginate: false,
        }
    }
}

/// Rotating log file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Path of the active log file.
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// Size at which the active file is rotated.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Number of rotated files kept next to the active one.
    #[serde(default = "default_backups")]
    pub backups: usize,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("app.log")
}

fn default_max_bytes() -> u64 {
    1024 * 1000
}

fn default_backups() -> usize {
    1
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            max_bytes: default_max_bytes(),
            backups: default_backups(),
        }
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Backend; inferred from the DSN when absent.
    pub backend: Option<DatabaseBackend>,

    /// Database address: a URL or a bare `host[:port]/database`.
    pub dsn: Option<String>,

    /// Database user.
    pub user: Option<String>,

    /// Database password (prefer the environment over the config file).
    pub password: Option<String>,

    /// Seconds to wait for a connection to be established.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Seconds a single statement may run.
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_query_timeout() -> u64 {
    30
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            backend: None,
            dsn: None,
            user: None,
            password: None,
            connect_timeout_secs: default_connect_timeout(),
            query_timeout_secs: default_query_timeout(),
        }
    }
}

impl ConnectionConfig {
    /// Creates a config pointing at the given DSN with default timeouts.
    pub fn from_dsn(dsn: impl Into<String>) -> Self {
        Self {
            dsn: Some(dsn.into()),
            ..Default::default()
        }
    }

    /// Overrides fields with `DB_DSN`, `DB_USER`, `DB_PASSWORD`, `DB_BACKEND`.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Overrides fields from an arbitrary variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dsn) = lookup(ENV_DSN) {
            self.dsn = Some(dsn);
        }
        if let Some(user) = lookup(ENV_USER) {
            self.user = Some(user);
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            self.password = Some(password);
        }
        if let Some(backend) = lookup(ENV_BACKEND) {
            let parsed = DatabaseBackend::parse(&backend).ok_or_else(|| {
                GateError::config(format!("Unknown {ENV_BACKEND} value '{backend}'"))
            })?;
            self.backend = Some(parsed);
        }
        Ok(())
    }

    /// Returns the configured backend, inferring it from the DSN scheme.
    pub fn resolved_backend(&self) -> DatabaseBackend {
        if let Some(backend) = self.backend {
            return backend;
        }
        match self.dsn.as_deref() {
            Some(dsn) if dsn.starts_with("sqlite:") => DatabaseBackend::Sqlite,
            _ => DatabaseBackend::Postgres,
        }
    }

    /// Builds the driver connection string, filling in credentials.
    pub fn to_connection_string(&self) -> Result<String> {
        let dsn = self
            .dsn
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| GateError::config(format!("Database DSN is required (set {ENV_DSN})")))?;

        match self.resolved_backend() {
            DatabaseBackend::Sqlite => {
                if dsn.starts_with("sqlite:") {
                    Ok(dsn.to_string())
                } else {
                    Ok(format!("sqlite:{dsn}"))
                }
            }
            DatabaseBackend::Postgres => {
                let mut url = self.postgres_url(dsn)?;
                if url.username().is_empty() {
                    if let Some(user) = &self.user {
                        url.set_username(user)
                            .map_err(|_| GateError::config("Cannot set user on DSN"))?;
                    }
                }
                if url.password().is_none() {
                    if let Some(password) = &self.password {
                        url.set_password(Some(password))
                            .map_err(|_| GateError::config("Cannot set password on DSN"))?;
                    }
                }
                Ok(url.to_string())
            }
        }
    }

    fn postgres_url(&self, dsn: &str) -> Result<Url> {
        let raw = if dsn.contains("://") {
            dsn.to_string()
        } else {
            format!("postgres://{dsn}")
        };

        let url =
            Url::parse(&raw).map_err(|e| GateError::config(format!("Invalid DSN: {e}")))?;

        if url.scheme() != "postgres" && url.scheme() != "postgresql" {
            return Err(GateError::config(format!(
                "Invalid scheme '{}'. Expected 'postgres' or 'postgresql'",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(GateError::config("DSN must include a host"));
        }

        Ok(url)
    }

    /// Returns a display-safe string (no password) for logs.
    pub fn display_string(&self) -> String {
        let Some(dsn) = self.dsn.as_deref() else {
            return "<no dsn>".to_string();
        };
        match self.resolved_backend() {
            DatabaseBackend::Sqlite => dsn.to_string(),
            DatabaseBackend::Postgres => match self.postgres_url(dsn) {
                Ok(mut url) => {
                    let _ = url.set_password(None);
                    if url.username().is_empty() {
                        if let Some(user) = &self.user {
                            let _ = url.set_username(user);
                        }
                    }
                    url.to_string()
                }
                Err(_) => "<invalid dsn>".to_string(),
            },
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("query-gate")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| GateError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            GateError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }
}
