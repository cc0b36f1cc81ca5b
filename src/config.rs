//! Centralized configuration management for msupply

use anyhow::{Context, Result};
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "./msupply.db";
const DEFAULT_USER: &str = "admin";
const DEFAULT_LOG_FILE: &str = "msupply.log";
const DEFAULT_PAGE_SIZE: usize = 20;

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Path to the SQLite database file
    pub database_path: PathBuf,
    /// Username of the acting user
    pub username: String,
    /// File the log appender writes to
    pub log_file: PathBuf,
    /// Rows moved by page up / page down
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DB_PATH.into(),
            username: DEFAULT_USER.to_string(),
            log_file: DEFAULT_LOG_FILE.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Config {
            database_path: lookup("MSUPPLY_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            username: lookup("MSUPPLY_USER").unwrap_or(defaults.username),
            log_file: lookup("MSUPPLY_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_file),
            page_size: parse_var("MSUPPLY_PAGE_SIZE", lookup("MSUPPLY_PAGE_SIZE"))?
                .unwrap_or(defaults.page_size),
        })
    }

    /// Command line flags take precedence over the environment
    pub fn with_overrides(mut self, database: Option<&str>, user: Option<&str>) -> Self {
        if let Some(database) = database {
            self.database_path = database.into();
        }
        if let Some(user) = user {
            self.username = user.to_string();
        }
        self
    }

    /// Get database path as string
    pub fn database_path_str(&self) -> &str {
        self.database_path.to_str().unwrap_or(DEFAULT_DB_PATH)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(anyhow::anyhow!(
                    "Database parent directory does not exist: {}",
                    parent.display()
                ));
            }
        }
        if self.username.trim().is_empty() {
            return Err(anyhow::anyhow!("Username must not be empty"));
        }
        if self.page_size == 0 {
            return Err(anyhow::anyhow!("Page size must be at least 1"));
        }
        Ok(())
    }
}

/// Parse an optional environment value as a specific type
fn parse_var<T>(var_name: &str, value: Option<String>) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match value {
        Some(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        None => Ok(None),
    }
}
