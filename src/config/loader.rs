//! Application configuration: key/value settings from code or the environment.

use crate::error::ConfigError;
use std::collections::HashMap;

/// Flat key/value configuration supplied by the host application.
#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn new() -> Self {
        AppConfig {
            values: HashMap::new(),
        }
    }

    /// Snapshot of the process environment, after loading `.env` if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        AppConfig {
            values: std::env::vars().collect(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Connection uri under `key`. Empty values count as missing.
    pub fn require_uri(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingUri { key: key.to_string() })
    }
}

impl From<HashMap<String, String>> for AppConfig {
    fn from(values: HashMap<String, String>) -> Self {
        AppConfig { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_uri_reports_missing_key() {
        let config = AppConfig::new().with("DB_MASTER_URI", "  ");
        match config.require_uri("DB_MASTER_URI") {
            Err(ConfigError::MissingUri { key }) => assert_eq!(key, "DB_MASTER_URI"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(config.require_uri("DB_SLAVE_URI").is_err());
    }

    #[test]
    fn require_uri_trims() {
        let config = AppConfig::new().with("DB_SLAVE_URI", " sqlite://slave.db ");
        assert_eq!(config.require_uri("DB_SLAVE_URI").unwrap(), "sqlite://slave.db");
    }
}
