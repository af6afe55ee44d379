//! Options controlling how bindings are enforced and engines are opened.

use crate::config::loader::AppConfig;
use crate::error::ConfigError;

pub const DEFAULT_MASTER_CONFIG_KEY: &str = "DB_MASTER_URI";
pub const DEFAULT_SLAVE_CONFIG_KEY: &str = "DB_SLAVE_URI";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const RAISE_WHEN_NOT_BINDING_KEY: &str = "WAYPOINT_RAISE_WHEN_NOT_BINDING";
const EXIT_POLICY_KEY: &str = "WAYPOINT_EXIT_POLICY";
const MAX_CONNECTIONS_KEY: &str = "WAYPOINT_MAX_CONNECTIONS";

/// What happens to the request's binding when a scope exits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExitPolicy {
    /// Binding stays for the rest of the request; any second scope is a duplicate.
    #[default]
    Retain,
    /// Binding is cleared on exit; sequential scopes are allowed, nested are not.
    Clear,
}

impl std::str::FromStr for ExitPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "retain" => Ok(ExitPolicy::Retain),
            "clear" => Ok(ExitPolicy::Clear),
            _ => Err(ConfigError::InvalidValue {
                key: EXIT_POLICY_KEY.to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct WaypointOptions {
    /// Fail database access inside a request that never bound an engine.
    pub raise_when_not_binding: bool,
    pub master_config_key: String,
    pub slave_config_key: String,
    pub exit_policy: ExitPolicy,
    /// Pool size for each registered engine.
    pub max_connections: u32,
}

impl Default for WaypointOptions {
    fn default() -> Self {
        WaypointOptions {
            raise_when_not_binding: false,
            master_config_key: DEFAULT_MASTER_CONFIG_KEY.to_string(),
            slave_config_key: DEFAULT_SLAVE_CONFIG_KEY.to_string(),
            exit_policy: ExitPolicy::Retain,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl WaypointOptions {
    /// Defaults overridden by the optional `WAYPOINT_*` keys of the app config.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let mut options = WaypointOptions::default();
        if let Some(raw) = config.get(RAISE_WHEN_NOT_BINDING_KEY) {
            options.raise_when_not_binding = parse_flag(RAISE_WHEN_NOT_BINDING_KEY, raw)?;
        }
        if let Some(raw) = config.get(EXIT_POLICY_KEY) {
            options.exit_policy = raw.parse()?;
        }
        if let Some(raw) = config.get(MAX_CONNECTIONS_KEY) {
            options.max_connections = raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: MAX_CONNECTIONS_KEY.to_string(),
                    value: raw.to_string(),
                })?;
        }
        Ok(options)
    }

    pub fn strict(mut self) -> Self {
        self.raise_when_not_binding = true;
        self
    }

    pub fn with_exit_policy(mut self, policy: ExitPolicy) -> Self {
        self.exit_policy = policy;
        self
    }

    pub fn with_config_keys(mut self, master: impl Into<String>, slave: impl Into<String>) -> Self {
        self.master_config_key = master.into();
        self.slave_config_key = slave.into();
        self
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}
