use std::{collections::BTreeMap, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

const DEFAULT_CONNECTION: &str = "default";

/// Transports a connection can be opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Http,
}

impl FromStr for Driver {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "http" => Ok(Driver::Http),
            other => Err(Error::Configuration(format!("unknown driver `{other}`"))),
        }
    }
}

/// One named server. Missing fields take the stock single-node values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Validated when connecting, not when parsing.
    pub driver: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            driver: "http".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8123,
            database: "default".to_string(),
            username: "default".to_string(),
            password: None,
        }
    }
}

impl ConnectionConfig {
    pub fn driver(&self) -> Result<Driver> {
        self.driver.parse()
    }
}

/// Named connections plus the one used when no name is given.
///
/// ```toml
/// default = "analytics"
///
/// [connections.analytics]
/// host = "ch.internal"
/// database = "events"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub default: String,
    pub connections: BTreeMap<String, ConnectionConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default: DEFAULT_CONNECTION.to_string(),
            connections: BTreeMap::from([(
                DEFAULT_CONNECTION.to_string(),
                ConnectionConfig::default(),
            )]),
        }
    }
}

impl ClientConfig {
    /// A config holding just `connection`, registered as the default.
    pub fn single(connection: ConnectionConfig) -> Self {
        Self {
            default: DEFAULT_CONNECTION.to_string(),
            connections: BTreeMap::from([(DEFAULT_CONNECTION.to_string(), connection)]),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn connection(&self, name: &str) -> Result<&ConnectionConfig> {
        self.connections
            .get(name)
            .ok_or_else(|| Error::Configuration(format!("no connection named `{name}`")))
    }

    pub fn default_connection(&self) -> Result<&ConnectionConfig> {
        self.connection(&self.default)
    }
}
