//! Process configuration.
//!
//! Values come from environment variables, each with a default. An unset or
//! empty variable falls back to its default. Command-line flags parsed in
//! `main` override whatever the environment produced.
//!
//! | Variable | Default |
//! |---|---|
//! | `DB_URI` | `mongodb://127.0.0.1:27017` |
//! | `DB_NAME` | `simple_crud` |
//! | `DB_COLLECTION` | `simple_crud` |
//! | `DB_USERNAME` | `admin` |
//! | `DB_PASSWORD` | `admin` |
//! | `DB_TIMEOUT_MS` | `2000` |
//! | `SERVER_HOST` | `0.0.0.0` |
//! | `SERVER_PORT` | `8080` |

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_DB_URI: &str = "mongodb://127.0.0.1:27017";
pub const DEFAULT_DB_NAME: &str = "simple_crud";
pub const DEFAULT_DB_COLLECTION: &str = "simple_crud";
pub const DEFAULT_DB_USERNAME: &str = "admin";
pub const DEFAULT_DB_PASSWORD: &str = "admin";
pub const DEFAULT_DB_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Main configuration structure.
#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
}

/// Where the HTTP listener binds.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Document store connection settings.
#[derive(Clone)]
pub struct StoreConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
    /// Read from the environment but not applied to the connection:
    /// credentials must be part of `uri`.
    pub username: String,
    pub password: String,
    /// Deadline for each individual store operation.
    pub timeout: Duration,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("uri", &self.uri)
            .field("database", &self.database)
            .field("collection", &self.collection)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, fallback: &str| -> String {
            lookup(key).filter(|v| !v.is_empty()).unwrap_or_else(|| fallback.to_owned())
        };

        let port = get("SERVER_PORT", &DEFAULT_SERVER_PORT.to_string());
        let port = port
            .parse::<u16>()
            .map_err(|e| Error::config(format!("invalid SERVER_PORT {port:?}: {e}")))?;

        let timeout_ms = get("DB_TIMEOUT_MS", &DEFAULT_DB_TIMEOUT_MS.to_string());
        let timeout_ms = timeout_ms
            .parse::<u64>()
            .map_err(|e| Error::config(format!("invalid DB_TIMEOUT_MS {timeout_ms:?}: {e}")))?;

        let config = Self {
            server: ServerConfig {
                host: get("SERVER_HOST", DEFAULT_SERVER_HOST),
                port,
            },
            store: StoreConfig {
                uri: get("DB_URI", DEFAULT_DB_URI),
                database: get("DB_NAME", DEFAULT_DB_NAME),
                collection: get("DB_COLLECTION", DEFAULT_DB_COLLECTION),
                username: get("DB_USERNAME", DEFAULT_DB_USERNAME),
                password: get("DB_PASSWORD", DEFAULT_DB_PASSWORD),
                timeout: Duration::from_millis(timeout_ms),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.store.timeout.is_zero() {
            return Err(Error::config("DB_TIMEOUT_MS must be greater than zero"));
        }
        if self.store.database.is_empty() || self.store.collection.is_empty() {
            return Err(Error::config("database and collection names must not be empty"));
        }
        Ok(())
    }
}

impl ServerConfig {
    /// Resolves `host:port` to the first matching socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| Error::config(format!("cannot resolve {}:{}: {e}", self.host, self.port)))?
            .next()
            .ok_or_else(|| Error::config(format!("{}:{} resolved to no address", self.host, self.port)))
    }
}

impl StoreConfig {
    /// `true` when `uri` carries its own `user:password@` section.
    pub fn uri_has_credentials(&self) -> bool {
        let rest = self.uri.split_once("://").map_or(self.uri.as_str(), |(_, r)| r);
        let authority = rest.split(['/', '?']).next().unwrap_or_default();
        authority.contains('@')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.store.uri, "mongodb://127.0.0.1:27017");
        assert_eq!(cfg.store.database, "simple_crud");
        assert_eq!(cfg.store.collection, "simple_crud");
        assert_eq!(cfg.store.username, "admin");
        assert_eq!(cfg.store.password, "admin");
        assert_eq!(cfg.store.timeout, Duration::from_secs(2));
    }

    #[test]
    fn empty_value_falls_back() {
        let cfg = load(&[("DB_NAME", ""), ("SERVER_PORT", "")]).unwrap();
        assert_eq!(cfg.store.database, "simple_crud");
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn overrides() {
        let cfg = load(&[("DB_URI", "memory://"), ("SERVER_PORT", "9000"), ("DB_TIMEOUT_MS", "50")]).unwrap();
        assert_eq!(cfg.store.uri, "memory://");
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.store.timeout, Duration::from_millis(50));
    }

    #[test]
    fn bad_port_is_a_config_error() {
        assert!(matches!(load(&[("SERVER_PORT", "http")]), Err(Error::Config(_))));
        assert!(matches!(load(&[("DB_TIMEOUT_MS", "0")]), Err(Error::Config(_))));
    }

    #[test]
    fn password_is_not_printed() {
        let cfg = load(&[("DB_PASSWORD", "hunter2")]).unwrap();
        assert!(!format!("{:?}", cfg.store).contains("hunter2"));
    }

    #[test]
    fn detects_uri_credentials() {
        let mut cfg = load(&[]).unwrap().store;
        assert!(!cfg.uri_has_credentials());
        cfg.uri = "mongodb://u:p@db:27017/?authSource=admin".into();
        assert!(cfg.uri_has_credentials());
        cfg.uri = "mongodb://db:27017/?x=a@b".into();
        assert!(!cfg.uri_has_credentials());
    }

    #[test]
    fn resolves_socket_addr() {
        let server = ServerConfig { host: "127.0.0.1".into(), port: 8080 };
        assert_eq!(server.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
    }
}
