//! Configuration management for the lobby server
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `LOBBY_*` environment variables, then the port given on the command line.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use crate::client::MAX_CLIENTS;

/// Looked up in the working directory when no file is given. Optional.
pub const DEFAULT_CONFIG_FILE: &str = "lobby";

/// Prefix of environment overrides, e.g. `LOBBY_MAX_CLIENTS`.
pub const ENV_PREFIX: &str = "LOBBY";

/// Largest accepted `max_clients`; the registry allocates every slot up front.
pub const MAX_CLIENTS_LIMIT: usize = 65_536;

/// Largest accepted `accept_rate`.
pub const MAX_ACCEPT_RATE: usize = 1_000_000;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// IP address the listener binds to
    pub bind_address: String,

    /// Listening port; 0 picks an ephemeral port
    pub port: u16,

    /// Registry slots, i.e. maximum concurrent clients
    pub max_clients: usize,

    /// Pending-connection queue length passed to listen(2)
    pub listen_backlog: u32,

    /// How long a new connection may stay silent before it is dropped
    pub handshake_timeout_secs: u64,

    /// Accepts allowed per throttle window
    pub accept_rate: usize,
    pub accept_window_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 0,
            max_clients: MAX_CLIENTS,
            listen_backlog: 128,
            handshake_timeout_secs: 30,
            accept_rate: 100,
            accept_window_ms: 1000,
        }
    }
}

impl ServerConfig {
    /// Load configuration, reading `file` if given (it must then exist) or
    /// the optional `lobby.toml` otherwise. `port` overrides every other
    /// source.
    pub fn load(file: Option<&Path>, port: Option<u16>) -> Result<Self, ConfigError> {
        Self::load_from(file, port, None)
    }

    /// Like `load`, but reads environment overrides from `env` instead of
    /// the process environment when it is `Some`.
    pub fn load_from(
        file: Option<&Path>,
        port: Option<u16>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let defaults = ServerConfig::default();

        let builder = Config::builder()
            .set_default("bind_address", defaults.bind_address.as_str())?
            .set_default("port", i64::from(defaults.port))?
            .set_default("max_clients", defaults.max_clients as i64)?
            .set_default("listen_backlog", i64::from(defaults.listen_backlog))?
            .set_default(
                "handshake_timeout_secs",
                defaults.handshake_timeout_secs as i64,
            )?
            .set_default("accept_rate", defaults.accept_rate as i64)?
            .set_default("accept_window_ms", defaults.accept_window_ms as i64)?;

        let builder = match file {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(env),
            )
            .set_override_option("port", port.map(i64::from))?
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Message(format!(
                "bind_address is not an IP address: {}",
                self.bind_address
            )));
        }

        if self.max_clients == 0 || self.max_clients > MAX_CLIENTS_LIMIT {
            return Err(ConfigError::Message(format!(
                "max_clients must be between 1 and {}",
                MAX_CLIENTS_LIMIT
            )));
        }

        if self.handshake_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "handshake_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.accept_rate == 0 || self.accept_window_ms == 0 {
            return Err(ConfigError::Message(
                "accept_rate and accept_window_ms must be greater than 0".into(),
            ));
        }

        if self.accept_rate > MAX_ACCEPT_RATE {
            return Err(ConfigError::Message(format!(
                "accept_rate must not exceed {}",
                MAX_ACCEPT_RATE
            )));
        }

        Ok(())
    }

    /// Bind address and port as a socket address
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        let ip: IpAddr = self.bind_address.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    pub fn accept_window(&self) -> Duration {
        Duration::from_millis(self.accept_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env() -> Option<config::Map<String, String>> {
        Some(config::Map::new())
    }

    #[test]
    fn defaults_without_file() {
        let config = ServerConfig::load_from(None, Some(4000), no_env()).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.max_clients, 100);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.handshake_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn file_values_are_read_and_port_argument_wins() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "port = 9000\nmax_clients = 8\nhandshake_timeout_secs = 5").unwrap();

        let config = ServerConfig::load_from(Some(file.path()), Some(7000), no_env()).unwrap();
        assert_eq!(config.port, 7000);
        assert_eq!(config.max_clients, 8);
        assert_eq!(config.handshake_timeout_secs, 5);

        let config = ServerConfig::load_from(Some(file.path()), None, no_env()).unwrap();
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(ServerConfig::load_from(Some(&missing), Some(1), no_env()).is_err());
    }

    #[test]
    fn environment_overrides_defaults() {
        let mut env = config::Map::new();
        env.insert("LOBBY_MAX_CLIENTS".to_string(), "3".to_string());
        env.insert("LOBBY_ACCEPT_RATE".to_string(), "7".to_string());

        let config = ServerConfig::load_from(None, Some(1), Some(env)).unwrap();
        assert_eq!(config.max_clients, 3);
        assert_eq!(config.accept_rate, 7);
    }

    #[test]
    fn zero_capacity_is_invalid() {
        let mut env = config::Map::new();
        env.insert("LOBBY_MAX_CLIENTS".to_string(), "0".to_string());
        assert!(ServerConfig::load_from(None, Some(1), Some(env)).is_err());
    }

    #[test]
    fn oversized_capacity_and_rate_are_invalid() {
        let mut env = config::Map::new();
        env.insert(
            "LOBBY_ACCEPT_RATE".to_string(),
            (usize::MAX / 2).to_string(),
        );
        assert!(ServerConfig::load_from(None, Some(1), Some(env)).is_err());

        let mut env = config::Map::new();
        env.insert(
            "LOBBY_MAX_CLIENTS".to_string(),
            (MAX_CLIENTS_LIMIT + 1).to_string(),
        );
        assert!(ServerConfig::load_from(None, Some(1), Some(env)).is_err());

        let mut env = config::Map::new();
        env.insert(
            "LOBBY_MAX_CLIENTS".to_string(),
            MAX_CLIENTS_LIMIT.to_string(),
        );
        env.insert(
            "LOBBY_ACCEPT_RATE".to_string(),
            MAX_ACCEPT_RATE.to_string(),
        );
        let config = ServerConfig::load_from(None, Some(1), Some(env)).unwrap();
        assert_eq!(config.max_clients, MAX_CLIENTS_LIMIT);
    }

    #[test]
    fn bad_bind_address_is_invalid() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "bind_address = \"not-an-ip\"").unwrap();
        assert!(ServerConfig::load_from(Some(file.path()), Some(1), no_env()).is_err());
    }

    #[test]
    fn socket_addr_combines_address_and_port() {
        let config = ServerConfig {
            port: 2121,
            ..ServerConfig::default()
        };
        assert_eq!(
            config.socket_addr().unwrap(),
            "127.0.0.1:2121".parse::<SocketAddr>().unwrap()
        );
    }
}
