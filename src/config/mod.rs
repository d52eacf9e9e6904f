//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

use crate::util::rate_limit::JOIN_RATE_LIMIT;
use crate::util::time::SIMULATION_TPS;

/// Highest tick rate accepted from the environment
const MAX_TICK_RATE_HZ: u32 = 240;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Allowed client origin(s) for CORS, comma separated
    pub client_origin: String,
    /// Simulation ticks per second for every session
    pub tick_rate_hz: u32,
    /// Join attempts allowed per connection per second
    pub join_rate_limit: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Some(port) = lookup("PORT") {
            format!("0.0.0.0:{}", port)
        } else {
            lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string())
        };

        let tick_rate_hz = match lookup("TICK_RATE_HZ") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|hz| (1..=MAX_TICK_RATE_HZ).contains(hz))
                .ok_or(ConfigError::Invalid("TICK_RATE_HZ"))?,
            None => SIMULATION_TPS,
        };

        let join_rate_limit = match lookup("JOIN_RATE_LIMIT") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::Invalid("JOIN_RATE_LIMIT"))?,
            None => JOIN_RATE_LIMIT,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            client_origin: lookup("CLIENT_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),

            tick_rate_hz,
            join_rate_limit,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            log_level: "info".to_string(),
            client_origin: "http://localhost:5173".to_string(),
            tick_rate_hz: SIMULATION_TPS,
            join_rate_limit: JOIN_RATE_LIMIT,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio_test::{assert_err, assert_ok};

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = assert_ok!(Config::from_lookup(lookup_from(&[])));
        assert_eq!(config.server_addr.port(), 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.client_origin, "http://localhost:5173");
        assert_eq!(config.tick_rate_hz, 60);
        assert_eq!(config.join_rate_limit, JOIN_RATE_LIMIT);
    }

    #[test]
    fn port_takes_precedence_over_server_addr() {
        let config = assert_ok!(Config::from_lookup(lookup_from(&[
            ("PORT", "9000"),
            ("SERVER_ADDR", "127.0.0.1:4000"),
        ])));
        assert_eq!(config.server_addr.port(), 9000);
    }

    #[test]
    fn rejects_bad_address() {
        let err = assert_err!(Config::from_lookup(lookup_from(&[(
            "SERVER_ADDR",
            "not-an-address"
        )])));
        assert!(matches!(err, ConfigError::InvalidAddress));
    }

    #[test]
    fn rejects_out_of_range_tick_rate() {
        for raw in ["0", "1000", "fast"] {
            let err = assert_err!(Config::from_lookup(lookup_from(&[("TICK_RATE_HZ", raw)])));
            assert!(matches!(err, ConfigError::Invalid("TICK_RATE_HZ")));
        }
        let config = assert_ok!(Config::from_lookup(lookup_from(&[("TICK_RATE_HZ", "30")])));
        assert_eq!(config.tick_rate_hz, 30);
    }
}
