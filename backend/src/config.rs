//! Server configuration.
//!
//! Values come from the environment (a `.env` file is loaded first when
//! present); command-line flags override them.
//!
//! | Variable                      | Default   |
//! |-------------------------------|-----------|
//! | `QUIZSTATS_HOST`              | `0.0.0.0` |
//! | `QUIZSTATS_PORT`              | `3000`    |
//! | `QUIZSTATS_MAX_UPLOAD_BYTES`  | 50 MiB    |

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_PORT: u16 = 3000;

/// 50 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Read from the process environment. Unparsable values fall back to
    /// the defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read through an arbitrary lookup function.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let defaults = Self::default();

        Self {
            host: parsed(&lookup, "QUIZSTATS_HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "QUIZSTATS_PORT").unwrap_or(defaults.port),
            max_upload_bytes: parsed(&lookup, "QUIZSTATS_MAX_UPLOAD_BYTES")
                .unwrap_or(defaults.max_upload_bytes),
        }
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parsed<T: std::str::FromStr, F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config, Config::default());
        assert_eq!(config.addr().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("QUIZSTATS_HOST", "127.0.0.1"),
            ("QUIZSTATS_PORT", "8080"),
            ("QUIZSTATS_MAX_UPLOAD_BYTES", "1024"),
        ]));
        assert_eq!(config.addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.max_upload_bytes, 1024);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = Config::from_lookup(lookup(&[("QUIZSTATS_PORT", "eighty")]));
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_cli_port_wins() {
        let config = Config::default().with_port(Some(9000));
        assert_eq!(config.port, 9000);
        assert_eq!(Config::default().with_port(None).port, DEFAULT_PORT);
    }
}
