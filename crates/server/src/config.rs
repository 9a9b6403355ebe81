use core::net::SocketAddr;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Errors in the process environment that keep the server from starting
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("LIBRARIAN_ADDR '{value}' is not a socket address: {source}")]
    InvalidAddr {
        value: String,
        source: core::net::AddrParseError,
    },
}

/// Settings read from the environment at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on, `LIBRARIAN_ADDR`
    pub addr: SocketAddr,
    /// Seed document loaded into the catalog before serving, `LIBRARIAN_SEED`
    pub seed_path: Option<PathBuf>,
    /// Forbid every mutation, `LIBRARIAN_READ_ONLY`
    pub read_only: bool,
    /// Key for ISBN lookups when the requesting user has none, `GOOGLE_BOOKS_API_KEY`
    pub google_books_api_key: Option<String>,
}

impl ServerConfig {
    /// # Errors
    /// Fails if `LIBRARIAN_ADDR` is set but cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the settings through `lookup` instead of the process environment
    /// # Errors
    /// Fails if `LIBRARIAN_ADDR` is set but cannot be parsed
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = lookup("LIBRARIAN_ADDR")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ADDR.to_owned());
        let addr: SocketAddr = value
            .trim()
            .parse()
            .map_err(|source| ConfigError::InvalidAddr { value, source })?;
        let seed_path = lookup("LIBRARIAN_SEED")
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        let read_only = lookup("LIBRARIAN_READ_ONLY")
            .map(|val| val == "true" || val == "1")
            .unwrap_or(false);
        let google_books_api_key =
            lookup("GOOGLE_BOOKS_API_KEY").filter(|value| !value.is_empty());

        Ok(Self {
            addr,
            seed_path,
            read_only,
            google_books_api_key,
        })
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "Tests are predefined and guaranteed to be Some/Ok"
)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|&(key, value)| (key.to_owned(), value.to_owned()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config(&[]).unwrap();
        assert_eq!(config.addr, DEFAULT_ADDR.parse().unwrap());
        assert_eq!(config.seed_path, None);
        assert!(!config.read_only);
        assert_eq!(config.google_books_api_key, None);
    }

    #[test]
    fn reads_every_setting() {
        let config = config(&[
            ("LIBRARIAN_ADDR", "0.0.0.0:9000"),
            ("LIBRARIAN_SEED", "seed.json"),
            ("LIBRARIAN_READ_ONLY", "1"),
            ("GOOGLE_BOOKS_API_KEY", "secret"),
        ])
        .unwrap();
        assert_eq!(config.addr, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.seed_path, Some(PathBuf::from("seed.json")));
        assert!(config.read_only);
        assert_eq!(config.google_books_api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn read_only_needs_true_or_one() {
        assert!(!config(&[("LIBRARIAN_READ_ONLY", "yes")]).unwrap().read_only);
        assert!(config(&[("LIBRARIAN_READ_ONLY", "true")]).unwrap().read_only);
    }

    #[test]
    fn malformed_addr_is_rejected() {
        let error = config(&[("LIBRARIAN_ADDR", "localhost")]).unwrap_err();
        assert!(error.to_string().starts_with("LIBRARIAN_ADDR 'localhost'"));
    }
}
