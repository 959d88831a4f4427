//! Server configuration
//!
//! Read once from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bind address '{0}'")]
    InvalidBindAddr(String),

    #[error("store path must not be empty")]
    EmptyStorePath,

    #[error("rules file {0} does not exist")]
    MissingRules(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `ONBOARD_STORE`, default `onboard.json`
    pub store_path: PathBuf,
    /// `ONBOARD_BIND_ADDR`, default `0.0.0.0:8080`
    pub bind_addr: String,
    /// `ONBOARD_RULES`, optional classification rules file
    pub rules_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            store_path: lookup("ONBOARD_STORE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("onboard.json")),
            bind_addr: lookup("ONBOARD_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            rules_path: lookup("ONBOARD_RULES")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn validate(&self) -> Result<SocketAddr, ConfigError> {
        if self.store_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyStorePath);
        }
        if let Some(path) = self.rules_path.as_ref().filter(|path| !path.exists()) {
            return Err(ConfigError::MissingRules(path.clone()));
        }
        self.bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(self.bind_addr.clone()))
    }
}
