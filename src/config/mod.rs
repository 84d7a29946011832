//! Configuration module for the employee agreement backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;

/// Default upper bound for the `limit` query parameter.
pub const DEFAULT_MAX_PAGE_LIMIT: u32 = 100;

/// Error raised when an environment variable holds an unusable value.
#[derive(Debug)]
pub struct ConfigError {
    pub variable: &'static str,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.variable, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection string of the document store
    pub database_url: String,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Largest page size a list request may ask for
    pub max_page_limit: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = env::var("EMPS_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:./data/employee-agreement.sqlite".to_string());

        let bind_addr = env::var("EMPS_BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:9000".to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError {
                variable: "EMPS_BIND_ADDR",
                message: e.to_string(),
            })?;

        let log_level = env::var("EMPS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let max_page_limit = match env::var("EMPS_MAX_PAGE_LIMIT") {
            Ok(raw) => match raw.parse::<u32>() {
                Ok(0) | Err(_) => {
                    return Err(ConfigError {
                        variable: "EMPS_MAX_PAGE_LIMIT",
                        message: format!("expected a positive integer, got {:?}", raw),
                    })
                }
                Ok(n) => n,
            },
            Err(_) => DEFAULT_MAX_PAGE_LIMIT,
        };

        Ok(Self {
            database_url,
            bind_addr,
            log_level,
            max_page_limit,
        })
    }
}
