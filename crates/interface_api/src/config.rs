//! API configuration

use serde::{Deserialize, Serialize};

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// HS256 secret for bearer tokens
    pub jwt_secret: String,
    /// Lifetime of issued tokens in seconds
    pub jwt_expiration_secs: u64,
    pub database_url: String,
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    /// Tax jurisdiction used when neither a location nor the customer
    /// address names a state
    pub default_state: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/policy_assembly".to_string(),
            log_level: "info".to_string(),
            default_state: None,
        }
    }
}

impl ApiConfig {
    /// Loads `API_`-prefixed environment variables over the defaults
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
