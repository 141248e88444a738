//! # LearnHub Config
//!
//! Configuration loaded once at startup from environment variables (and a
//! `.env` file when present) and then shared read-only through `AppState`.
//!
//! - [`cors`]: allowed CORS origins
//! - [`jwt`]: token signing secret and lifetime
//! - [`rate_limit`]: per-IP request limits
//! - [`server`]: listener and database settings
//! - [`upload`]: upload directory and size limits
//!
//! ```ignore
//! use learnhub_config::AppConfig;
//!
//! let config = AppConfig::from_env()?;
//! println!("listening on {}", config.server.bind_address());
//! ```

pub mod cors;
pub mod jwt;
pub mod rate_limit;
pub mod server;
pub mod upload;

pub use cors::CorsConfig;
pub use jwt::JwtConfig;
pub use rate_limit::RateLimitConfig;
pub use server::{DatabaseConfig, ServerConfig};
pub use upload::UploadConfig;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Everything the server needs, resolved up front so a bad environment
/// fails at startup instead of on the first request.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub upload: UploadConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env(),
            database: DatabaseConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            cors: CorsConfig::from_env(),
            rate_limit: RateLimitConfig::from_env(),
            upload: UploadConfig::from_env(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::Missing("JWT_SECRET").to_string(),
            "JWT_SECRET must be set"
        );
        assert_eq!(
            ConfigError::Invalid {
                key: "JWT_LIFETIME",
                value: "soon".to_string()
            }
            .to_string(),
            "JWT_LIFETIME has an invalid value: soon"
        );
    }
}
