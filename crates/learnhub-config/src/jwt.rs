//! JWT signing configuration.
//!
//! - `JWT_SECRET` (required): HMAC secret used to sign tokens
//! - `JWT_LIFETIME`: token lifetime as `<n>[s|m|h|d]` or plain seconds (default: `30d`)

use std::env;

use crate::ConfigError;

pub const DEFAULT_LIFETIME: &str = "30d";

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub lifetime_secs: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish()
    }
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, lifetime_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            lifetime_secs,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let lifetime = env::var("JWT_LIFETIME").unwrap_or_else(|_| DEFAULT_LIFETIME.to_string());
        let lifetime_secs = parse_lifetime(&lifetime).ok_or_else(|| ConfigError::Invalid {
            key: "JWT_LIFETIME",
            value: lifetime.clone(),
        })?;

        Ok(Self {
            secret,
            lifetime_secs,
        })
    }
}

/// Parses `30d`, `12h`, `15m`, `90s` or `3600` into seconds.
pub fn parse_lifetime(value: &str) -> Option<u64> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let number: u64 = number.parse().ok()?;

    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        "w" => 7 * 24 * 60 * 60,
        _ => return None,
    };

    number.checked_mul(multiplier).filter(|secs| *secs > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lifetime_units() {
        assert_eq!(parse_lifetime("30d"), Some(2_592_000));
        assert_eq!(parse_lifetime("12h"), Some(43_200));
        assert_eq!(parse_lifetime("15m"), Some(900));
        assert_eq!(parse_lifetime("90s"), Some(90));
        assert_eq!(parse_lifetime("3600"), Some(3600));
        assert_eq!(parse_lifetime("1w"), Some(604_800));
    }

    #[test]
    fn test_parse_lifetime_rejects_garbage() {
        assert_eq!(parse_lifetime(""), None);
        assert_eq!(parse_lifetime("d"), None);
        assert_eq!(parse_lifetime("10y"), None);
        assert_eq!(parse_lifetime("0"), None);
        assert_eq!(parse_lifetime("-5m"), None);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = JwtConfig::new("super-secret", 60);
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("lifetime_secs"));
    }
}
