//! Per-IP rate limiting configuration.
//!
//! - `RATE_LIMIT_ENABLED`: `false` or `0` disables the limiter (default: enabled)
//! - `RATE_LIMIT_MAX_REQUESTS`: requests allowed per window (default: 100)
//! - `RATE_LIMIT_WINDOW_SECS`: window length in seconds (default: 900)
//!
//! The limiter is a token bucket that holds `max_requests` tokens and refills
//! one token every `window_secs / max_requests` seconds.

use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_secs: 15 * 60,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: std::env::var("RATE_LIMIT_ENABLED")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.enabled),
            max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.max_requests),
            window_secs: std::env::var("RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.window_secs),
        }
    }

    /// Time needed to regain one request.
    #[must_use]
    pub fn replenish_interval(&self) -> Duration {
        let window = Duration::from_secs(self.window_secs.max(1));
        (window / self.max_requests.max(1)).max(Duration::from_millis(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_requests, 100);
        assert_eq!(config.window_secs, 900);
    }

    #[test]
    fn test_replenish_interval() {
        let config = RateLimitConfig::default();
        assert_eq!(config.replenish_interval(), Duration::from_secs(9));

        let config = RateLimitConfig {
            enabled: true,
            max_requests: 1000,
            window_secs: 1,
        };
        assert_eq!(config.replenish_interval(), Duration::from_millis(1));
    }
}
