//! Per-IP request limiting.
//!
//! A `governor` keyed limiter holds `max_requests` tokens per client and
//! refills one every `window_secs / max_requests`. This is a token bucket,
//! not a fixed window: a client that drains the bucket and then keeps
//! pace with the refill can send close to `2 * max_requests` requests in
//! its first `window_secs`, and at most `max_requests` back to back at any
//! moment. Clients are identified with
//! `tower_governor`'s [`SmartIpKeyExtractor`]: forwarding headers first, then
//! the peer address from `ConnectInfo`.

use std::net::IpAddr;
use std::num::NonZeroU32;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    DefaultKeyedRateLimiter, Quota, RateLimiter,
    clock::{Clock, DefaultClock},
};
use learnhub_config::RateLimitConfig;
use learnhub_core::AppError;
use tower_governor::key_extractor::{KeyExtractor, SmartIpKeyExtractor};

use crate::state::AppState;

pub struct IpRateLimiter {
    enabled: bool,
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    clock: DefaultClock,
}

impl IpRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let burst = NonZeroU32::new(config.max_requests).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(config.replenish_interval())
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            enabled: config.enabled,
            limiter: RateLimiter::keyed(quota),
            clock: DefaultClock::default(),
        }
    }

    /// `Err(seconds)` when the client must wait before retrying.
    pub fn check(&self, ip: IpAddr) -> Result<(), u64> {
        if !self.enabled {
            return Ok(());
        }

        self.limiter.check_key(&ip).map_err(|not_until| {
            let wait = not_until.wait_time_from(self.clock.now());
            wait.as_secs().max(1)
        })
    }

    /// Drops state for clients whose buckets are full again.
    pub fn prune(&self) {
        self.limiter.retain_recent();
    }
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    // Without a resolvable address (in-process calls) there is nothing to key on.
    let Ok(ip) = SmartIpKeyExtractor.extract(&req) else {
        return next.run(req).await;
    };

    match state.rate_limiter.check(ip) {
        Ok(()) => next.run(req).await,
        Err(retry_after) => {
            tracing::warn!(ip = %ip, retry_after, "Rate limit exceeded");
            AppError::too_many_requests(retry_after).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_requests: u32) -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            max_requests,
            window_secs: 900,
        }
    }

    #[test]
    fn test_burst_then_reject() {
        let limiter = IpRateLimiter::new(&config(3));
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        for _ in 0..3 {
            assert!(limiter.check(ip).is_ok());
        }
        let retry_after = limiter.check(ip).unwrap_err();
        assert!(retry_after >= 1);
    }

    #[test]
    fn test_retry_after_is_one_refill_not_a_whole_window() {
        let limiter = IpRateLimiter::new(&config(3));
        let ip: IpAddr = "10.0.0.9".parse().unwrap();

        for _ in 0..3 {
            assert!(limiter.check(ip).is_ok());
        }
        let retry_after = limiter.check(ip).unwrap_err();
        assert!(retry_after <= 300, "waited {retry_after}s for one token");
        assert!(retry_after > 200);
    }

    #[test]
    fn test_clients_are_limited_independently() {
        let limiter = IpRateLimiter::new(&config(1));
        let first: IpAddr = "10.0.0.1".parse().unwrap();
        let second: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(limiter.check(first).is_ok());
        assert!(limiter.check(first).is_err());
        assert!(limiter.check(second).is_ok());
    }

    #[test]
    fn test_disabled_limiter_allows_everything() {
        let mut cfg = config(1);
        cfg.enabled = false;
        let limiter = IpRateLimiter::new(&cfg);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();

        for _ in 0..10 {
            assert!(limiter.check(ip).is_ok());
        }
    }
}
