// src/services/rate_limiter.rs
// DOCUMENTATION: Request throttling
// PURPOSE: Keep form spam and geocoder quota usage in check

use crate::errors::TowError;
use governor::{DefaultDirectRateLimiter, DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;

fn per_minute(n: u32) -> Quota {
    Quota::per_minute(NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN))
}

/// Shared limiters for all workers
pub struct RequestLimiter {
    /// Keyed by client IP
    submissions: DefaultKeyedRateLimiter<String>,
    /// Global, protects the geocoder quota
    geocoding: DefaultDirectRateLimiter,
}

impl RequestLimiter {
    pub fn new(submissions_per_minute: u32, geocode_requests_per_minute: u32) -> Self {
        Self {
            submissions: RateLimiter::keyed(per_minute(submissions_per_minute)),
            geocoding: RateLimiter::direct(per_minute(geocode_requests_per_minute)),
        }
    }

    pub fn check_submission(&self, client: &str) -> Result<(), TowError> {
        self.submissions.check_key(&client.to_string()).map_err(|_| {
            log::warn!("Submission rate limit exceeded for {}", client);
            TowError::RateLimitExceeded
        })
    }

    pub fn check_geocoding(&self) -> Result<(), TowError> {
        self.geocoding.check().map_err(|_| {
            log::warn!("Geocoding proxy rate limit exceeded");
            TowError::RateLimitExceeded
        })
    }

    /// Drop per-client state that has fully replenished
    pub fn cleanup(&self) {
        self.submissions.retain_recent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_limit_is_per_client() {
        let limiter = RequestLimiter::new(2, 10);
        assert!(limiter.check_submission("10.0.0.1").is_ok());
        assert!(limiter.check_submission("10.0.0.1").is_ok());
        assert!(matches!(
            limiter.check_submission("10.0.0.1"),
            Err(TowError::RateLimitExceeded)
        ));
        assert!(limiter.check_submission("10.0.0.2").is_ok());
    }

    #[test]
    fn test_geocoding_limit_is_global() {
        let limiter = RequestLimiter::new(2, 1);
        assert!(limiter.check_geocoding().is_ok());
        assert!(limiter.check_geocoding().is_err());
    }

    #[test]
    fn test_zero_quota_falls_back_to_one() {
        let limiter = RequestLimiter::new(0, 0);
        assert!(limiter.check_submission("a").is_ok());
        assert!(limiter.check_submission("a").is_err());
    }
}
