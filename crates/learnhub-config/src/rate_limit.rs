//! Per-IP rate limiting.
//!
//! Two token buckets are configured: a general one for the whole API and a
//! stricter one for the public card scan endpoints, which are reachable by
//! anyone holding a printed card.
//!
//! - `RATE_LIMIT_ENABLED`: default `true`
//! - `RATE_LIMIT_GENERAL_PER_SECOND`: default 2
//! - `RATE_LIMIT_GENERAL_BURST_SIZE`: default 30
//! - `RATE_LIMIT_SCAN_PER_SECOND`: default 5
//! - `RATE_LIMIT_SCAN_BURST_SIZE`: default 10
//!
//! `per_second` is the replenish interval in seconds for one token, as
//! interpreted by `tower_governor`.

use ::governor::middleware::NoOpMiddleware;
use tower_governor::governor::{GovernorConfig, GovernorConfigBuilder};
use tower_governor::key_extractor::PeerIpKeyExtractor;

use crate::env_or;

pub type IpGovernorConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub general_per_second: u64,
    pub general_burst_size: u32,
    pub scan_per_second: u64,
    pub scan_burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            general_per_second: 2,
            general_burst_size: 30,
            scan_per_second: 5,
            scan_burst_size: 10,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: env_or("RATE_LIMIT_ENABLED", defaults.enabled),
            general_per_second: env_or(
                "RATE_LIMIT_GENERAL_PER_SECOND",
                defaults.general_per_second,
            ),
            general_burst_size: env_or(
                "RATE_LIMIT_GENERAL_BURST_SIZE",
                defaults.general_burst_size,
            ),
            scan_per_second: env_or("RATE_LIMIT_SCAN_PER_SECOND", defaults.scan_per_second),
            scan_burst_size: env_or("RATE_LIMIT_SCAN_BURST_SIZE", defaults.scan_burst_size),
        }
    }

    /// Configuration with limiting switched off, used by tests that drive
    /// the router without a peer address.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Returns `None` when the values are rejected by `governor`
    /// (zero period or zero burst).
    #[must_use]
    pub fn general_governor_config(&self) -> Option<IpGovernorConfig> {
        build(self.general_per_second, self.general_burst_size)
    }

    #[must_use]
    pub fn scan_governor_config(&self) -> Option<IpGovernorConfig> {
        build(self.scan_per_second, self.scan_burst_size)
    }
}

fn build(per_second: u64, burst_size: u32) -> Option<IpGovernorConfig> {
    GovernorConfigBuilder::default()
        .per_second(per_second)
        .burst_size(burst_size)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert!(config.enabled);
        assert_eq!(config.general_per_second, 2);
        assert_eq!(config.general_burst_size, 30);
        assert_eq!(config.scan_per_second, 5);
        assert_eq!(config.scan_burst_size, 10);
    }

    #[test]
    fn test_disabled_keeps_limits() {
        let config = RateLimitConfig::disabled();
        assert!(!config.enabled);
        assert_eq!(config.general_burst_size, 30);
    }

    #[test]
    fn test_governor_configs_build() {
        let config = RateLimitConfig::default();
        assert!(config.general_governor_config().is_some());
        assert!(config.scan_governor_config().is_some());
    }

    #[test]
    fn test_zero_burst_is_rejected() {
        let config = RateLimitConfig {
            general_burst_size: 0,
            ..RateLimitConfig::default()
        };
        assert!(config.general_governor_config().is_none());
    }
}
