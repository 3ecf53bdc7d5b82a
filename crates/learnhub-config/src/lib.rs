//! # LearnHub Config
//!
//! Configuration structures loaded from environment variables:
//!
//! - [`app`]: server address, public URLs and system ID settings
//! - [`database`]: PostgreSQL connection settings
//! - [`cors`]: allowed CORS origins
//! - [`rate_limit`]: per-IP rate limiting
//!
//! ```ignore
//! use learnhub_config::{AppConfig, CorsConfig, RateLimitConfig};
//!
//! let app_config = AppConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! let rate_limit_config = RateLimitConfig::from_env();
//! ```

pub mod app;
pub mod cors;
pub mod database;
pub mod rate_limit;

pub use app::AppConfig;
pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use rate_limit::RateLimitConfig;

/// Read an environment variable and parse it, falling back to `default` when
/// it is unset or unparsable.
pub(crate) fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
