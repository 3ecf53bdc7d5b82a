//! # LearnHub Cache
//!
//! - [`RedisCache`]: JSON values in Redis with a default TTL
//! - [`keys`]: key builders and invalidation helpers
//! - [`http`]: `ETag` and `Cache-Control` response middleware
//!
//! The cache is optional. Services receive `Option<&RedisCache>` and treat a
//! missing cache, or any Redis failure, as a miss.
//!
//! ```ignore
//! let config = CacheConfig::from_env();
//! let cache = RedisCache::new(&config.redis_url, config.default_ttl()).await?;
//! cache.set(&keys::schools::by_id(id), &school).await?;
//! let school: Option<School> = cache.get(&keys::schools::by_id(id)).await;
//! ```

pub mod config;
pub mod http;
pub mod keys;
pub mod redis;

pub use config::CacheConfig;
pub use http::{CacheControl, cache_control, etag_middleware};
pub use keys::{hash_filters, invalidate};
pub use redis::{CacheError, RedisCache};
