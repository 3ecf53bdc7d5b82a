//! Cache key builders and invalidation helpers.

use crate::RedisCache;
use tracing::warn;
use uuid::Uuid;

const CACHE_PREFIX: &str = "learnhub";

fn build_key(parts: &[&str]) -> String {
    format!("{}:{}", CACHE_PREFIX, parts.join(":"))
}

pub mod schools {
    use super::*;

    pub fn by_id(school_id: Uuid) -> String {
        build_key(&["school", &school_id.to_string()])
    }
}

/// System ID to entity mappings never change while the entity exists.
pub mod system_ids {
    use super::*;

    pub fn resolution(system_id: &str) -> String {
        build_key(&["system_id", system_id])
    }
}

pub mod cards {
    use super::*;

    pub fn by_token(qr_token: &str) -> String {
        build_key(&["card", qr_token])
    }
}

pub mod showcase {
    use super::*;

    pub fn list(filters_hash: &str) -> String {
        build_key(&["showcase", filters_hash])
    }

    pub fn invalidation_pattern() -> String {
        format!("{}:showcase:*", CACHE_PREFIX)
    }
}

/// Short stable hash of query parameters for list cache keys.
pub fn hash_filters<T: std::hash::Hash>(filters: &T) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::Hasher;

    let mut hasher = DefaultHasher::new();
    filters.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

/// Invalidation helpers. Failures are logged and otherwise ignored; stale
/// entries expire with their TTL.
pub mod invalidate {
    use super::*;

    async fn key(cache: Option<&RedisCache>, key: String) {
        let Some(cache) = cache else { return };
        if let Err(e) = cache.invalidate(&key).await {
            warn!(error = %e, cache.key = %key, "Failed to invalidate cache key");
        }
    }

    pub async fn school(cache: Option<&RedisCache>, school_id: Uuid) {
        key(cache, schools::by_id(school_id)).await;
    }

    pub async fn system_id(cache: Option<&RedisCache>, system_id: &str) {
        key(cache, system_ids::resolution(system_id)).await;
    }

    pub async fn card(cache: Option<&RedisCache>, qr_token: &str) {
        key(cache, cards::by_token(qr_token)).await;
    }

    pub async fn showcase(cache: Option<&RedisCache>) {
        let Some(cache) = cache else { return };
        if let Err(e) = cache
            .invalidate_pattern(&showcase::invalidation_pattern())
            .await
        {
            warn!(error = %e, "Failed to invalidate showcase caches");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        let id = Uuid::nil();
        assert_eq!(
            schools::by_id(id),
            format!("learnhub:school:{}", Uuid::nil())
        );
        assert_eq!(
            system_ids::resolution("STU-00001"),
            "learnhub:system_id:STU-00001"
        );
        assert_eq!(cards::by_token("abc"), "learnhub:card:abc");
    }

    #[test]
    fn test_showcase_pattern_covers_list_keys() {
        let key = showcase::list("deadbeef");
        let pattern = showcase::invalidation_pattern();
        assert!(key.starts_with(pattern.trim_end_matches('*')));
    }

    #[test]
    fn test_hash_filters_consistency() {
        let filters = ("Algebra I", 10i64, true);
        assert_eq!(hash_filters(&filters), hash_filters(&filters));
        assert_ne!(hash_filters(&filters), hash_filters(&("Algebra II", 10i64, true)));
    }

    #[tokio::test]
    async fn test_invalidate_without_cache_is_noop() {
        invalidate::school(None, Uuid::nil()).await;
        invalidate::card(None, "token").await;
        invalidate::showcase(None).await;
    }
}
