use anyhow::{Context, anyhow};
use learnhub_cache::{CacheConfig, RedisCache};
use learnhub_config::{AppConfig, CorsConfig, DatabaseConfig, RateLimitConfig};
use learnhub_core::SystemIdGenerator;
use sqlx::PgPool;
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    /// `None` when caching is disabled or Redis was unreachable at startup.
    pub cache: Option<RedisCache>,
    pub app_config: AppConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub id_generator: SystemIdGenerator,
}

impl AppState {
    /// State with environment-independent defaults around an existing pool.
    pub fn new(db: PgPool, app_config: AppConfig) -> Self {
        let id_generator = SystemIdGenerator::new(app_config.system_id_max_attempts);
        Self {
            db,
            cache: None,
            app_config,
            cors_config: CorsConfig::default(),
            rate_limit_config: RateLimitConfig::default(),
            id_generator,
        }
    }

    pub fn cache(&self) -> Option<&RedisCache> {
        self.cache.as_ref()
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let db_config = DatabaseConfig::from_env().ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;
    let db = learnhub_db::init_db_pool(&db_config)
        .await
        .context("Failed to connect to database")?;

    let app_config = AppConfig::from_env();
    let mut state = AppState::new(db, app_config);
    state.cors_config = CorsConfig::from_env();
    state.rate_limit_config = RateLimitConfig::from_env();
    state.cache = init_cache().await;

    Ok(state)
}

async fn init_cache() -> Option<RedisCache> {
    let config = CacheConfig::from_env();
    if !config.enabled {
        info!("Redis cache disabled");
        return None;
    }

    match RedisCache::new(&config.redis_url, config.default_ttl()).await {
        Ok(cache) => {
            info!(cache.ttl_secs = config.default_ttl_seconds, "Redis cache connected");
            Some(cache)
        }
        Err(e) => {
            warn!(error = %e, "Redis unavailable, continuing without cache");
            None
        }
    }
}
