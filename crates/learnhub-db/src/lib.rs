//! # LearnHub DB
//!
//! - [`init_db_pool`]: PostgreSQL pool from [`DatabaseConfig`]
//! - [`system_ids`]: Postgres-backed [`SystemIdStore`](learnhub_core::SystemIdStore)
//! - [`constraints`]: classification of constraint violations
//!
//! ```ignore
//! let config = DatabaseConfig::from_env().ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;
//! let pool = learnhub_db::init_db_pool(&config).await?;
//! ```

pub mod constraints;
pub mod system_ids;

use learnhub_config::DatabaseConfig;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

pub use sqlx::PgPool;
pub use system_ids::PgSystemIdStore;

pub async fn init_db_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    info!(
        db.max_connections = config.max_connections,
        "Database pool initialized"
    );
    Ok(pool)
}
