use anyhow::anyhow;
use learnhub_cache::{RedisCache, keys};
use learnhub_core::{AppError, SystemIdError, SystemIdGenerator, SystemIdKind, SystemIdOwner};
use learnhub_db::PgSystemIdStore;
use learnhub_db::system_ids::{release_for_entity, release_orphans};
use learnhub_models::system_ids::{SystemIdRecord, SystemIdResolution, entity_types};
use learnhub_observability::{track_system_id_exhausted, track_system_id_generated};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

pub struct SystemIdService;

impl SystemIdService {
    /// Claim a fresh system ID for `owner` inside the caller's transaction.
    #[instrument(skip(conn, generator), fields(db.operation = "INSERT", db.table = "system_ids"))]
    pub async fn claim(
        conn: &mut PgConnection,
        generator: &SystemIdGenerator,
        kind: SystemIdKind,
        owner: SystemIdOwner,
    ) -> Result<String, AppError> {
        let mut store = PgSystemIdStore::new(conn);

        match generator.claim(&mut store, kind, owner).await {
            Ok(generated) => {
                track_system_id_generated(kind.as_str(), generated.fallback, generated.collisions());
                if generated.fallback {
                    warn!(
                        system_id.kind = %kind,
                        system_id.value = %generated.value,
                        attempts = generated.attempts,
                        "Issued fallback system id"
                    );
                }
                Ok(generated.value)
            }
            Err(e) => {
                if matches!(e, SystemIdError::Exhausted { .. }) {
                    track_system_id_exhausted(kind.as_str());
                }
                error!(error = %e, system_id.kind = %kind, "Failed to claim system id");
                Err(AppError::new(e.status(), e))
            }
        }
    }

    /// Tombstone the registry entries of a deleted entity and of anything
    /// its delete cascaded to.
    pub async fn release(conn: &mut PgConnection, entity_id: Uuid) -> Result<(), AppError> {
        let released = release_for_entity(&mut *conn, entity_id).await? + release_orphans(conn).await?;
        debug!(entity.id = %entity_id, released, "Released system ids");
        Ok(())
    }

    #[instrument(skip(db, cache), fields(db.operation = "SELECT", db.table = "system_ids"))]
    pub async fn resolve(
        db: &PgPool,
        cache: Option<&RedisCache>,
        system_id: &str,
    ) -> Result<SystemIdResolution, AppError> {
        let system_id = system_id.trim().to_uppercase();
        let kind = SystemIdKind::parse(&system_id).map_err(|e| AppError::new(e.status(), e))?;

        let cache_key = keys::system_ids::resolution(&system_id);
        if let Some(cache) = cache
            && let Some(resolution) = cache.get::<SystemIdResolution>(&cache_key).await
        {
            return Ok(resolution);
        }

        let record = sqlx::query_as::<_, SystemIdRecord>(
            "SELECT system_id, kind, entity_type, entity_id, created_at FROM system_ids
             WHERE system_id = $1 AND released_at IS NULL",
        )
        .bind(&system_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("System id {} not found", system_id)))?;

        let Some(name_query) = display_name_query(&record.entity_type) else {
            error!(entity_type = %record.entity_type, "Unknown entity type in system id registry");
            return Err(AppError::internal(anyhow!("Unknown entity type {}", record.entity_type)));
        };

        let display_name = sqlx::query_scalar::<_, String>(name_query)
            .bind(record.entity_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("System id {} not found", system_id)))?;

        let resolution = SystemIdResolution {
            system_id: record.system_id,
            kind,
            entity_type: record.entity_type,
            entity_id: record.entity_id,
            display_name,
        };

        if let Some(cache) = cache
            && let Err(e) = cache.set(&cache_key, &resolution).await
        {
            warn!(error = %e, "Failed to cache system id resolution");
        }

        Ok(resolution)
    }
}

fn display_name_query(entity_type: &str) -> Option<&'static str> {
    Some(match entity_type {
        entity_types::USERS => "SELECT first_name || ' ' || last_name FROM users WHERE id = $1",
        entity_types::SCHOOLS => "SELECT name FROM schools WHERE id = $1",
        entity_types::SCHOOL_STUDENTS => {
            "SELECT first_name || ' ' || last_name FROM school_students WHERE id = $1"
        }
        entity_types::FAMILIES => "SELECT name FROM families WHERE id = $1",
        entity_types::FAMILY_MEMBERS => {
            "SELECT first_name || ' ' || last_name FROM family_members WHERE id = $1"
        }
        entity_types::GROUP_CLASSES => "SELECT name FROM group_classes WHERE id = $1",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_entity_type_has_a_display_name() {
        for entity_type in [
            entity_types::USERS,
            entity_types::SCHOOLS,
            entity_types::SCHOOL_STUDENTS,
            entity_types::FAMILIES,
            entity_types::FAMILY_MEMBERS,
            entity_types::GROUP_CLASSES,
        ] {
            assert!(display_name_query(entity_type).is_some(), "{entity_type}");
        }
        assert!(display_name_query("projects").is_none());
    }
}
