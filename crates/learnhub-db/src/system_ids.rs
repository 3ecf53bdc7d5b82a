//! Postgres implementation of the system ID registry.
//!
//! Every issued identifier is a row in `system_ids` keyed by the identifier
//! itself. Reservation is `INSERT ... ON CONFLICT DO NOTHING`, so losing a
//! race never aborts the caller's transaction. Under READ COMMITTED the
//! competing insert waits for the winner to commit, after which the next
//! `highest_sequence` read sees the winner's value.
//!
//! Releasing an identifier marks the row with `released_at` instead of
//! deleting it. Tombstones still count for `exists` and `highest_sequence`,
//! so a sequential counter never moves backwards and a released value is
//! never handed to another entity.

use learnhub_core::system_id::{SystemIdError, SystemIdKind, SystemIdOwner, SystemIdStore};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

/// Registry access bound to one connection, normally `&mut *tx`.
pub struct PgSystemIdStore<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgSystemIdStore<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

impl SystemIdStore for PgSystemIdStore<'_> {
    async fn exists(&mut self, value: &str) -> Result<bool, SystemIdError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM system_ids WHERE system_id = $1)",
        )
        .bind(value)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(SystemIdError::store)
    }

    #[instrument(skip(self), fields(db.operation = "SELECT", db.table = "system_ids"))]
    async fn highest_sequence(&mut self, kind: SystemIdKind) -> Result<Option<u64>, SystemIdError> {
        // Fixed-width zero padding makes the text maximum the numeric maximum.
        let pattern = format!("^{}-[0-9]{{{}}}$", kind.prefix(), kind.suffix_len());

        let highest = sqlx::query_scalar::<_, Option<String>>(
            "SELECT MAX(system_id) FROM system_ids WHERE kind = $1 AND system_id ~ $2",
        )
        .bind(kind.as_str())
        .bind(&pattern)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(SystemIdError::store)?;

        Ok(highest.and_then(|value| kind.sequence_of(&value)))
    }

    #[instrument(skip(self), fields(db.operation = "INSERT", db.table = "system_ids"))]
    async fn try_reserve(
        &mut self,
        kind: SystemIdKind,
        value: &str,
        owner: SystemIdOwner,
    ) -> Result<bool, SystemIdError> {
        let result = sqlx::query(
            r#"INSERT INTO system_ids (system_id, kind, entity_type, entity_id)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (system_id) DO NOTHING"#,
        )
        .bind(value)
        .bind(kind.as_str())
        .bind(owner.entity_type)
        .bind(owner.entity_id)
        .execute(&mut *self.conn)
        .await
        .map_err(SystemIdError::store)?;

        Ok(result.rows_affected() == 1)
    }
}

/// Tombstone the registry entries owned by an entity, used when the entity
/// is deleted so the mapping no longer resolves.
pub async fn release_for_entity(
    conn: &mut PgConnection,
    entity_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE system_ids SET released_at = NOW() WHERE entity_id = $1 AND released_at IS NULL",
    )
    .bind(entity_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Tombstone registry entries whose entity no longer exists, e.g. roster
/// students removed by a cascading school delete.
pub async fn release_orphans(conn: &mut PgConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"UPDATE system_ids s SET released_at = NOW()
           WHERE s.released_at IS NULL
             AND NOT EXISTS (SELECT 1 FROM users WHERE id = s.entity_id)
             AND NOT EXISTS (SELECT 1 FROM schools WHERE id = s.entity_id)
             AND NOT EXISTS (SELECT 1 FROM school_students WHERE id = s.entity_id)
             AND NOT EXISTS (SELECT 1 FROM families WHERE id = s.entity_id)
             AND NOT EXISTS (SELECT 1 FROM family_members WHERE id = s.entity_id)
             AND NOT EXISTS (SELECT 1 FROM group_classes WHERE id = s.entity_id)"#,
    )
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
