use anyhow::anyhow;
use learnhub_cache::{RedisCache, invalidate, keys};
use learnhub_config::AppConfig;
use learnhub_core::{AppError, SystemIdGenerator, SystemIdKind, SystemIdOwner};
use learnhub_models::enrollments::Enrollment;
use learnhub_models::id_cards::{CardHolder, CardResolution, IdCard, IssuedCardsResponse};
use learnhub_models::system_ids::entity_types;
use learnhub_models::{CardHolderType, EnrollmentStatus, EnrollmentType};
use learnhub_observability::{track_card_scanned, track_cards_issued};
use rand::RngCore;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::modules::enrollments::service::EnrollmentService;
use crate::modules::system_ids::service::SystemIdService;

const CARD_COLUMNS: &str = "id, card_number, holder_type, holder_id, enrollment_id, holder_name, \
     qr_token, redirect_url, scan_count, last_scanned_at, issued_at, revoked_at";

/// 32 random bytes, hex encoded.
pub fn generate_qr_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn holder_type_for(enrollment_type: EnrollmentType) -> CardHolderType {
    match enrollment_type {
        EnrollmentType::Individual => CardHolderType::Student,
        EnrollmentType::Family => CardHolderType::Family,
        EnrollmentType::Group => CardHolderType::Group,
        EnrollmentType::School => CardHolderType::School,
    }
}

type HolderRow = (Uuid, String, Option<String>);

pub struct IdCardService;

impl IdCardService {
    /// Entities that carry a card for `enrollment`.
    async fn holders(
        conn: &mut PgConnection,
        enrollment: &Enrollment,
    ) -> Result<Vec<CardHolder>, AppError> {
        let (sql, reference): (&str, Uuid) = match enrollment.enrollment_type {
            EnrollmentType::Individual => (
                "SELECT id, first_name || ' ' || last_name, system_id FROM users WHERE id = $1",
                enrollment.user_id.into(),
            ),
            EnrollmentType::Family => (
                "SELECT id, first_name || ' ' || last_name, system_id FROM family_members
                 WHERE family_id = $1 ORDER BY created_at",
                enrollment
                    .family_id
                    .map(Uuid::from)
                    .ok_or_else(|| AppError::internal(anyhow!("Family enrollment without family")))?,
            ),
            EnrollmentType::Group => (
                "SELECT id, name, system_id FROM group_classes WHERE id = $1",
                enrollment
                    .group_class_id
                    .map(Uuid::from)
                    .ok_or_else(|| AppError::internal(anyhow!("Group enrollment without group")))?,
            ),
            EnrollmentType::School => (
                "SELECT id, first_name || ' ' || last_name, system_id FROM school_students
                 WHERE school_id = $1 ORDER BY last_name, first_name",
                enrollment
                    .school_id
                    .map(Uuid::from)
                    .ok_or_else(|| AppError::internal(anyhow!("School enrollment without school")))?,
            ),
        };

        let holder_type = holder_type_for(enrollment.enrollment_type);
        let rows = sqlx::query_as::<_, HolderRow>(sql)
            .bind(reference)
            .fetch_all(&mut *conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(holder_id, name, system_id)| CardHolder {
                holder_type,
                holder_id,
                name,
                system_id,
            })
            .collect())
    }

    /// Issue one card per enrolled entity. Cards that are already live are
    /// kept, so repeating the call only fills gaps.
    #[instrument(skip(db, generator, app_config), fields(enrollment.id = %enrollment_id, db.operation = "INSERT", db.table = "id_cards"))]
    pub async fn issue_cards(
        db: &PgPool,
        generator: &SystemIdGenerator,
        app_config: &AppConfig,
        enrollment_id: Uuid,
    ) -> Result<IssuedCardsResponse, AppError> {
        let mut tx = db.begin().await?;
        let enrollment = EnrollmentService::find(&mut tx, enrollment_id, true).await?;

        if enrollment.status != EnrollmentStatus::Approved {
            return Err(AppError::conflict(anyhow!(
                "Cards can only be issued for approved enrollments (status is {})",
                enrollment.status
            )));
        }

        let holders = Self::holders(&mut tx, &enrollment).await?;
        if holders.is_empty() {
            return Err(AppError::unprocessable(anyhow!("Enrollment has no card holders")));
        }

        let mut newly_issued = 0usize;
        for holder in holders {
            let card_number = match holder.system_id {
                Some(system_id) => system_id,
                None => {
                    // Only user accounts can lack a system id.
                    let owner = SystemIdOwner::new(entity_types::USERS, holder.holder_id);
                    let system_id =
                        SystemIdService::claim(&mut tx, generator, SystemIdKind::Student, owner).await?;
                    sqlx::query("UPDATE users SET system_id = $2, updated_at = NOW() WHERE id = $1")
                        .bind(holder.holder_id)
                        .bind(&system_id)
                        .execute(&mut *tx)
                        .await?;
                    system_id
                }
            };

            let qr_token = generate_qr_token();
            let inserted = sqlx::query(
                "INSERT INTO id_cards
                    (card_number, holder_type, holder_id, enrollment_id, holder_name, qr_token, redirect_url)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (enrollment_id, card_number) WHERE revoked_at IS NULL DO NOTHING",
            )
            .bind(&card_number)
            .bind(holder.holder_type)
            .bind(holder.holder_id)
            .bind(enrollment_id)
            .bind(&holder.name)
            .bind(&qr_token)
            .bind(app_config.card_scan_url(&qr_token))
            .execute(&mut *tx)
            .await?;

            newly_issued += inserted.rows_affected() as usize;
        }

        let cards = sqlx::query_as::<_, IdCard>(&format!(
            "SELECT {CARD_COLUMNS} FROM id_cards
             WHERE enrollment_id = $1 AND revoked_at IS NULL
             ORDER BY issued_at, card_number"
        ))
        .bind(enrollment_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let holder_type = holder_type_for(enrollment.enrollment_type);
        track_cards_issued(holder_type.as_str(), newly_issued);
        info!(newly_issued, live = cards.len(), "ID cards issued");

        Ok(IssuedCardsResponse {
            enrollment_id: enrollment.id,
            cards,
            newly_issued,
        })
    }

    #[instrument(skip(db), fields(enrollment.id = %enrollment_id, db.operation = "SELECT", db.table = "id_cards"))]
    pub async fn list_for_enrollment(db: &PgPool, enrollment_id: Uuid) -> Result<Vec<IdCard>, AppError> {
        EnrollmentService::get_enrollment(db, enrollment_id).await?;

        let cards = sqlx::query_as::<_, IdCard>(&format!(
            "SELECT {CARD_COLUMNS} FROM id_cards WHERE enrollment_id = $1 ORDER BY issued_at, card_number"
        ))
        .bind(enrollment_id)
        .fetch_all(db)
        .await?;

        Ok(cards)
    }

    #[instrument(skip(db), fields(card.id = %card_id, db.operation = "SELECT", db.table = "id_cards"))]
    pub async fn get_card(db: &PgPool, card_id: Uuid) -> Result<IdCard, AppError> {
        sqlx::query_as::<_, IdCard>(&format!("SELECT {CARD_COLUMNS} FROM id_cards WHERE id = $1"))
            .bind(card_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("ID card not found")))
    }

    #[instrument(skip(db, cache), fields(card.id = %card_id, db.operation = "UPDATE", db.table = "id_cards"))]
    pub async fn revoke_card(
        db: &PgPool,
        cache: Option<&RedisCache>,
        card_id: Uuid,
    ) -> Result<IdCard, AppError> {
        let card = Self::get_card(db, card_id).await?;
        if card.is_revoked() {
            return Err(AppError::conflict(anyhow!("ID card is already revoked")));
        }

        let card = sqlx::query_as::<_, IdCard>(&format!(
            "UPDATE id_cards SET revoked_at = NOW()
             WHERE id = $1 AND revoked_at IS NULL
             RETURNING {CARD_COLUMNS}"
        ))
        .bind(card_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::conflict(anyhow!("ID card is already revoked")))?;

        invalidate::card(cache, &card.qr_token).await;

        info!(card.id = %card.id, card.number = %card.card_number, "ID card revoked");
        Ok(card)
    }

    /// Revoke every live card held by one of `holder_ids`. Returns the QR
    /// tokens of the revoked cards so callers can evict them once committed.
    pub(crate) async fn revoke_for_holders(
        conn: &mut PgConnection,
        holder_ids: &[Uuid],
    ) -> Result<Vec<String>, sqlx::Error> {
        if holder_ids.is_empty() {
            return Ok(Vec::new());
        }

        let tokens = sqlx::query_scalar::<_, String>(
            "UPDATE id_cards SET revoked_at = NOW()
             WHERE revoked_at IS NULL AND holder_id = ANY($1)
             RETURNING qr_token",
        )
        .bind(holder_ids)
        .fetch_all(conn)
        .await?;

        if !tokens.is_empty() {
            debug!(revoked = tokens.len(), "Revoked cards of removed holders");
        }
        Ok(tokens)
    }

    /// Count a scan and return where to send the scanner.
    #[instrument(skip(db, app_config, qr_token), fields(db.operation = "UPDATE", db.table = "id_cards"))]
    pub async fn scan(db: &PgPool, app_config: &AppConfig, qr_token: &str) -> Result<String, AppError> {
        let card = sqlx::query_as::<_, IdCard>(&format!(
            "UPDATE id_cards SET scan_count = scan_count + 1, last_scanned_at = NOW()
             WHERE qr_token = $1 AND revoked_at IS NULL
             RETURNING {CARD_COLUMNS}"
        ))
        .bind(qr_token)
        .fetch_optional(db)
        .await?;

        let Some(card) = card else {
            track_card_scanned("not_found");
            debug!("Scanned token matches no live card");
            return Err(AppError::not_found(anyhow!("ID card not found")));
        };

        track_card_scanned("redirected");
        debug!(card.id = %card.id, scan_count = card.scan_count, "ID card scanned");

        Ok(app_config.enrollment_url(card.enrollment_id, &card.card_number))
    }

    #[instrument(skip(db, cache, app_config, qr_token), fields(db.operation = "SELECT", db.table = "id_cards"))]
    pub async fn resolve(
        db: &PgPool,
        cache: Option<&RedisCache>,
        app_config: &AppConfig,
        qr_token: &str,
    ) -> Result<CardResolution, AppError> {
        let cache_key = keys::cards::by_token(qr_token);

        if let Some(cache) = cache
            && let Some(resolution) = cache.get::<CardResolution>(&cache_key).await
        {
            return Ok(resolution);
        }

        let card = sqlx::query_as::<_, IdCard>(&format!(
            "SELECT {CARD_COLUMNS} FROM id_cards WHERE qr_token = $1 AND revoked_at IS NULL"
        ))
        .bind(qr_token)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("ID card not found")))?;

        let enrollment = EnrollmentService::get_enrollment(db, card.enrollment_id.into()).await?;
        let redirect_to = app_config.enrollment_url(card.enrollment_id, &card.card_number);
        let resolution = CardResolution {
            card,
            enrollment,
            redirect_to,
        };

        if let Some(cache) = cache
            && let Err(e) = cache.set(&cache_key, &resolution).await
        {
            warn!(error = %e, "Failed to cache card resolution");
        }

        Ok(resolution)
    }
}
