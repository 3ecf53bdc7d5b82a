use anyhow::anyhow;
use learnhub_cache::{RedisCache, invalidate};
use learnhub_core::{AppError, SystemIdGenerator, SystemIdKind, SystemIdOwner};
use learnhub_db::constraints::foreign_key_violation;
use learnhub_models::families::{
    AddFamilyMemberDto, CreateFamilyDto, Family, FamilyMember, FamilyWithMembers,
};
use learnhub_models::system_ids::entity_types;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::modules::id_cards::service::IdCardService;
use crate::modules::system_ids::service::SystemIdService;

const FAMILY_COLUMNS: &str = "id, system_id, guardian_id, name, created_at, updated_at";
const MEMBER_COLUMNS: &str =
    "id, family_id, system_id, first_name, last_name, relationship, date_of_birth, created_at";

pub struct FamilyService;

impl FamilyService {
    #[instrument(skip(db, generator, dto), fields(guardian.id = %dto.guardian_id, db.operation = "INSERT", db.table = "families"))]
    pub async fn create_family(
        db: &PgPool,
        generator: &SystemIdGenerator,
        dto: CreateFamilyDto,
    ) -> Result<Family, AppError> {
        let mut tx = db.begin().await?;
        let family_id = Uuid::new_v4();
        let owner = SystemIdOwner::new(entity_types::FAMILIES, family_id);
        let system_id = SystemIdService::claim(&mut tx, generator, SystemIdKind::Family, owner).await?;

        let family = sqlx::query_as::<_, Family>(&format!(
            "INSERT INTO families (id, system_id, guardian_id, name)
             VALUES ($1, $2, $3, $4)
             RETURNING {FAMILY_COLUMNS}"
        ))
        .bind(family_id)
        .bind(&system_id)
        .bind(dto.guardian_id)
        .bind(&dto.name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match foreign_key_violation(&e) {
            Some("families_guardian_id_fkey") => {
                AppError::not_found(anyhow!("Guardian user not found"))
            }
            _ => AppError::database(e),
        })?;

        tx.commit().await?;

        info!(family.id = %family.id, family.system_id = %family.system_id, "Family created");
        Ok(family)
    }

    #[instrument(skip(db), fields(family.id = %family_id, db.operation = "SELECT", db.table = "families"))]
    pub async fn get_family(db: &PgPool, family_id: Uuid) -> Result<FamilyWithMembers, AppError> {
        let family = sqlx::query_as::<_, Family>(&format!(
            "SELECT {FAMILY_COLUMNS} FROM families WHERE id = $1"
        ))
        .bind(family_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Family not found")))?;

        let members = sqlx::query_as::<_, FamilyMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM family_members WHERE family_id = $1 ORDER BY created_at"
        ))
        .bind(family_id)
        .fetch_all(db)
        .await?;

        Ok(FamilyWithMembers { family, members })
    }

    #[instrument(skip(db, generator, dto), fields(family.id = %family_id, db.operation = "INSERT", db.table = "family_members"))]
    pub async fn add_member(
        db: &PgPool,
        generator: &SystemIdGenerator,
        family_id: Uuid,
        dto: AddFamilyMemberDto,
    ) -> Result<FamilyMember, AppError> {
        let mut tx = db.begin().await?;

        // Held until commit; a concurrent delete waits for the insert.
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM families WHERE id = $1 FOR UPDATE")
            .bind(family_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Family not found")))?;

        let member_id = Uuid::new_v4();
        let owner = SystemIdOwner::new(entity_types::FAMILY_MEMBERS, member_id);
        let system_id = SystemIdService::claim(&mut tx, generator, SystemIdKind::Student, owner).await?;

        let member = sqlx::query_as::<_, FamilyMember>(&format!(
            "INSERT INTO family_members (id, family_id, system_id, first_name, last_name, relationship, date_of_birth)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(member_id)
        .bind(family_id)
        .bind(&system_id)
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(&dto.relationship)
        .bind(dto.date_of_birth)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(member.id = %member.id, member.system_id = %member.system_id, "Family member added");
        Ok(member)
    }

    #[instrument(skip(db, cache), fields(family.id = %family_id, member.id = %member_id, db.operation = "DELETE", db.table = "family_members"))]
    pub async fn remove_member(
        db: &PgPool,
        cache: Option<&RedisCache>,
        family_id: Uuid,
        member_id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let system_id = sqlx::query_scalar::<_, String>(
            "DELETE FROM family_members WHERE id = $1 AND family_id = $2 RETURNING system_id",
        )
        .bind(member_id)
        .bind(family_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            warn!("Family member not found");
            AppError::not_found(anyhow!("Family member not found"))
        })?;

        SystemIdService::release(&mut tx, member_id).await?;
        let revoked = IdCardService::revoke_for_holders(&mut tx, &[member_id]).await?;
        tx.commit().await?;

        invalidate::system_id(cache, &system_id).await;
        for qr_token in &revoked {
            invalidate::card(cache, qr_token).await;
        }

        info!(member.id = %member_id, "Family member removed");
        Ok(())
    }
}
