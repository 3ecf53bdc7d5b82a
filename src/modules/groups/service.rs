use anyhow::anyhow;
use learnhub_core::{
    AppError, PaginationMeta, PaginationParams, SystemIdGenerator, SystemIdKind, SystemIdOwner,
};
use learnhub_db::constraints::foreign_key_violation;
use learnhub_models::enrollments::{Enrollment, PaginatedEnrollmentsResponse};
use learnhub_models::groups::{
    CreateGroupClassDto, GroupClass, GroupClassFilterParams, GroupClassWithStats,
    PaginatedGroupClassesResponse,
};
use learnhub_models::system_ids::entity_types;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::modules::enrollments::service::ENROLLMENT_COLUMNS;
use crate::modules::system_ids::service::SystemIdService;
use crate::utils::query::Filters;

const GROUP_COLUMNS: &str =
    "id, system_id, name, class_name, leader_id, max_members, created_at, updated_at";

/// Groups with the number of active (pending or approved) enrollments.
const GROUP_WITH_STATS: &str = "SELECT g.id, g.system_id, g.name, g.class_name, g.leader_id, \
     g.max_members, g.created_at, g.updated_at, \
     (SELECT COUNT(*) FROM class_enrollments e \
       WHERE e.group_class_id = g.id AND e.status IN ('pending', 'approved')) AS member_count \
     FROM group_classes g";

pub struct GroupService;

impl GroupService {
    #[instrument(skip(db, generator, dto), fields(group.name = %dto.name, db.operation = "INSERT", db.table = "group_classes"))]
    pub async fn create_group(
        db: &PgPool,
        generator: &SystemIdGenerator,
        dto: CreateGroupClassDto,
    ) -> Result<GroupClass, AppError> {
        let mut tx = db.begin().await?;
        let group_id = Uuid::new_v4();
        let owner = SystemIdOwner::new(entity_types::GROUP_CLASSES, group_id);
        let system_id = SystemIdService::claim(&mut tx, generator, SystemIdKind::Group, owner).await?;

        let group = sqlx::query_as::<_, GroupClass>(&format!(
            "INSERT INTO group_classes (id, system_id, name, class_name, leader_id, max_members)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {GROUP_COLUMNS}"
        ))
        .bind(group_id)
        .bind(&system_id)
        .bind(&dto.name)
        .bind(&dto.class_name)
        .bind(dto.leader_id)
        .bind(dto.max_members)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match foreign_key_violation(&e) {
            Some("group_classes_leader_id_fkey") => {
                AppError::not_found(anyhow!("Group leader not found"))
            }
            _ => AppError::database(e),
        })?;

        tx.commit().await?;

        info!(group.id = %group.id, group.system_id = %group.system_id, "Group class created");
        Ok(group)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "group_classes"))]
    pub async fn list_groups(
        db: &PgPool,
        filters: GroupClassFilterParams,
    ) -> Result<PaginatedGroupClassesResponse, AppError> {
        let mut conditions = Filters::new();
        conditions.push_like("g.class_name ILIKE {}", filters.class_name.as_deref());

        let total = conditions.count(db, "group_classes g").await?;
        let groups = conditions
            .fetch_page::<GroupClassWithStats>(
                db,
                GROUP_WITH_STATS,
                "g.created_at DESC",
                filters.pagination.limit(),
                filters.pagination.offset(),
            )
            .await?;

        debug!(total, returned = groups.len(), "Group classes fetched");

        Ok(PaginatedGroupClassesResponse {
            data: groups,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db), fields(group.id = %group_id, db.operation = "SELECT", db.table = "group_classes"))]
    pub async fn get_group(db: &PgPool, group_id: Uuid) -> Result<GroupClassWithStats, AppError> {
        let mut conn = db.acquire().await?;
        Self::find_with_stats(&mut conn, group_id, false)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Group class not found")))
    }

    /// Load a group with its member count. With `lock`, the group row is
    /// locked for the rest of the transaction before counting; the count runs
    /// as its own statement so it sees enrollments committed by whoever held
    /// the lock before.
    pub(crate) async fn find_with_stats(
        conn: &mut PgConnection,
        group_id: Uuid,
        lock: bool,
    ) -> Result<Option<GroupClassWithStats>, sqlx::Error> {
        if lock {
            let locked =
                sqlx::query_scalar::<_, Uuid>("SELECT id FROM group_classes WHERE id = $1 FOR UPDATE")
                    .bind(group_id)
                    .fetch_optional(&mut *conn)
                    .await?;
            if locked.is_none() {
                return Ok(None);
            }
        }

        sqlx::query_as::<_, GroupClassWithStats>(&format!("{GROUP_WITH_STATS} WHERE g.id = $1"))
            .bind(group_id)
            .fetch_optional(conn)
            .await
    }

    #[instrument(skip(db, pagination), fields(group.id = %group_id, db.operation = "SELECT", db.table = "class_enrollments"))]
    pub async fn list_member_enrollments(
        db: &PgPool,
        group_id: Uuid,
        pagination: PaginationParams,
    ) -> Result<PaginatedEnrollmentsResponse, AppError> {
        Self::get_group(db, group_id).await?;

        let mut conditions = Filters::new();
        conditions.push("group_class_id = {}::uuid", group_id);

        let total = conditions.count(db, "class_enrollments").await?;
        let enrollments = conditions
            .fetch_page::<Enrollment>(
                db,
                &format!("SELECT {ENROLLMENT_COLUMNS} FROM class_enrollments"),
                "created_at ASC",
                pagination.limit(),
                pagination.offset(),
            )
            .await?;

        Ok(PaginatedEnrollmentsResponse {
            data: enrollments,
            meta: PaginationMeta::new(total, &pagination),
        })
    }
}
