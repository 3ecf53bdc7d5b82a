use anyhow::anyhow;
use learnhub_core::{AppError, PaginationMeta};
use learnhub_db::constraints::{foreign_key_violation, unique_violation};
use learnhub_models::enrollments::{
    CreateEnrollmentDto, Enrollment, EnrollmentAction, EnrollmentFilterParams,
    PaginatedEnrollmentsResponse,
};
use learnhub_models::EnrollmentType;
use learnhub_observability::{track_enrollment_created, track_enrollment_transition};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::modules::groups::service::GroupService;
use crate::utils::query::Filters;

pub const ENROLLMENT_COLUMNS: &str = "id, user_id, class_name, enrollment_type, status, \
     payment_status, group_class_id, family_id, school_id, monthly_fee_cents, notes, \
     approved_at, created_at, updated_at";

pub struct EnrollmentService;

impl EnrollmentService {
    #[instrument(skip(db, dto), fields(enrollment.type = %dto.enrollment_type, user.id = %dto.user_id, db.operation = "INSERT", db.table = "class_enrollments"))]
    pub async fn create_enrollment(
        db: &PgPool,
        dto: CreateEnrollmentDto,
    ) -> Result<Enrollment, AppError> {
        dto.check_reference()
            .map_err(|msg| AppError::unprocessable(anyhow!(msg)))?;

        let mut tx = db.begin().await?;
        Self::check_reference_target(&mut tx, &dto).await?;

        let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
            "INSERT INTO class_enrollments
                (user_id, class_name, enrollment_type, group_class_id, family_id, school_id, monthly_fee_cents, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {ENROLLMENT_COLUMNS}"
        ))
        .bind(dto.user_id)
        .bind(&dto.class_name)
        .bind(dto.enrollment_type)
        .bind(dto.group_class_id)
        .bind(dto.family_id)
        .bind(dto.school_id)
        .bind(dto.monthly_fee_cents)
        .bind(&dto.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let Some("class_enrollments_active_key") = unique_violation(&e) {
                warn!(user.id = %dto.user_id, class.name = %dto.class_name, "Duplicate active enrollment");
                return AppError::conflict(anyhow!(
                    "An active {} enrollment for {} already exists",
                    dto.enrollment_type,
                    dto.class_name
                ));
            }
            match foreign_key_violation(&e) {
                Some("class_enrollments_user_id_fkey") => {
                    AppError::not_found(anyhow!("User not found"))
                }
                _ => AppError::database(e),
            }
        })?;

        tx.commit().await?;

        track_enrollment_created(enrollment.enrollment_type.as_str());
        info!(enrollment.id = %enrollment.id, "Enrollment created");

        Ok(enrollment)
    }

    /// The referenced group must have a free seat, the family at least one
    /// member. Rows are locked so concurrent enrollments see the same counts.
    async fn check_reference_target(
        conn: &mut PgConnection,
        dto: &CreateEnrollmentDto,
    ) -> Result<(), AppError> {
        match dto.enrollment_type {
            EnrollmentType::Individual => Ok(()),
            EnrollmentType::Group => {
                let Some(group_id) = dto.group_class_id else {
                    return Err(AppError::unprocessable(anyhow!("group_class_id is required")));
                };
                let group = GroupService::find_with_stats(conn, group_id.into(), true)
                    .await?
                    .ok_or_else(|| AppError::not_found(anyhow!("Group class not found")))?;
                if group.group.class_name != dto.class_name {
                    return Err(AppError::unprocessable(anyhow!(
                        "Group class belongs to {}, not {}",
                        group.group.class_name,
                        dto.class_name
                    )));
                }
                if !group.has_capacity() {
                    return Err(AppError::conflict(anyhow!(
                        "Group class is full ({} members)",
                        group.group.max_members
                    )));
                }
                Ok(())
            }
            EnrollmentType::Family => {
                let Some(family_id) = dto.family_id else {
                    return Err(AppError::unprocessable(anyhow!("family_id is required")));
                };
                let members = sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(m.id) FROM families f
                     LEFT JOIN family_members m ON m.family_id = f.id
                     WHERE f.id = $1
                     GROUP BY f.id",
                )
                .bind(family_id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| AppError::not_found(anyhow!("Family not found")))?;
                if members == 0 {
                    return Err(AppError::unprocessable(anyhow!(
                        "Family has no members to enroll"
                    )));
                }
                Ok(())
            }
            EnrollmentType::School => {
                let Some(school_id) = dto.school_id else {
                    return Err(AppError::unprocessable(anyhow!("school_id is required")));
                };
                sqlx::query_scalar::<_, Uuid>("SELECT id FROM schools WHERE id = $1 FOR SHARE")
                    .bind(school_id)
                    .fetch_optional(&mut *conn)
                    .await?
                    .ok_or_else(|| AppError::not_found(anyhow!("School not found")))?;
                Ok(())
            }
        }
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "class_enrollments"))]
    pub async fn list_enrollments(
        db: &PgPool,
        filters: EnrollmentFilterParams,
    ) -> Result<PaginatedEnrollmentsResponse, AppError> {
        let mut conditions = Filters::new();
        conditions
            .push_opt("status = {}", filters.status)
            .push_opt("enrollment_type = {}", filters.enrollment_type)
            .push_opt("class_name = {}", filters.class_name.as_deref())
            .push_opt("user_id = {}::uuid", filters.user_id);

        let total = conditions.count(db, "class_enrollments").await?;
        let enrollments = conditions
            .fetch_page::<Enrollment>(
                db,
                &format!("SELECT {ENROLLMENT_COLUMNS} FROM class_enrollments"),
                "created_at DESC",
                filters.pagination.limit(),
                filters.pagination.offset(),
            )
            .await?;

        debug!(total, returned = enrollments.len(), "Enrollments fetched");

        Ok(PaginatedEnrollmentsResponse {
            data: enrollments,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db), fields(enrollment.id = %enrollment_id, db.operation = "SELECT", db.table = "class_enrollments"))]
    pub async fn get_enrollment(db: &PgPool, enrollment_id: Uuid) -> Result<Enrollment, AppError> {
        let mut conn = db.acquire().await?;
        Self::find(&mut conn, enrollment_id, false).await
    }

    /// Fetch an enrollment, 404 when missing. With `lock` the row stays
    /// locked until the surrounding transaction ends.
    pub(crate) async fn find(
        conn: &mut PgConnection,
        enrollment_id: Uuid,
        lock: bool,
    ) -> Result<Enrollment, AppError> {
        let sql = format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM class_enrollments WHERE id = $1{}",
            if lock { " FOR UPDATE" } else { "" }
        );
        sqlx::query_as::<_, Enrollment>(&sql)
            .bind(enrollment_id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Enrollment not found")))
    }

    #[instrument(skip(db), fields(enrollment.id = %enrollment_id, action = %action.as_str(), db.operation = "UPDATE", db.table = "class_enrollments"))]
    pub async fn transition(
        db: &PgPool,
        enrollment_id: Uuid,
        action: EnrollmentAction,
    ) -> Result<Enrollment, AppError> {
        let mut tx = db.begin().await?;
        let current = Self::find(&mut tx, enrollment_id, true).await?;

        if !action.can_apply(current.status) {
            warn!(status = %current.status, "Rejected enrollment transition");
            return Err(AppError::conflict(anyhow!(
                "Cannot {} an enrollment that is {}",
                action.as_str(),
                current.status
            )));
        }

        let enrollment = sqlx::query_as::<_, Enrollment>(&format!(
            "UPDATE class_enrollments SET
                status = $2,
                approved_at = CASE WHEN $3 THEN NOW() ELSE approved_at END,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {ENROLLMENT_COLUMNS}"
        ))
        .bind(enrollment_id)
        .bind(action.target())
        .bind(action == EnrollmentAction::Approve)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        track_enrollment_transition(action.as_str());
        info!(
            enrollment.id = %enrollment.id,
            from = %current.status,
            to = %enrollment.status,
            "Enrollment transitioned"
        );

        Ok(enrollment)
    }
}
