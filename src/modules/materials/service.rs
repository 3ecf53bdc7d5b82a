use anyhow::anyhow;
use learnhub_core::{AppError, PaginationMeta};
use learnhub_db::constraints::foreign_key_violation;
use learnhub_models::EnrollmentStatus;
use learnhub_models::materials::{
    CreateMaterialDto, LearningMaterial, MaterialFilterParams, PaginatedMaterialsResponse,
    UpdateMaterialDto,
};
use sqlx::PgPool;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::modules::enrollments::service::EnrollmentService;
use crate::utils::query::Filters;

const MATERIAL_COLUMNS: &str = "id, class_name, title, description, resource_url, material_type, \
     group_class_id, school_id, is_published, created_at, updated_at";

pub struct MaterialService;

impl MaterialService {
    #[instrument(skip(db, dto), fields(class.name = %dto.class_name, db.operation = "INSERT", db.table = "learning_materials"))]
    pub async fn create_material(
        db: &PgPool,
        dto: CreateMaterialDto,
    ) -> Result<LearningMaterial, AppError> {
        let material = sqlx::query_as::<_, LearningMaterial>(&format!(
            "INSERT INTO learning_materials
                (class_name, title, description, resource_url, material_type, group_class_id, school_id, is_published)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {MATERIAL_COLUMNS}"
        ))
        .bind(&dto.class_name)
        .bind(&dto.title)
        .bind(&dto.description)
        .bind(&dto.resource_url)
        .bind(dto.material_type)
        .bind(dto.group_class_id)
        .bind(dto.school_id)
        .bind(dto.is_published)
        .fetch_one(db)
        .await
        .map_err(|e| match foreign_key_violation(&e) {
            Some(_) => AppError::not_found(anyhow!("Group class or school not found")),
            None => AppError::database(e),
        })?;

        info!(material.id = %material.id, "Learning material created");
        Ok(material)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "learning_materials"))]
    pub async fn list_materials(
        db: &PgPool,
        filters: MaterialFilterParams,
    ) -> Result<PaginatedMaterialsResponse, AppError> {
        let mut conditions = Filters::new();
        conditions
            .push_opt("class_name = {}", filters.class_name.as_deref())
            .push_opt("material_type = {}", filters.material_type)
            .push_opt("is_published = {}::boolean", filters.is_published)
            .push_opt("group_class_id = {}::uuid", filters.group_class_id)
            .push_opt("school_id = {}::uuid", filters.school_id);

        let total = conditions.count(db, "learning_materials").await?;
        let materials = conditions
            .fetch_page::<LearningMaterial>(
                db,
                &format!("SELECT {MATERIAL_COLUMNS} FROM learning_materials"),
                "created_at DESC",
                filters.pagination.limit(),
                filters.pagination.offset(),
            )
            .await?;

        Ok(PaginatedMaterialsResponse {
            data: materials,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db), fields(material.id = %material_id, db.operation = "SELECT", db.table = "learning_materials"))]
    pub async fn get_material(db: &PgPool, material_id: Uuid) -> Result<LearningMaterial, AppError> {
        sqlx::query_as::<_, LearningMaterial>(&format!(
            "SELECT {MATERIAL_COLUMNS} FROM learning_materials WHERE id = $1"
        ))
        .bind(material_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Learning material not found")))
    }

    #[instrument(skip(db, dto), fields(material.id = %material_id, db.operation = "UPDATE", db.table = "learning_materials"))]
    pub async fn update_material(
        db: &PgPool,
        material_id: Uuid,
        dto: UpdateMaterialDto,
    ) -> Result<LearningMaterial, AppError> {
        let material = sqlx::query_as::<_, LearningMaterial>(&format!(
            "UPDATE learning_materials SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                resource_url = COALESCE($4, resource_url),
                material_type = COALESCE($5, material_type),
                is_published = COALESCE($6, is_published),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {MATERIAL_COLUMNS}"
        ))
        .bind(material_id)
        .bind(&dto.title)
        .bind(&dto.description)
        .bind(&dto.resource_url)
        .bind(dto.material_type)
        .bind(dto.is_published)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Learning material not found")))?;

        info!(material.id = %material.id, "Learning material updated");
        Ok(material)
    }

    #[instrument(skip(db), fields(material.id = %material_id, db.operation = "DELETE", db.table = "learning_materials"))]
    pub async fn delete_material(db: &PgPool, material_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM learning_materials WHERE id = $1")
            .bind(material_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Learning material not found")));
        }

        info!(material.id = %material_id, "Learning material deleted");
        Ok(())
    }

    /// Published materials an approved enrollment may access: those of its
    /// class that are unscoped or scoped to its group or school.
    #[instrument(skip(db), fields(enrollment.id = %enrollment_id, db.operation = "SELECT", db.table = "learning_materials"))]
    pub async fn materials_for_enrollment(
        db: &PgPool,
        enrollment_id: Uuid,
    ) -> Result<Vec<LearningMaterial>, AppError> {
        let enrollment = EnrollmentService::get_enrollment(db, enrollment_id).await?;
        if enrollment.status != EnrollmentStatus::Approved {
            return Err(AppError::conflict(anyhow!(
                "Materials are only available to approved enrollments (status is {})",
                enrollment.status
            )));
        }

        let materials = sqlx::query_as::<_, LearningMaterial>(&format!(
            "SELECT {MATERIAL_COLUMNS} FROM learning_materials
             WHERE class_name = $1
               AND is_published
               AND (group_class_id IS NULL OR group_class_id = $2)
               AND (school_id IS NULL OR school_id = $3)
             ORDER BY created_at"
        ))
        .bind(&enrollment.class_name)
        .bind(enrollment.group_class_id)
        .bind(enrollment.school_id)
        .fetch_all(db)
        .await?;

        debug!(count = materials.len(), "Materials resolved for enrollment");
        Ok(materials)
    }
}
