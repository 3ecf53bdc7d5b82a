use anyhow::anyhow;
use learnhub_cache::{RedisCache, hash_filters, invalidate, keys};
use learnhub_core::{AppError, PaginationMeta, PaginationParams};
use learnhub_db::constraints::foreign_key_violation;
use learnhub_models::projects::{
    CreateProjectDto, PaginatedProjectsResponse, ProjectFilterParams, ShowcaseParams,
    StudentProject, UpdateProjectDto,
};
use sqlx::PgPool;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::utils::query::Filters;

const PROJECT_COLUMNS: &str = "id, owner_id, title, description, project_url, thumbnail_url, \
     class_name, is_published, is_featured, created_at, updated_at";

/// Publication changes a project can go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Publish,
    Unpublish,
    Feature,
    Unfeature,
}

impl Visibility {
    /// `SET` clause for the change. Unpublishing also clears the featured
    /// flag; featuring is guarded by `is_published` in the `WHERE` clause.
    fn assignment(self) -> &'static str {
        match self {
            Self::Publish => "is_published = TRUE",
            Self::Unpublish => "is_published = FALSE, is_featured = FALSE",
            Self::Feature => "is_featured = TRUE",
            Self::Unfeature => "is_featured = FALSE",
        }
    }

    fn guard(self) -> &'static str {
        match self {
            Self::Feature => " AND is_published",
            _ => "",
        }
    }
}

pub struct ProjectService;

impl ProjectService {
    #[instrument(skip(db, cache, dto), fields(owner.id = %dto.owner_id, db.operation = "INSERT", db.table = "student_projects"))]
    pub async fn create_project(
        db: &PgPool,
        cache: Option<&RedisCache>,
        dto: CreateProjectDto,
    ) -> Result<StudentProject, AppError> {
        let project = sqlx::query_as::<_, StudentProject>(&format!(
            "INSERT INTO student_projects (owner_id, title, description, project_url, thumbnail_url, class_name)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(dto.owner_id)
        .bind(&dto.title)
        .bind(&dto.description)
        .bind(&dto.project_url)
        .bind(&dto.thumbnail_url)
        .bind(&dto.class_name)
        .fetch_one(db)
        .await
        .map_err(|e| match foreign_key_violation(&e) {
            Some(_) => AppError::not_found(anyhow!("Owner not found")),
            None => AppError::database(e),
        })?;

        invalidate::showcase(cache).await;

        info!(project.id = %project.id, "Project created");
        Ok(project)
    }

    #[instrument(skip(db), fields(project.id = %project_id, db.operation = "SELECT", db.table = "student_projects"))]
    pub async fn get_project(db: &PgPool, project_id: Uuid) -> Result<StudentProject, AppError> {
        sqlx::query_as::<_, StudentProject>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM student_projects WHERE id = $1"
        ))
        .bind(project_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Project not found")))
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "student_projects"))]
    pub async fn list_projects(
        db: &PgPool,
        filters: ProjectFilterParams,
    ) -> Result<PaginatedProjectsResponse, AppError> {
        let mut conditions = Filters::new();
        conditions
            .push_opt("owner_id = {}::uuid", filters.owner_id)
            .push_opt("is_published = {}::boolean", filters.is_published);

        Self::page(db, &conditions, "created_at DESC", &filters.pagination).await
    }

    #[instrument(skip(db, pagination), fields(owner.id = %owner_id, db.operation = "SELECT", db.table = "student_projects"))]
    pub async fn list_by_owner(
        db: &PgPool,
        owner_id: Uuid,
        pagination: PaginationParams,
    ) -> Result<PaginatedProjectsResponse, AppError> {
        let owner_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(owner_id)
                .fetch_one(db)
                .await?;
        if !owner_exists {
            return Err(AppError::not_found(anyhow!("Owner not found")));
        }

        let mut conditions = Filters::new();
        conditions.push("owner_id = {}::uuid", owner_id);

        Self::page(db, &conditions, "created_at DESC", &pagination).await
    }

    async fn page(
        db: &PgPool,
        conditions: &Filters,
        order_by: &str,
        pagination: &PaginationParams,
    ) -> Result<PaginatedProjectsResponse, AppError> {
        let total = conditions.count(db, "student_projects").await?;
        let projects = conditions
            .fetch_page::<StudentProject>(
                db,
                &format!("SELECT {PROJECT_COLUMNS} FROM student_projects"),
                order_by,
                pagination.limit(),
                pagination.offset(),
            )
            .await?;

        Ok(PaginatedProjectsResponse {
            data: projects,
            meta: PaginationMeta::new(total, pagination),
        })
    }

    #[instrument(skip(db, cache, dto), fields(project.id = %project_id, db.operation = "UPDATE", db.table = "student_projects"))]
    pub async fn update_project(
        db: &PgPool,
        cache: Option<&RedisCache>,
        project_id: Uuid,
        dto: UpdateProjectDto,
    ) -> Result<StudentProject, AppError> {
        let project = sqlx::query_as::<_, StudentProject>(&format!(
            "UPDATE student_projects SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                project_url = COALESCE($4, project_url),
                thumbnail_url = COALESCE($5, thumbnail_url),
                class_name = COALESCE($6, class_name),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(project_id)
        .bind(&dto.title)
        .bind(&dto.description)
        .bind(&dto.project_url)
        .bind(&dto.thumbnail_url)
        .bind(&dto.class_name)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Project not found")))?;

        invalidate::showcase(cache).await;

        info!(project.id = %project.id, "Project updated");
        Ok(project)
    }

    #[instrument(skip(db, cache), fields(project.id = %project_id, db.operation = "DELETE", db.table = "student_projects"))]
    pub async fn delete_project(
        db: &PgPool,
        cache: Option<&RedisCache>,
        project_id: Uuid,
    ) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM student_projects WHERE id = $1")
            .bind(project_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Project not found")));
        }

        invalidate::showcase(cache).await;

        info!(project.id = %project_id, "Project deleted");
        Ok(())
    }

    #[instrument(skip(db, cache), fields(project.id = %project_id, change = ?change, db.operation = "UPDATE", db.table = "student_projects"))]
    pub async fn set_visibility(
        db: &PgPool,
        cache: Option<&RedisCache>,
        project_id: Uuid,
        change: Visibility,
    ) -> Result<StudentProject, AppError> {
        let updated = sqlx::query_as::<_, StudentProject>(&format!(
            "UPDATE student_projects SET {}, updated_at = NOW()
             WHERE id = $1{}
             RETURNING {PROJECT_COLUMNS}",
            change.assignment(),
            change.guard()
        ))
        .bind(project_id)
        .fetch_optional(db)
        .await?;

        let project = match updated {
            Some(project) => project,
            None => {
                // Distinguish a missing project from an unpublished one.
                Self::get_project(db, project_id).await?;
                warn!("Attempted to feature an unpublished project");
                return Err(AppError::conflict(anyhow!(
                    "Only published projects can be featured"
                )));
            }
        };

        invalidate::showcase(cache).await;

        info!(
            project.id = %project.id,
            is_published = project.is_published,
            is_featured = project.is_featured,
            "Project visibility changed"
        );
        Ok(project)
    }

    /// Public showcase: published projects, featured first, newest first.
    #[instrument(skip(db, cache, params), fields(db.operation = "SELECT", db.table = "student_projects"))]
    pub async fn showcase(
        db: &PgPool,
        cache: Option<&RedisCache>,
        params: ShowcaseParams,
    ) -> Result<PaginatedProjectsResponse, AppError> {
        let cache_key = keys::showcase::list(&hash_filters(&params));

        if let Some(cache) = cache
            && let Some(page) = cache.get::<PaginatedProjectsResponse>(&cache_key).await
        {
            debug!("Showcase page served from cache");
            return Ok(page);
        }

        let mut conditions = Filters::new();
        conditions
            .push_raw("is_published")
            .push_opt("class_name = {}", params.class_name.as_deref());

        let page = Self::page(
            db,
            &conditions,
            "is_featured DESC, created_at DESC",
            &params.pagination,
        )
        .await?;

        if let Some(cache) = cache
            && let Err(e) = cache.set(&cache_key, &page).await
        {
            warn!(error = %e, "Failed to cache showcase page");
        }

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpublish_clears_featured() {
        assert!(Visibility::Unpublish.assignment().contains("is_featured = FALSE"));
    }

    #[test]
    fn test_only_feature_requires_published() {
        assert_eq!(Visibility::Feature.guard(), " AND is_published");
        for change in [Visibility::Publish, Visibility::Unpublish, Visibility::Unfeature] {
            assert!(change.guard().is_empty());
        }
    }
}
