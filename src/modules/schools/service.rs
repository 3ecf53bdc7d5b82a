use anyhow::anyhow;
use learnhub_cache::{RedisCache, invalidate, keys};
use learnhub_core::{
    AppError, PaginationMeta, PaginationParams, SystemIdGenerator, SystemIdKind, SystemIdOwner,
};
use learnhub_db::constraints::{foreign_key_violation, unique_violation};
use learnhub_models::schools::{
    CreateSchoolDto, CreateSchoolStudentDto, PaginatedSchoolStudentsResponse,
    PaginatedSchoolsResponse, School, SchoolFilterParams, SchoolStudent, UpdateSchoolDto,
};
use learnhub_models::system_ids::entity_types;
use learnhub_models::{Email, PhoneNumber, ValueTypeError};
use learnhub_observability::track_school_created;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::modules::id_cards::service::IdCardService;
use crate::modules::system_ids::service::SystemIdService;
use crate::utils::query::Filters;

const SCHOOL_COLUMNS: &str =
    "id, system_id, name, address, contact_email, contact_phone, created_at, updated_at";
const STUDENT_COLUMNS: &str = "id, school_id, system_id, first_name, last_name, grade_level, created_at";

fn contact_details(
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<(Option<Email>, Option<PhoneNumber>), AppError> {
    let email = email.map(Email::new).transpose();
    let phone = phone.map(PhoneNumber::new).transpose();
    let to_422 = |e: ValueTypeError| AppError::unprocessable(e);
    Ok((email.map_err(to_422)?, phone.map_err(to_422)?))
}

fn school_write_error(e: sqlx::Error) -> AppError {
    match unique_violation(&e) {
        Some("schools_name_key") => {
            warn!("Attempted to use an existing school name");
            AppError::conflict(anyhow!("School name already exists"))
        }
        _ => {
            error!(error = %e, "Database error writing school");
            AppError::database(e)
        }
    }
}

pub struct SchoolService;

impl SchoolService {
    #[instrument(skip(db, generator, dto), fields(school.name = %dto.name, db.operation = "INSERT", db.table = "schools"))]
    pub async fn create_school(
        db: &PgPool,
        generator: &SystemIdGenerator,
        dto: CreateSchoolDto,
    ) -> Result<School, AppError> {
        let (contact_email, contact_phone) =
            contact_details(dto.contact_email.as_deref(), dto.contact_phone.as_deref())?;

        let mut tx = db.begin().await?;
        let school_id = Uuid::new_v4();
        let owner = SystemIdOwner::new(entity_types::SCHOOLS, school_id);
        let system_id = SystemIdService::claim(&mut tx, generator, SystemIdKind::School, owner).await?;

        let school = sqlx::query_as::<_, School>(&format!(
            "INSERT INTO schools (id, system_id, name, address, contact_email, contact_phone)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {SCHOOL_COLUMNS}"
        ))
        .bind(school_id)
        .bind(&system_id)
        .bind(&dto.name)
        .bind(&dto.address)
        .bind(&contact_email)
        .bind(&contact_phone)
        .fetch_one(&mut *tx)
        .await
        .map_err(school_write_error)?;

        tx.commit().await?;

        track_school_created();
        info!(school.id = %school.id, school.system_id = %school.system_id, "School created");

        Ok(school)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "schools"))]
    pub async fn list_schools(
        db: &PgPool,
        filters: SchoolFilterParams,
    ) -> Result<PaginatedSchoolsResponse, AppError> {
        let mut conditions = Filters::new();
        conditions.push_like("name ILIKE {}", filters.name.as_deref());

        let total = conditions.count(db, "schools").await?;
        let schools = conditions
            .fetch_page::<School>(
                db,
                &format!("SELECT {SCHOOL_COLUMNS} FROM schools"),
                "name ASC",
                filters.pagination.limit(),
                filters.pagination.offset(),
            )
            .await?;

        Ok(PaginatedSchoolsResponse {
            data: schools,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db, cache), fields(school.id = %school_id, db.operation = "SELECT", db.table = "schools"))]
    pub async fn get_school(
        db: &PgPool,
        cache: Option<&RedisCache>,
        school_id: Uuid,
    ) -> Result<School, AppError> {
        let cache_key = keys::schools::by_id(school_id);

        if let Some(cache) = cache
            && let Some(school) = cache.get::<School>(&cache_key).await
        {
            debug!(school.id = %school_id, "School found in cache");
            return Ok(school);
        }

        let school = sqlx::query_as::<_, School>(&format!(
            "SELECT {SCHOOL_COLUMNS} FROM schools WHERE id = $1"
        ))
        .bind(school_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("School not found")))?;

        if let Some(cache) = cache
            && let Err(e) = cache.set(&cache_key, &school).await
        {
            warn!(error = %e, "Failed to cache school");
        }

        Ok(school)
    }

    #[instrument(skip(db, cache, dto), fields(school.id = %school_id, db.operation = "UPDATE", db.table = "schools"))]
    pub async fn update_school(
        db: &PgPool,
        cache: Option<&RedisCache>,
        school_id: Uuid,
        dto: UpdateSchoolDto,
    ) -> Result<School, AppError> {
        let (contact_email, contact_phone) =
            contact_details(dto.contact_email.as_deref(), dto.contact_phone.as_deref())?;

        let school = sqlx::query_as::<_, School>(&format!(
            "UPDATE schools SET
                name = COALESCE($2, name),
                address = COALESCE($3, address),
                contact_email = COALESCE($4, contact_email),
                contact_phone = COALESCE($5, contact_phone),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {SCHOOL_COLUMNS}"
        ))
        .bind(school_id)
        .bind(&dto.name)
        .bind(&dto.address)
        .bind(&contact_email)
        .bind(&contact_phone)
        .fetch_optional(db)
        .await
        .map_err(school_write_error)?
        .ok_or_else(|| AppError::not_found(anyhow!("School not found")))?;

        invalidate::school(cache, school_id).await;
        invalidate::system_id(cache, &school.system_id).await;

        info!(school.id = %school.id, "School updated");
        Ok(school)
    }

    /// Delete a school with its roster. Schools referenced by enrollments are
    /// kept (409). Roster system ids are tombstoned and their cards revoked.
    #[instrument(skip(db, cache), fields(school.id = %school_id, db.operation = "DELETE", db.table = "schools"))]
    pub async fn delete_school(
        db: &PgPool,
        cache: Option<&RedisCache>,
        school_id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let roster = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, system_id FROM school_students WHERE school_id = $1 FOR UPDATE",
        )
        .bind(school_id)
        .fetch_all(&mut *tx)
        .await?;

        let system_id = sqlx::query_scalar::<_, String>(
            "DELETE FROM schools WHERE id = $1 RETURNING system_id",
        )
        .bind(school_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| match foreign_key_violation(&e) {
            Some(_) => AppError::conflict(anyhow!("School has enrollments and cannot be deleted")),
            None => AppError::database(e),
        })?
        .ok_or_else(|| AppError::not_found(anyhow!("School not found")))?;

        SystemIdService::release(&mut tx, school_id).await?;
        let student_ids: Vec<Uuid> = roster.iter().map(|(id, _)| *id).collect();
        let revoked = IdCardService::revoke_for_holders(&mut tx, &student_ids).await?;
        tx.commit().await?;

        invalidate::school(cache, school_id).await;
        invalidate::system_id(cache, &system_id).await;
        for (_, student_system_id) in &roster {
            invalidate::system_id(cache, student_system_id).await;
        }
        for qr_token in &revoked {
            invalidate::card(cache, qr_token).await;
        }

        info!(school.id = %school_id, roster = roster.len(), "School deleted");
        Ok(())
    }

    #[instrument(skip(db, generator, dto), fields(school.id = %school_id, db.operation = "INSERT", db.table = "school_students"))]
    pub async fn add_student(
        db: &PgPool,
        generator: &SystemIdGenerator,
        school_id: Uuid,
        dto: CreateSchoolStudentDto,
    ) -> Result<SchoolStudent, AppError> {
        let mut tx = db.begin().await?;

        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM schools WHERE id = $1)")
            .bind(school_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(AppError::not_found(anyhow!("School not found")));
        }

        let student_id = Uuid::new_v4();
        let owner = SystemIdOwner::new(entity_types::SCHOOL_STUDENTS, student_id);
        let system_id = SystemIdService::claim(&mut tx, generator, SystemIdKind::Student, owner).await?;

        let student = sqlx::query_as::<_, SchoolStudent>(&format!(
            "INSERT INTO school_students (id, school_id, system_id, first_name, last_name, grade_level)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {STUDENT_COLUMNS}"
        ))
        .bind(student_id)
        .bind(school_id)
        .bind(&system_id)
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(&dto.grade_level)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(student.id = %student.id, student.system_id = %student.system_id, "Student added to school");
        Ok(student)
    }

    #[instrument(skip(db, pagination), fields(school.id = %school_id, db.operation = "SELECT", db.table = "school_students"))]
    pub async fn list_students(
        db: &PgPool,
        school_id: Uuid,
        pagination: PaginationParams,
    ) -> Result<PaginatedSchoolStudentsResponse, AppError> {
        let mut conditions = Filters::new();
        conditions.push("school_id = {}::uuid", school_id);

        let total = conditions.count(db, "school_students").await?;
        if total == 0 {
            // Distinguish an empty roster from an unknown school.
            Self::get_school(db, None, school_id).await?;
        }

        let students = conditions
            .fetch_page::<SchoolStudent>(
                db,
                &format!("SELECT {STUDENT_COLUMNS} FROM school_students"),
                "last_name ASC, first_name ASC",
                pagination.limit(),
                pagination.offset(),
            )
            .await?;

        Ok(PaginatedSchoolStudentsResponse {
            data: students,
            meta: PaginationMeta::new(total, &pagination),
        })
    }

    #[instrument(skip(db, cache), fields(school.id = %school_id, student.id = %student_id, db.operation = "DELETE", db.table = "school_students"))]
    pub async fn remove_student(
        db: &PgPool,
        cache: Option<&RedisCache>,
        school_id: Uuid,
        student_id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let system_id = sqlx::query_scalar::<_, String>(
            "DELETE FROM school_students WHERE id = $1 AND school_id = $2 RETURNING system_id",
        )
        .bind(student_id)
        .bind(school_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Student not found in school")))?;

        SystemIdService::release(&mut tx, student_id).await?;
        let revoked = IdCardService::revoke_for_holders(&mut tx, &[student_id]).await?;
        tx.commit().await?;

        invalidate::system_id(cache, &system_id).await;
        for qr_token in &revoked {
            invalidate::card(cache, qr_token).await;
        }

        info!(student.id = %student_id, "Student removed from school");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_contact_details_accepts_missing_values() {
        let (email, phone) = contact_details(None, None).unwrap();
        assert!(email.is_none());
        assert!(phone.is_none());
    }

    #[test]
    fn test_contact_details_rejects_bad_email() {
        let err = contact_details(Some("not-an-email"), None).unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
