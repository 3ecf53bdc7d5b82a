use anyhow::anyhow;
use learnhub_cache::{RedisCache, invalidate};
use learnhub_core::{AppError, PaginationMeta, SystemIdGenerator, SystemIdKind, SystemIdOwner, hash_password};
use learnhub_db::constraints::{foreign_key_violation, unique_violation};
use learnhub_models::system_ids::entity_types;
use learnhub_models::users::{
    CreateUserDto, PaginatedUsersResponse, UpdateUserDto, User, UserFilterParams,
};
use learnhub_models::{Email, PhoneNumber, UserRole};
use learnhub_observability::track_user_created;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::modules::system_ids::service::SystemIdService;
use crate::utils::query::Filters;

const USER_COLUMNS: &str =
    "id, system_id, first_name, last_name, email, phone, role, is_active, created_at, updated_at";

pub struct UserService;

impl UserService {
    #[instrument(skip(db, generator, dto), fields(user.role = %dto.role, db.operation = "INSERT", db.table = "users"))]
    pub async fn create_user(
        db: &PgPool,
        generator: &SystemIdGenerator,
        dto: CreateUserDto,
    ) -> Result<User, AppError> {
        let email = Email::new(&dto.email).map_err(AppError::unprocessable)?;
        let phone = dto
            .phone
            .as_deref()
            .map(PhoneNumber::new)
            .transpose()
            .map_err(AppError::unprocessable)?;
        let password_hash = hash_password(&dto.password)?;

        let mut tx = db.begin().await?;
        let user_id = Uuid::new_v4();

        let system_id = if dto.role == UserRole::Student {
            let owner = SystemIdOwner::new(entity_types::USERS, user_id);
            Some(SystemIdService::claim(&mut tx, generator, SystemIdKind::Student, owner).await?)
        } else {
            None
        };

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, system_id, first_name, last_name, email, phone, password_hash, role)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&system_id)
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(&email)
        .bind(&phone)
        .bind(&password_hash)
        .bind(dto.role)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some("users_email_key") => {
                warn!(user.email = %email, "Attempted to create user with existing email");
                AppError::conflict(anyhow!("Email already in use"))
            }
            _ => {
                error!(error = %e, "Database error creating user");
                AppError::database(e)
            }
        })?;

        tx.commit().await?;

        track_user_created(user.role.as_str());
        info!(user.id = %user.id, user.system_id = ?user.system_id, "User created");

        Ok(user)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "users"))]
    pub async fn list_users(
        db: &PgPool,
        filters: UserFilterParams,
    ) -> Result<PaginatedUsersResponse, AppError> {
        let limit = filters.pagination.limit();
        let offset = filters.pagination.offset();

        let mut conditions = Filters::new();
        conditions
            .push_opt("role = {}", filters.role)
            .push_like(
                "(first_name || ' ' || last_name) ILIKE {}",
                filters.name.as_deref(),
            )
            .push_like("email ILIKE {}", filters.email.as_deref())
            .push_opt("is_active = {}::boolean", filters.is_active);

        let total = conditions.count(db, "users").await?;
        let users = conditions
            .fetch_page::<User>(
                db,
                &format!("SELECT {USER_COLUMNS} FROM users"),
                "created_at DESC",
                limit,
                offset,
            )
            .await?;

        debug!(total, returned = users.len(), "Users fetched");

        Ok(PaginatedUsersResponse {
            data: users,
            meta: PaginationMeta::new(total, &filters.pagination),
        })
    }

    #[instrument(skip(db), fields(user.id = %user_id, db.operation = "SELECT", db.table = "users"))]
    pub async fn get_user(db: &PgPool, user_id: Uuid) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    /// Apply a partial update. A user that becomes a student without a
    /// system id is issued one in the same transaction.
    #[instrument(skip(db, cache, generator, dto), fields(user.id = %user_id, db.operation = "UPDATE", db.table = "users"))]
    pub async fn update_user(
        db: &PgPool,
        cache: Option<&RedisCache>,
        generator: &SystemIdGenerator,
        user_id: Uuid,
        dto: UpdateUserDto,
    ) -> Result<User, AppError> {
        let email = dto
            .email
            .as_deref()
            .map(Email::new)
            .transpose()
            .map_err(AppError::unprocessable)?;
        let phone = dto
            .phone
            .as_deref()
            .map(PhoneNumber::new)
            .transpose()
            .map_err(AppError::unprocessable)?;

        let mut tx = db.begin().await?;

        let current = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
        ))
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

        let role = dto.role.unwrap_or(current.role);
        let system_id = match (&current.system_id, role) {
            (None, UserRole::Student) => {
                let owner = SystemIdOwner::new(entity_types::USERS, user_id);
                Some(SystemIdService::claim(&mut tx, generator, SystemIdKind::Student, owner).await?)
            }
            (existing, _) => existing.clone(),
        };

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                role = $6,
                is_active = COALESCE($7, is_active),
                system_id = $8,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(&email)
        .bind(&phone)
        .bind(role)
        .bind(dto.is_active)
        .bind(&system_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some("users_email_key") => AppError::conflict(anyhow!("Email already in use")),
            _ => AppError::database(e),
        })?;

        tx.commit().await?;

        if let Some(system_id) = &user.system_id {
            invalidate::system_id(cache, system_id).await;
        }

        info!(user.id = %user.id, "User updated");
        Ok(user)
    }

    #[instrument(skip(db), fields(user.id = %user_id, db.operation = "UPDATE", db.table = "users"))]
    pub async fn deactivate_user(db: &PgPool, user_id: Uuid) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

        info!(user.id = %user.id, "User deactivated");
        Ok(user)
    }

    /// Delete a user and release their system id. Users still referenced by
    /// enrollments, families or group classes are kept (409).
    #[instrument(skip(db, cache), fields(user.id = %user_id, db.operation = "DELETE", db.table = "users"))]
    pub async fn delete_user(
        db: &PgPool,
        cache: Option<&RedisCache>,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = db.begin().await?;

        let system_id = sqlx::query_scalar::<_, Option<String>>(
            "DELETE FROM users WHERE id = $1 RETURNING system_id",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| match foreign_key_violation(&e) {
            Some(constraint) => {
                warn!(user.id = %user_id, constraint, "User is still referenced");
                AppError::conflict(anyhow!(
                    "User is referenced by enrollments, families or group classes"
                ))
            }
            None => AppError::database(e),
        })?
        .ok_or_else(|| AppError::not_found(anyhow!("User not found")))?;

        SystemIdService::release(&mut tx, user_id).await?;
        tx.commit().await?;

        if let Some(system_id) = system_id {
            invalidate::system_id(cache, &system_id).await;
        }
        invalidate::showcase(cache).await;

        info!(user.id = %user_id, "User deleted");
        Ok(())
    }
}
