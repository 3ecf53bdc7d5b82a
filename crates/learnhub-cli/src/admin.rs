use anyhow::{Context, anyhow};
use learnhub_core::hash_password;
use learnhub_models::{Email, UserRole};
use sqlx::PgPool;
use uuid::Uuid;

pub struct NewAdmin {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Insert an active admin account. Fails when the email is taken.
pub async fn create_admin(db: &PgPool, admin: &NewAdmin) -> anyhow::Result<Uuid> {
    if admin.password.len() < 8 {
        return Err(anyhow!("Password must be at least 8 characters"));
    }
    let email = Email::new(&admin.email)?;
    let password_hash = hash_password(&admin.password).map_err(|e| e.error)?;

    let id = sqlx::query_scalar::<_, Uuid>(
        r#"INSERT INTO users (first_name, last_name, email, password_hash, role)
           VALUES ($1, $2, $3, $4, $5)
           ON CONFLICT (email) DO NOTHING
           RETURNING id"#,
    )
    .bind(admin.first_name.trim())
    .bind(admin.last_name.trim())
    .bind(email.as_str())
    .bind(&password_hash)
    .bind(UserRole::Admin.as_str())
    .fetch_optional(db)
    .await
    .context("Failed to insert admin")?;

    id.ok_or_else(|| anyhow!("A user with email {} already exists", email))
}
