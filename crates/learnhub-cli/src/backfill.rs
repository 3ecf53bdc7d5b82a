use std::time::Instant;

use learnhub_core::{SystemIdGenerator, SystemIdKind, SystemIdOwner};
use learnhub_db::PgSystemIdStore;
use learnhub_models::UserRole;
use learnhub_models::system_ids::entity_types;
use sqlx::PgPool;
use uuid::Uuid;

/// Issue student system IDs to student accounts that have none, oldest
/// first so the sequence follows sign-up order. Returns how many were issued.
pub async fn backfill_student_ids(
    db: &PgPool,
    generator: &SystemIdGenerator,
) -> anyhow::Result<usize> {
    let start_time = Instant::now();
    let mut tx = db.begin().await?;

    let user_ids = sqlx::query_scalar::<_, Uuid>(
        r#"SELECT id FROM users
           WHERE role = $1 AND system_id IS NULL
           ORDER BY created_at, id
           FOR UPDATE"#,
    )
    .bind(UserRole::Student.as_str())
    .fetch_all(&mut *tx)
    .await?;

    println!("🔎 Found {} students without a system id", user_ids.len());

    for user_id in &user_ids {
        let generated = {
            let mut store = PgSystemIdStore::new(&mut *tx);
            generator
                .claim(
                    &mut store,
                    SystemIdKind::Student,
                    SystemIdOwner::new(entity_types::USERS, *user_id),
                )
                .await?
        };

        sqlx::query("UPDATE users SET system_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(&generated.value)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    println!(
        "   ✓ Issued {} student ids in {:?}",
        user_ids.len(),
        start_time.elapsed()
    );
    Ok(user_ids.len())
}
