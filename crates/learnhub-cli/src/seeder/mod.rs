//! Fake data for development databases.
//!
//! Rows are generated in parallel with Rayon, system IDs are claimed through
//! the same generator the API uses, and rows are written with multi-value
//! `INSERT`s inside a single transaction.

pub mod enrollments;
pub mod families;
pub mod groups;
pub mod models;
pub mod schools;
pub mod users;

use std::time::Instant;

use learnhub_core::{SystemIdGenerator, SystemIdKind, SystemIdOwner};
use learnhub_db::PgSystemIdStore;
use learnhub_db::system_ids::release_orphans;
use learnhub_models::UserRole;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

pub use models::{SEED_EMAIL_DOMAIN, SEED_PASSWORD, SeedConfig};

/// Claim one system ID per entity, in order.
pub(crate) async fn claim_system_ids(
    conn: &mut PgConnection,
    generator: &SystemIdGenerator,
    kind: SystemIdKind,
    entity_type: &'static str,
    entity_ids: &[Uuid],
) -> anyhow::Result<Vec<String>> {
    let mut store = PgSystemIdStore::new(conn);
    let mut issued = Vec::with_capacity(entity_ids.len());
    for &entity_id in entity_ids {
        let generated = generator
            .claim(&mut store, kind, SystemIdOwner::new(entity_type, entity_id))
            .await?;
        issued.push(generated.value);
    }
    Ok(issued)
}

pub async fn seed_all(
    db: &PgPool,
    generator: &SystemIdGenerator,
    config: SeedConfig,
) -> anyhow::Result<()> {
    let start_time = Instant::now();
    println!("🌱 Seeding database with {:?}", config);

    // Low cost: every seeded account shares one throwaway password.
    let password_hash = bcrypt::hash(SEED_PASSWORD, 4)?;

    let gen_start = Instant::now();
    let teachers = users::generate_users(UserRole::Teacher, config.teachers, 0);
    let students = users::generate_users(UserRole::Student, config.students, config.teachers);
    let parents = users::generate_users(
        UserRole::Parent,
        config.families,
        config.teachers + config.students,
    );
    let school_rows = schools::generate_schools(config.schools);
    let school_ids: Vec<Uuid> = school_rows.iter().map(|s| s.id).collect();
    let roster = schools::generate_school_students(&school_ids, config.students_per_school);
    let family_rows = families::generate_families(&parents, config.members_per_family);
    let teacher_ids: Vec<Uuid> = teachers.iter().map(|t| t.id).collect();
    let group_rows = groups::generate_groups(&teacher_ids, config.groups);
    let plan = enrollments::plan_enrollments(
        &students,
        &family_rows,
        &group_rows,
        &school_rows,
        teacher_ids.first().copied(),
    );
    println!("   ✓ Generated data in {:?}", gen_start.elapsed());

    let mut tx = db.begin().await?;

    let step = Instant::now();
    for batch in [&teachers, &students, &parents] {
        users::insert_users(&mut tx, generator, batch, &password_hash).await?;
    }
    println!(
        "   ✓ Inserted {} users in {:?}",
        teachers.len() + students.len() + parents.len(),
        step.elapsed()
    );

    let step = Instant::now();
    schools::insert_schools(&mut tx, generator, &school_rows).await?;
    schools::insert_school_students(&mut tx, generator, &roster).await?;
    println!(
        "   ✓ Inserted {} schools with {} students in {:?}",
        school_rows.len(),
        roster.len(),
        step.elapsed()
    );

    let step = Instant::now();
    families::insert_families(&mut tx, generator, &family_rows).await?;
    groups::insert_groups(&mut tx, generator, &group_rows).await?;
    println!(
        "   ✓ Inserted {} families and {} groups in {:?}",
        family_rows.len(),
        group_rows.len(),
        step.elapsed()
    );

    enrollments::insert_enrollments(&mut tx, &plan).await?;
    println!("   ✓ Inserted {} enrollments", plan.len());

    tx.commit().await?;

    println!("\n✅ Seeding complete in {:?}", start_time.elapsed());
    println!("   Seeded accounts use the password: {}", SEED_PASSWORD);
    Ok(())
}

/// Delete everything created by [`seed_all`]. Accounts created through the
/// API are left alone unless they depend on seeded rows.
pub async fn clear_all(db: &PgPool) -> anyhow::Result<()> {
    let start_time = Instant::now();
    println!("🗑️  Clearing seeded data...");

    let pattern = format!("%@{}", SEED_EMAIL_DOMAIN);
    let mut tx = db.begin().await?;

    let enrollments = sqlx::query(
        r#"DELETE FROM class_enrollments
           WHERE user_id IN (SELECT id FROM users WHERE email LIKE $1)
              OR group_class_id IN (SELECT g.id FROM group_classes g JOIN users u ON u.id = g.leader_id WHERE u.email LIKE $1)
              OR family_id IN (SELECT f.id FROM families f JOIN users u ON u.id = f.guardian_id WHERE u.email LIKE $1)
              OR school_id IN (SELECT id FROM schools WHERE contact_email LIKE $1)"#,
    )
    .bind(&pattern)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    sqlx::query(
        "DELETE FROM group_classes WHERE leader_id IN (SELECT id FROM users WHERE email LIKE $1)",
    )
    .bind(&pattern)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "DELETE FROM families WHERE guardian_id IN (SELECT id FROM users WHERE email LIKE $1)",
    )
    .bind(&pattern)
    .execute(&mut *tx)
    .await?;

    let schools = sqlx::query("DELETE FROM schools WHERE contact_email LIKE $1")
        .bind(&pattern)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let users = sqlx::query("DELETE FROM users WHERE email LIKE $1")
        .bind(&pattern)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let released = release_orphans(&mut tx).await?;

    tx.commit().await?;

    println!(
        "   ✓ Deleted {} users, {} schools, {} enrollments and released {} system ids in {:?}",
        users,
        schools,
        enrollments,
        released,
        start_time.elapsed()
    );
    Ok(())
}
