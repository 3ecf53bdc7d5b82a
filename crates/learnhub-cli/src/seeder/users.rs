use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::number::en::NumberWithFormat;
use learnhub_core::{SystemIdGenerator, SystemIdKind};
use learnhub_models::UserRole;
use learnhub_models::system_ids::entity_types;
use rayon::prelude::*;
use sqlx::{PgConnection, QueryBuilder};
use uuid::Uuid;

use super::claim_system_ids;
use super::models::{SEED_EMAIL_DOMAIN, UserSeed};

/// Generates accounts for one role in parallel. `offset` keeps emails
/// unique across roles.
pub fn generate_users(role: UserRole, count: usize, offset: usize) -> Vec<UserSeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            let email = format!(
                "{}.{}+{}{}@{}",
                first_name.to_lowercase().replace(' ', ""),
                last_name.to_lowercase().replace(' ', ""),
                role,
                offset + idx,
                SEED_EMAIL_DOMAIN
            );
            let phone = (idx % 3 != 0).then(|| NumberWithFormat("+1555#######").fake());

            UserSeed {
                id: Uuid::new_v4(),
                first_name,
                last_name,
                email,
                phone,
                role,
            }
        })
        .collect()
}

/// Inserts users, issuing student IDs to students.
pub async fn insert_users(
    conn: &mut PgConnection,
    generator: &SystemIdGenerator,
    users: &[UserSeed],
    password_hash: &str,
) -> anyhow::Result<()> {
    const BATCH_SIZE: usize = 1000;

    let student_ids: Vec<Uuid> = users
        .iter()
        .filter(|u| u.role == UserRole::Student)
        .map(|u| u.id)
        .collect();
    let issued = claim_system_ids(
        conn,
        generator,
        SystemIdKind::Student,
        entity_types::USERS,
        &student_ids,
    )
    .await?;
    let mut issued = issued.into_iter();

    let system_ids: Vec<Option<String>> = users
        .iter()
        .map(|u| {
            if u.role == UserRole::Student {
                issued.next()
            } else {
                None
            }
        })
        .collect();

    let rows: Vec<(&UserSeed, Option<String>)> = users.iter().zip(system_ids).collect();
    for chunk in rows.chunks(BATCH_SIZE) {
        let mut query = QueryBuilder::new(
            "INSERT INTO users (id, system_id, first_name, last_name, email, phone, password_hash, role) ",
        );
        query.push_values(chunk, |mut row, (user, system_id)| {
            row.push_bind(user.id)
                .push_bind(system_id.clone())
                .push_bind(user.first_name.clone())
                .push_bind(user.last_name.clone())
                .push_bind(user.email.clone())
                .push_bind(user.phone.clone())
                .push_bind(password_hash.to_string())
                .push_bind(user.role.as_str());
        });
        query.build().execute(&mut *conn).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_emails_are_unique_and_seeded() {
        let mut users = generate_users(UserRole::Student, 50, 0);
        users.extend(generate_users(UserRole::Teacher, 10, 50));

        let mut emails: Vec<&str> = users.iter().map(|u| u.email.as_str()).collect();
        emails.sort();
        emails.dedup();
        assert_eq!(emails.len(), 60);
        assert!(users.iter().all(|u| u.email.ends_with(SEED_EMAIL_DOMAIN)));
    }

    #[test]
    fn test_generated_phones_are_valid() {
        for user in generate_users(UserRole::Parent, 20, 0) {
            if let Some(phone) = user.phone {
                assert!(learnhub_models::PhoneNumber::new(phone).is_ok());
            }
        }
    }
}
