use fake::Fake;
use fake::faker::address::en::{BuildingNumber, CityName, StreetName};
use fake::faker::name::en::{FirstName, LastName};
use learnhub_core::{SystemIdGenerator, SystemIdKind};
use learnhub_models::system_ids::entity_types;
use rayon::prelude::*;
use sqlx::{PgConnection, QueryBuilder};
use uuid::Uuid;

use super::claim_system_ids;
use super::models::{SEED_EMAIL_DOMAIN, SchoolSeed, SchoolStudentSeed};

const GRADE_LEVELS: &[&str] = &["JSS1", "JSS2", "JSS3", "SS1", "SS2", "SS3"];

pub fn generate_schools(count: usize) -> Vec<SchoolSeed> {
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let city: String = CityName().fake();
            let street: String = StreetName().fake();
            let building: String = BuildingNumber().fake();

            SchoolSeed {
                id: Uuid::new_v4(),
                // Index suffix keeps names unique.
                name: format!("{} Academy {}", city, idx + 1),
                address: format!("{} {}, {}", building, street, city),
                contact_email: format!("office+school{}@{}", idx, SEED_EMAIL_DOMAIN),
            }
        })
        .collect()
}

pub fn generate_school_students(school_ids: &[Uuid], per_school: usize) -> Vec<SchoolStudentSeed> {
    school_ids
        .par_iter()
        .flat_map(|&school_id| {
            (0..per_school)
                .map(|idx| SchoolStudentSeed {
                    id: Uuid::new_v4(),
                    school_id,
                    first_name: FirstName().fake(),
                    last_name: LastName().fake(),
                    grade_level: GRADE_LEVELS[idx % GRADE_LEVELS.len()].to_string(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub async fn insert_schools(
    conn: &mut PgConnection,
    generator: &SystemIdGenerator,
    schools: &[SchoolSeed],
) -> anyhow::Result<()> {
    let ids: Vec<Uuid> = schools.iter().map(|s| s.id).collect();
    let system_ids = claim_system_ids(
        conn,
        generator,
        SystemIdKind::School,
        entity_types::SCHOOLS,
        &ids,
    )
    .await?;

    if schools.is_empty() {
        return Ok(());
    }

    let mut query =
        QueryBuilder::new("INSERT INTO schools (id, system_id, name, address, contact_email) ");
    query.push_values(schools.iter().zip(system_ids), |mut row, (school, system_id)| {
        row.push_bind(school.id)
            .push_bind(system_id)
            .push_bind(school.name.clone())
            .push_bind(school.address.clone())
            .push_bind(school.contact_email.clone());
    });
    query.build().execute(&mut *conn).await?;
    Ok(())
}

pub async fn insert_school_students(
    conn: &mut PgConnection,
    generator: &SystemIdGenerator,
    students: &[SchoolStudentSeed],
) -> anyhow::Result<()> {
    const BATCH_SIZE: usize = 1000;

    let ids: Vec<Uuid> = students.iter().map(|s| s.id).collect();
    let system_ids = claim_system_ids(
        conn,
        generator,
        SystemIdKind::Student,
        entity_types::SCHOOL_STUDENTS,
        &ids,
    )
    .await?;

    let rows: Vec<(&SchoolStudentSeed, String)> = students.iter().zip(system_ids).collect();
    for chunk in rows.chunks(BATCH_SIZE) {
        let mut query = QueryBuilder::new(
            "INSERT INTO school_students (id, school_id, system_id, first_name, last_name, grade_level) ",
        );
        query.push_values(chunk, |mut row, (student, system_id)| {
            row.push_bind(student.id)
                .push_bind(student.school_id)
                .push_bind(system_id.clone())
                .push_bind(student.first_name.clone())
                .push_bind(student.last_name.clone())
                .push_bind(student.grade_level.clone());
        });
        query.build().execute(&mut *conn).await?;
    }
    Ok(())
}
