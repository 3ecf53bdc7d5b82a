use chrono::NaiveDate;
use fake::Fake;
use fake::faker::name::en::FirstName;
use learnhub_core::{SystemIdGenerator, SystemIdKind};
use learnhub_models::system_ids::entity_types;
use rayon::prelude::*;
use sqlx::{PgConnection, QueryBuilder};
use uuid::Uuid;

use super::claim_system_ids;
use super::models::{FamilyMemberSeed, FamilySeed, UserSeed};

/// One family per guardian, members sharing the guardian's last name.
pub fn generate_families(guardians: &[UserSeed], members_per_family: usize) -> Vec<FamilySeed> {
    guardians
        .par_iter()
        .map(|guardian| FamilySeed {
            id: Uuid::new_v4(),
            guardian_id: guardian.id,
            name: format!("The {} Family", guardian.last_name),
            members: (0..members_per_family)
                .map(|_| {
                    let year: i32 = (2008..2019).fake();
                    let month: u32 = (1..13).fake();
                    let day: u32 = (1..29).fake();
                    FamilyMemberSeed {
                        id: Uuid::new_v4(),
                        first_name: FirstName().fake(),
                        last_name: guardian.last_name.clone(),
                        relationship: "child".to_string(),
                        date_of_birth: NaiveDate::from_ymd_opt(year, month, day),
                    }
                })
                .collect(),
        })
        .collect()
}

pub async fn insert_families(
    conn: &mut PgConnection,
    generator: &SystemIdGenerator,
    families: &[FamilySeed],
) -> anyhow::Result<()> {
    if families.is_empty() {
        return Ok(());
    }

    let family_ids: Vec<Uuid> = families.iter().map(|f| f.id).collect();
    let family_system_ids = claim_system_ids(
        conn,
        generator,
        SystemIdKind::Family,
        entity_types::FAMILIES,
        &family_ids,
    )
    .await?;

    let mut query = QueryBuilder::new("INSERT INTO families (id, system_id, guardian_id, name) ");
    query.push_values(
        families.iter().zip(family_system_ids),
        |mut row, (family, system_id)| {
            row.push_bind(family.id)
                .push_bind(system_id)
                .push_bind(family.guardian_id)
                .push_bind(family.name.clone());
        },
    );
    query.build().execute(&mut *conn).await?;

    let members: Vec<(Uuid, &FamilyMemberSeed)> = families
        .iter()
        .flat_map(|f| f.members.iter().map(move |m| (f.id, m)))
        .collect();
    if members.is_empty() {
        return Ok(());
    }

    let member_ids: Vec<Uuid> = members.iter().map(|(_, m)| m.id).collect();
    let member_system_ids = claim_system_ids(
        conn,
        generator,
        SystemIdKind::Student,
        entity_types::FAMILY_MEMBERS,
        &member_ids,
    )
    .await?;

    let mut query = QueryBuilder::new(
        "INSERT INTO family_members (id, family_id, system_id, first_name, last_name, relationship, date_of_birth) ",
    );
    query.push_values(
        members.iter().zip(member_system_ids),
        |mut row, ((family_id, member), system_id)| {
            row.push_bind(member.id)
                .push_bind(*family_id)
                .push_bind(system_id)
                .push_bind(member.first_name.clone())
                .push_bind(member.last_name.clone())
                .push_bind(member.relationship.clone())
                .push_bind(member.date_of_birth);
        },
    );
    query.build().execute(&mut *conn).await?;
    Ok(())
}
