use learnhub_core::{SystemIdGenerator, SystemIdKind};
use learnhub_models::system_ids::entity_types;
use sqlx::{PgConnection, QueryBuilder};
use uuid::Uuid;

use super::claim_system_ids;
use super::models::{CLASS_NAMES, GroupSeed};

/// Groups are led by the given teachers in turn.
pub fn generate_groups(leader_ids: &[Uuid], count: usize) -> Vec<GroupSeed> {
    if leader_ids.is_empty() {
        return Vec::new();
    }

    (0..count)
        .map(|idx| {
            let class_name = CLASS_NAMES[idx % CLASS_NAMES.len()];
            GroupSeed {
                id: Uuid::new_v4(),
                name: format!("{} Cohort {}", class_name, idx / CLASS_NAMES.len() + 1),
                class_name: class_name.to_string(),
                leader_id: leader_ids[idx % leader_ids.len()],
                max_members: 20,
            }
        })
        .collect()
}

pub async fn insert_groups(
    conn: &mut PgConnection,
    generator: &SystemIdGenerator,
    groups: &[GroupSeed],
) -> anyhow::Result<()> {
    if groups.is_empty() {
        return Ok(());
    }

    let ids: Vec<Uuid> = groups.iter().map(|g| g.id).collect();
    let system_ids = claim_system_ids(
        conn,
        generator,
        SystemIdKind::Group,
        entity_types::GROUP_CLASSES,
        &ids,
    )
    .await?;

    let mut query = QueryBuilder::new(
        "INSERT INTO group_classes (id, system_id, name, class_name, leader_id, max_members) ",
    );
    query.push_values(groups.iter().zip(system_ids), |mut row, (group, system_id)| {
        row.push_bind(group.id)
            .push_bind(system_id)
            .push_bind(group.name.clone())
            .push_bind(group.class_name.clone())
            .push_bind(group.leader_id)
            .push_bind(group.max_members);
    });
    query.build().execute(&mut *conn).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_groups_rotates_leaders() {
        let leaders = vec![Uuid::new_v4(), Uuid::new_v4()];
        let groups = generate_groups(&leaders, 3);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].leader_id, leaders[0]);
        assert_eq!(groups[1].leader_id, leaders[1]);
        assert_eq!(groups[2].leader_id, leaders[0]);
    }

    #[test]
    fn test_generate_groups_without_leaders() {
        assert!(generate_groups(&[], 5).is_empty());
    }
}
