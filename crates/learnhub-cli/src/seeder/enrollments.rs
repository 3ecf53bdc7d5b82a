use learnhub_models::EnrollmentType;
use sqlx::{PgConnection, QueryBuilder};
use uuid::Uuid;

use super::models::{CLASS_NAMES, EnrollmentSeed, FamilySeed, GroupSeed, SchoolSeed, UserSeed};

const MONTHLY_FEE_CENTS: i64 = 15_000;

/// One pending enrollment per student, family, group and school.
///
/// School enrollments are applied for by the first teacher.
pub fn plan_enrollments(
    students: &[UserSeed],
    families: &[FamilySeed],
    groups: &[GroupSeed],
    schools: &[SchoolSeed],
    school_contact: Option<Uuid>,
) -> Vec<EnrollmentSeed> {
    let mut plan = Vec::with_capacity(students.len() + families.len() + groups.len() + schools.len());

    plan.extend(students.iter().enumerate().map(|(idx, student)| EnrollmentSeed {
        user_id: student.id,
        class_name: CLASS_NAMES[idx % CLASS_NAMES.len()].to_string(),
        enrollment_type: EnrollmentType::Individual,
        reference_id: None,
        monthly_fee_cents: MONTHLY_FEE_CENTS,
    }));

    plan.extend(families.iter().enumerate().map(|(idx, family)| EnrollmentSeed {
        user_id: family.guardian_id,
        class_name: CLASS_NAMES[idx % CLASS_NAMES.len()].to_string(),
        enrollment_type: EnrollmentType::Family,
        reference_id: Some(family.id),
        monthly_fee_cents: MONTHLY_FEE_CENTS * family.members.len().max(1) as i64,
    }));

    plan.extend(groups.iter().map(|group| EnrollmentSeed {
        user_id: group.leader_id,
        class_name: group.class_name.clone(),
        enrollment_type: EnrollmentType::Group,
        reference_id: Some(group.id),
        monthly_fee_cents: MONTHLY_FEE_CENTS * 5,
    }));

    if let Some(contact) = school_contact {
        plan.extend(schools.iter().enumerate().map(|(idx, school)| EnrollmentSeed {
            user_id: contact,
            class_name: CLASS_NAMES[idx % CLASS_NAMES.len()].to_string(),
            enrollment_type: EnrollmentType::School,
            reference_id: Some(school.id),
            monthly_fee_cents: MONTHLY_FEE_CENTS * 10,
        }));
    }

    plan
}

pub async fn insert_enrollments(
    conn: &mut PgConnection,
    enrollments: &[EnrollmentSeed],
) -> anyhow::Result<()> {
    const BATCH_SIZE: usize = 1000;

    for chunk in enrollments.chunks(BATCH_SIZE) {
        let mut query = QueryBuilder::new(
            "INSERT INTO class_enrollments (user_id, class_name, enrollment_type, group_class_id, family_id, school_id, monthly_fee_cents) ",
        );
        query.push_values(chunk, |mut row, e| {
            let reference = |ty: EnrollmentType| (e.enrollment_type == ty).then_some(e.reference_id).flatten();
            row.push_bind(e.user_id)
                .push_bind(e.class_name.clone())
                .push_bind(e.enrollment_type.as_str())
                .push_bind(reference(EnrollmentType::Group))
                .push_bind(reference(EnrollmentType::Family))
                .push_bind(reference(EnrollmentType::School))
                .push_bind(e.monthly_fee_cents);
        });
        query.build().execute(&mut *conn).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use learnhub_models::UserRole;

    fn user(role: UserRole) -> UserSeed {
        UserSeed {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Obi".into(),
            email: "ada@seed.learnhub.test".into(),
            phone: None,
            role,
        }
    }

    #[test]
    fn test_plan_sets_reference_per_type() {
        let students = vec![user(UserRole::Student)];
        let schools = vec![SchoolSeed {
            id: Uuid::new_v4(),
            name: "Lagos Academy 1".into(),
            address: "1 Marina".into(),
            contact_email: "office@seed.learnhub.test".into(),
        }];

        let plan = plan_enrollments(&students, &[], &[], &schools, Some(Uuid::new_v4()));
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].enrollment_type, EnrollmentType::Individual);
        assert!(plan[0].reference_id.is_none());
        assert_eq!(plan[1].enrollment_type, EnrollmentType::School);
        assert_eq!(plan[1].reference_id, Some(schools[0].id));
    }

    #[test]
    fn test_plan_skips_schools_without_contact() {
        let schools = vec![SchoolSeed {
            id: Uuid::new_v4(),
            name: "x".into(),
            address: "y".into(),
            contact_email: "z@seed.learnhub.test".into(),
        }];
        assert!(plan_enrollments(&[], &[], &[], &schools, None).is_empty());
    }
}
