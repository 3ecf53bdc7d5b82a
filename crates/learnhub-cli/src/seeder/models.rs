//! Generated rows and seeding configuration.

use chrono::NaiveDate;
use learnhub_models::{EnrollmentType, UserRole};
use uuid::Uuid;

/// Seeded accounts use this email domain so they can be cleared later.
pub const SEED_EMAIL_DOMAIN: &str = "seed.learnhub.test";

/// Password shared by every seeded account.
pub const SEED_PASSWORD: &str = "password123";

pub const CLASS_NAMES: &[&str] = &[
    "Mathematics",
    "Physics",
    "Creative Writing",
    "Robotics",
    "Music Theory",
    "Web Development",
];

pub struct UserSeed {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
}

pub struct SchoolSeed {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub contact_email: String,
}

pub struct SchoolStudentSeed {
    pub id: Uuid,
    pub school_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub grade_level: String,
}

pub struct FamilySeed {
    pub id: Uuid,
    pub guardian_id: Uuid,
    pub name: String,
    pub members: Vec<FamilyMemberSeed>,
}

pub struct FamilyMemberSeed {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub relationship: String,
    pub date_of_birth: Option<NaiveDate>,
}

pub struct GroupSeed {
    pub id: Uuid,
    pub name: String,
    pub class_name: String,
    pub leader_id: Uuid,
    pub max_members: i32,
}

pub struct EnrollmentSeed {
    pub user_id: Uuid,
    pub class_name: String,
    pub enrollment_type: EnrollmentType,
    pub reference_id: Option<Uuid>,
    pub monthly_fee_cents: i64,
}

#[derive(Clone, Debug)]
pub struct SeedConfig {
    pub teachers: usize,
    pub students: usize,
    pub schools: usize,
    pub students_per_school: usize,
    pub families: usize,
    pub members_per_family: usize,
    pub groups: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            teachers: 5,
            students: 30,
            schools: 3,
            students_per_school: 20,
            families: 10,
            members_per_family: 3,
            groups: 4,
        }
    }
}
