//! Group classes: a led cohort enrolling in a class together.

use chrono::{DateTime, Utc};
use learnhub_core::pagination::{PaginationMeta, PaginationParams};
use learnhub_core::serde::deserialize_optional_string;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{GroupClassId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct GroupClass {
    pub id: GroupClassId,
    /// `GRO-XXXXXX`
    pub system_id: String,
    pub name: String,
    pub class_name: String,
    pub leader_id: UserId,
    pub max_members: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A group class with the number of its active enrollments.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct GroupClassWithStats {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub group: GroupClass,
    pub member_count: i64,
}

impl GroupClassWithStats {
    pub fn has_capacity(&self) -> bool {
        self.member_count < i64::from(self.group.max_members)
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateGroupClassDto {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 200, message = "class_name must be 1-200 characters"))]
    pub class_name: String,
    pub leader_id: UserId,
    #[validate(range(min = 1, max = 500, message = "max_members must be between 1 and 500"))]
    pub max_members: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GroupClassFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub class_name: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedGroupClassesResponse {
    pub data: Vec<GroupClassWithStats>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(max_members: i32) -> GroupClass {
        GroupClass {
            id: GroupClassId::new(),
            system_id: "GRO-M3ZP9A".to_string(),
            name: "Robotics crew".to_string(),
            class_name: "Robotics 101".to_string(),
            leader_id: UserId::new(),
            max_members,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_capacity() {
        let open = GroupClassWithStats {
            group: group(3),
            member_count: 2,
        };
        assert!(open.has_capacity());

        let full = GroupClassWithStats {
            group: group(3),
            member_count: 3,
        };
        assert!(!full.has_capacity());
    }

    #[test]
    fn test_max_members_range() {
        let dto = CreateGroupClassDto {
            name: "Crew".to_string(),
            class_name: "Robotics 101".to_string(),
            leader_id: UserId::new(),
            max_members: 0,
        };
        assert!(dto.validate().is_err());
    }
}
