//! Families enrolling together under a guardian account.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{FamilyId, FamilyMemberId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Family {
    pub id: FamilyId,
    /// `FAM-XXXXX`
    pub system_id: String,
    pub guardian_id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FamilyMember {
    pub id: FamilyMemberId,
    pub family_id: FamilyId,
    /// `STU-XXXXX`
    pub system_id: String,
    pub first_name: String,
    pub last_name: String,
    pub relationship: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FamilyWithMembers {
    #[serde(flatten)]
    pub family: Family,
    pub members: Vec<FamilyMember>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateFamilyDto {
    pub guardian_id: UserId,
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddFamilyMemberDto {
    #[validate(length(min = 1, max = 100, message = "first_name must be 1-100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "last_name must be 1-100 characters"))]
    pub last_name: String,
    #[validate(length(max = 50))]
    pub relationship: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}
