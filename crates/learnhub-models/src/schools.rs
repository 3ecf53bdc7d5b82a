//! Schools and the students on their rosters.

use chrono::{DateTime, Utc};
use learnhub_core::pagination::{PaginationMeta, PaginationParams};
use learnhub_core::serde::deserialize_optional_string;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{SchoolId, SchoolStudentId};
use crate::value_types::{Email, PhoneNumber};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct School {
    pub id: SchoolId,
    /// `SCH-XXXXXX`
    pub system_id: String,
    pub name: String,
    pub address: Option<String>,
    pub contact_email: Option<Email>,
    pub contact_phone: Option<PhoneNumber>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateSchoolDto {
    #[validate(length(min = 1, max = 200, message = "name must be 1-200 characters"))]
    pub name: String,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(email(message = "contact_email must be a valid email address"))]
    pub contact_email: Option<String>,
    #[validate(length(max = 30))]
    pub contact_phone: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateSchoolDto {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[validate(length(max = 30))]
    pub contact_phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SchoolFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedSchoolsResponse {
    pub data: Vec<School>,
    pub meta: PaginationMeta,
}

/// A student enrolled through a school rather than holding their own account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SchoolStudent {
    pub id: SchoolStudentId,
    pub school_id: SchoolId,
    /// `STU-XXXXX`
    pub system_id: String,
    pub first_name: String,
    pub last_name: String,
    pub grade_level: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateSchoolStudentDto {
    #[validate(length(min = 1, max = 100, message = "first_name must be 1-100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "last_name must be 1-100 characters"))]
    pub last_name: String,
    #[validate(length(max = 20))]
    pub grade_level: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedSchoolStudentsResponse {
    pub data: Vec<SchoolStudent>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_school_dto_validation() {
        let valid = CreateSchoolDto {
            name: "Greenfield Academy".to_string(),
            address: Some("1 Main St".to_string()),
            contact_email: Some("office@greenfield.edu".to_string()),
            contact_phone: None,
        };
        assert!(valid.validate().is_ok());

        let invalid = CreateSchoolDto {
            name: String::new(),
            contact_email: Some("nope".to_string()),
            ..valid
        };
        let errors = invalid.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("contact_email"));
    }

    #[test]
    fn test_create_school_student_dto_validation() {
        let dto = CreateSchoolStudentDto {
            first_name: "Tunde".to_string(),
            last_name: String::new(),
            grade_level: Some("JSS2".to_string()),
        };
        assert!(dto.validate().is_err());
    }
}
