//! User accounts.

use chrono::{DateTime, Utc};
use learnhub_core::pagination::{PaginationMeta, PaginationParams};
use learnhub_core::serde::{deserialize_optional_bool, deserialize_optional_string};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::enums::UserRole;
use crate::ids::UserId;
use crate::value_types::{Email, PhoneNumber};

/// A user account. The password hash is never selected into this struct.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: UserId,
    /// `STU-XXXXX` for students, absent for staff and parents.
    pub system_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: Option<PhoneNumber>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateUserDto {
    #[validate(length(min = 1, max = 100, message = "first_name must be 1-100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "last_name must be 1-100 characters"))]
    pub last_name: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    pub role: UserRole,
}

/// Only provided fields are updated.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateUserDto {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserFilterParams {
    pub role: Option<UserRole>,
    /// Partial match on first or last name
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedUsersResponse {
    pub data: Vec<User>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto() -> CreateUserDto {
        CreateUserDto {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            password: "password123".to_string(),
            role: UserRole::Student,
        }
    }

    #[test]
    fn test_create_user_dto_valid() {
        assert!(dto().validate().is_ok());
    }

    #[test]
    fn test_create_user_dto_invalid_email() {
        let dto = CreateUserDto {
            email: "invalid".to_string(),
            ..dto()
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn test_create_user_dto_short_password() {
        let dto = CreateUserDto {
            password: "short".to_string(),
            ..dto()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_update_user_dto_empty_is_valid() {
        assert!(UpdateUserDto::default().validate().is_ok());
    }

    #[test]
    fn test_filter_params_from_query_strings() {
        let json = r#"{"role":"student","is_active":"true","name":"","limit":"5"}"#;
        let params: UserFilterParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.role, Some(UserRole::Student));
        assert_eq!(params.is_active, Some(true));
        assert!(params.name.is_none());
        assert_eq!(params.pagination.limit(), 5);
    }
}
