//! Student project showcase.

use chrono::{DateTime, Utc};
use learnhub_core::pagination::{PaginationMeta, PaginationParams};
use learnhub_core::serde::{
    deserialize_optional_bool, deserialize_optional_string, deserialize_optional_uuid,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::ids::{ProjectId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StudentProject {
    pub id: ProjectId,
    pub owner_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub project_url: String,
    pub thumbnail_url: Option<String>,
    pub class_name: Option<String>,
    pub is_published: bool,
    /// Only published projects can be featured.
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateProjectDto {
    pub owner_id: UserId,
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(url(message = "project_url must be a valid URL"))]
    pub project_url: String,
    #[validate(url(message = "thumbnail_url must be a valid URL"))]
    pub thumbnail_url: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub class_name: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateProjectDto {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(url)]
    pub project_url: Option<String>,
    #[validate(url)]
    pub thumbnail_url: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProjectFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub owner_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_published: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Hash, Deserialize, ToSchema)]
pub struct ShowcaseParams {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub class_name: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedProjectsResponse {
    pub data: Vec<StudentProject>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_project_dto_validation() {
        let dto = CreateProjectDto {
            owner_id: UserId::new(),
            title: "Line follower robot".to_string(),
            description: None,
            project_url: "https://github.com/example/robot".to_string(),
            thumbnail_url: Some("not a url".to_string()),
            class_name: None,
        };
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("thumbnail_url"));
    }

    #[test]
    fn test_showcase_params_defaults() {
        let params: ShowcaseParams = serde_json::from_str("{}").unwrap();
        assert!(params.class_name.is_none());
        assert_eq!(params.pagination.limit(), 10);
    }
}
