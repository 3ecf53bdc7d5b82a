//! Learning materials distributed to enrolled students.

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

use crate::enums::MaterialType;
use crate::ids::{GroupClassId, MaterialId, SchoolId};

/// A material belongs to a class. When `group_class_id` or `school_id` is
/// set it is only distributed to enrollments of that group or school.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LearningMaterial {
    pub id: MaterialId,
    pub class_name: String,
    pub title: String,
    pub description: Option<String>,
    pub resource_url: String,
    pub material_type: MaterialType,
    pub group_class_id: Option<GroupClassId>,
    pub school_id: Option<SchoolId>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateMaterialDto {
    #[validate(length(min = 1, max = 200, message = "class_name must be 1-200 characters"))]
    pub class_name: String,
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(url(message = "resource_url must be a valid URL"))]
    pub resource_url: String,
    pub material_type: MaterialType,
    pub group_class_id: Option<GroupClassId>,
    pub school_id: Option<SchoolId>,
    #[serde(default)]
    pub is_published: bool,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateMaterialDto {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(url)]
    pub resource_url: Option<String>,
    pub material_type: Option<MaterialType>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct MaterialFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub class_name: Option<String>,
    pub material_type: Option<MaterialType>,
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_published: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub group_class_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub school_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedMaterialsResponse {
    pub data: Vec<LearningMaterial>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_material_dto_validation() {
        let dto = CreateMaterialDto {
            class_name: "Algebra I".to_string(),
            title: "Week 1 notes".to_string(),
            description: None,
            resource_url: "https://cdn.example.com/algebra/week1.pdf".to_string(),
            material_type: MaterialType::Document,
            group_class_id: None,
            school_id: None,
            is_published: true,
        };
        assert!(dto.validate().is_ok());

        let bad = CreateMaterialDto {
            resource_url: "week1.pdf".to_string(),
            ..dto
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_filter_params_parse() {
        let json = r#"{"material_type":"video","is_published":"false","school_id":""}"#;
        let params: MaterialFilterParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.material_type, Some(MaterialType::Video));
        assert_eq!(params.is_published, Some(false));
        assert!(params.school_id.is_none());
    }
}
