//! Registry of issued system IDs and entity resolution results.

use chrono::{DateTime, Utc};
use learnhub_core::system_id::SystemIdKind;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Registry row. `kind` holds [`SystemIdKind::as_str`].
#[derive(Debug, Clone, FromRow)]
pub struct SystemIdRecord {
    pub system_id: String,
    pub kind: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// The entity a system ID points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SystemIdResolution {
    pub system_id: String,
    pub kind: SystemIdKind,
    /// Table the entity lives in, e.g. `users` or `family_members`.
    pub entity_type: String,
    pub entity_id: Uuid,
    pub display_name: String,
}

/// Entity type names recorded in the registry.
pub mod entity_types {
    pub const USERS: &str = "users";
    pub const SCHOOLS: &str = "schools";
    pub const SCHOOL_STUDENTS: &str = "school_students";
    pub const FAMILIES: &str = "families";
    pub const FAMILY_MEMBERS: &str = "family_members";
    pub const GROUP_CLASSES: &str = "group_classes";
}
