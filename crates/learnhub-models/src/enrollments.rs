//! Class enrollments and their approval lifecycle.
//!
//! ```text
//! pending ──approve──▶ approved ──complete──▶ completed
//!    │                    │
//!    ├──reject──▶ rejected│
//!    └──cancel──▶ cancelled ◀──cancel──┘
//! ```

use chrono::{DateTime, Utc};
use learnhub_core::pagination::{PaginationMeta, PaginationParams};
use learnhub_core::serde::{deserialize_optional_string, deserialize_optional_uuid};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::enums::{EnrollmentStatus, EnrollmentType, PaymentStatus};
use crate::ids::{EnrollmentId, FamilyId, GroupClassId, SchoolId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Enrollment {
    pub id: EnrollmentId,
    /// The applicant: the student, guardian, group leader or school contact.
    pub user_id: UserId,
    pub class_name: String,
    pub enrollment_type: EnrollmentType,
    pub status: EnrollmentStatus,
    pub payment_status: PaymentStatus,
    pub group_class_id: Option<GroupClassId>,
    pub family_id: Option<FamilyId>,
    pub school_id: Option<SchoolId>,
    pub monthly_fee_cents: i64,
    pub notes: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateEnrollmentDto {
    pub user_id: UserId,
    #[validate(length(min = 1, max = 200, message = "class_name must be 1-200 characters"))]
    pub class_name: String,
    pub enrollment_type: EnrollmentType,
    pub group_class_id: Option<GroupClassId>,
    pub family_id: Option<FamilyId>,
    pub school_id: Option<SchoolId>,
    #[validate(range(min = 0, message = "monthly_fee_cents cannot be negative"))]
    #[serde(default)]
    pub monthly_fee_cents: i64,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl CreateEnrollmentDto {
    /// Check that exactly the reference matching the enrollment type is set.
    pub fn check_reference(&self) -> Result<(), String> {
        let group = self.group_class_id.is_some();
        let family = self.family_id.is_some();
        let school = self.school_id.is_some();

        let (expected, ok) = match self.enrollment_type {
            EnrollmentType::Individual => (None, !group && !family && !school),
            EnrollmentType::Group => (Some("group_class_id"), group && !family && !school),
            EnrollmentType::Family => (Some("family_id"), family && !group && !school),
            EnrollmentType::School => (Some("school_id"), school && !group && !family),
        };

        if ok {
            return Ok(());
        }
        Err(match expected {
            None => "individual enrollments must not reference a group, family or school"
                .to_string(),
            Some(field) => format!(
                "{} enrollments require {} and no other reference",
                self.enrollment_type, field
            ),
        })
    }

    /// The referenced group, family or school as a bare UUID.
    pub fn reference_id(&self) -> Option<Uuid> {
        self.group_class_id
            .map(Uuid::from)
            .or(self.family_id.map(Uuid::from))
            .or(self.school_id.map(Uuid::from))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentAction {
    Approve,
    Reject,
    Cancel,
    Complete,
}

impl EnrollmentAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Cancel => "cancel",
            Self::Complete => "complete",
        }
    }

    pub fn target(self) -> EnrollmentStatus {
        match self {
            Self::Approve => EnrollmentStatus::Approved,
            Self::Reject => EnrollmentStatus::Rejected,
            Self::Cancel => EnrollmentStatus::Cancelled,
            Self::Complete => EnrollmentStatus::Completed,
        }
    }

    /// Statuses this action may be applied to.
    pub fn allowed_from(self) -> &'static [EnrollmentStatus] {
        match self {
            Self::Approve | Self::Reject => &[EnrollmentStatus::Pending],
            Self::Cancel => &[EnrollmentStatus::Pending, EnrollmentStatus::Approved],
            Self::Complete => &[EnrollmentStatus::Approved],
        }
    }

    pub fn can_apply(self, current: EnrollmentStatus) -> bool {
        self.allowed_from().contains(&current)
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EnrollmentFilterParams {
    pub status: Option<EnrollmentStatus>,
    pub enrollment_type: Option<EnrollmentType>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub class_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub user_id: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedEnrollmentsResponse {
    pub data: Vec<Enrollment>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(enrollment_type: EnrollmentType) -> CreateEnrollmentDto {
        CreateEnrollmentDto {
            user_id: UserId::new(),
            class_name: "Algebra I".to_string(),
            enrollment_type,
            group_class_id: None,
            family_id: None,
            school_id: None,
            monthly_fee_cents: 5000,
            notes: None,
        }
    }

    #[test]
    fn test_individual_rejects_references() {
        assert!(dto(EnrollmentType::Individual).check_reference().is_ok());

        let with_school = CreateEnrollmentDto {
            school_id: Some(SchoolId::new()),
            ..dto(EnrollmentType::Individual)
        };
        assert!(with_school.check_reference().is_err());
    }

    #[test]
    fn test_typed_enrollments_need_matching_reference() {
        assert!(dto(EnrollmentType::Group).check_reference().is_err());

        let group = CreateEnrollmentDto {
            group_class_id: Some(GroupClassId::new()),
            ..dto(EnrollmentType::Group)
        };
        assert!(group.check_reference().is_ok());
        assert_eq!(
            group.reference_id(),
            group.group_class_id.map(|id| id.into_inner())
        );

        let wrong = CreateEnrollmentDto {
            school_id: Some(SchoolId::new()),
            ..dto(EnrollmentType::Family)
        };
        let message = wrong.check_reference().unwrap_err();
        assert!(message.contains("family_id"));

        let both = CreateEnrollmentDto {
            family_id: Some(FamilyId::new()),
            school_id: Some(SchoolId::new()),
            ..dto(EnrollmentType::Family)
        };
        assert!(both.check_reference().is_err());
    }

    #[test]
    fn test_transition_table() {
        use EnrollmentStatus::*;

        let cases = [
            (EnrollmentAction::Approve, Pending, true),
            (EnrollmentAction::Approve, Approved, false),
            (EnrollmentAction::Approve, Rejected, false),
            (EnrollmentAction::Reject, Pending, true),
            (EnrollmentAction::Reject, Approved, false),
            (EnrollmentAction::Cancel, Pending, true),
            (EnrollmentAction::Cancel, Approved, true),
            (EnrollmentAction::Cancel, Completed, false),
            (EnrollmentAction::Cancel, Cancelled, false),
            (EnrollmentAction::Complete, Approved, true),
            (EnrollmentAction::Complete, Pending, false),
            (EnrollmentAction::Complete, Completed, false),
        ];

        for (action, from, allowed) in cases {
            assert_eq!(action.can_apply(from), allowed, "{:?} from {:?}", action, from);
        }
    }

    #[test]
    fn test_action_targets() {
        assert_eq!(EnrollmentAction::Approve.target(), EnrollmentStatus::Approved);
        assert_eq!(EnrollmentAction::Reject.target(), EnrollmentStatus::Rejected);
        assert_eq!(EnrollmentAction::Cancel.target(), EnrollmentStatus::Cancelled);
        assert_eq!(EnrollmentAction::Complete.target(), EnrollmentStatus::Completed);
    }

    #[test]
    fn test_negative_fee_is_invalid() {
        let dto = CreateEnrollmentDto {
            monthly_fee_cents: -1,
            ..dto(EnrollmentType::Individual)
        };
        assert!(dto.validate().is_err());
    }
}
