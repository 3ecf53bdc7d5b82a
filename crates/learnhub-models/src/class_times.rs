//! Weekly class schedule slots.

use chrono::{DateTime, NaiveTime, Utc};
use learnhub_core::serde::{deserialize_optional_string, deserialize_optional_uuid};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::ids::{ClassTimeId, GroupClassId};

pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClassTime {
    pub id: ClassTimeId,
    pub class_name: String,
    pub group_class_id: Option<GroupClassId>,
    /// 0 = Monday through 6 = Sunday
    pub day_of_week: i16,
    #[schema(value_type = String, format = "time", example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, format = "time", example = "10:30:00")]
    pub end_time: NaiveTime,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateClassTimeDto {
    #[validate(length(min = 1, max = 200, message = "class_name must be 1-200 characters"))]
    pub class_name: String,
    pub group_class_id: Option<GroupClassId>,
    #[validate(range(min = 0, max = 6, message = "day_of_week must be between 0 (Monday) and 6 (Sunday)"))]
    pub day_of_week: i16,
    #[schema(value_type = String, format = "time", example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, format = "time", example = "10:30:00")]
    pub end_time: NaiveTime,
    #[validate(length(min = 1, max = 64))]
    pub timezone: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateClassTimeDto {
    #[validate(range(min = 0, max = 6, message = "day_of_week must be between 0 (Monday) and 6 (Sunday)"))]
    pub day_of_week: Option<i16>,
    #[schema(value_type = Option<String>, format = "time")]
    pub start_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>, format = "time")]
    pub end_time: Option<NaiveTime>,
    #[validate(length(min = 1, max = 64))]
    pub timezone: Option<String>,
}

fn deserialize_optional_day<'de, D>(deserializer: D) -> Result<Option<i16>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s.parse::<i16>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClassTimeFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub class_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub group_class_id: Option<Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_day")]
    pub day_of_week: Option<i16>,
}

/// Half-open interval overlap: a slot ending at 10:00 does not clash with
/// one starting at 10:00.
pub fn time_ranges_overlap(
    a_start: NaiveTime,
    a_end: NaiveTime,
    b_start: NaiveTime,
    b_end: NaiveTime,
) -> bool {
    a_start < b_end && b_start < a_end
}

pub fn check_time_range(start: NaiveTime, end: NaiveTime) -> Result<(), String> {
    if start >= end {
        return Err("start_time must be before end_time".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_overlap_detection() {
        assert!(time_ranges_overlap(t(9, 0), t(10, 0), t(9, 30), t(11, 0)));
        assert!(time_ranges_overlap(t(9, 0), t(12, 0), t(10, 0), t(11, 0)));
        assert!(time_ranges_overlap(t(10, 0), t(11, 0), t(9, 0), t(12, 0)));
        assert!(!time_ranges_overlap(t(9, 0), t(10, 0), t(10, 0), t(11, 0)));
        assert!(!time_ranges_overlap(t(13, 0), t(14, 0), t(9, 0), t(10, 0)));
    }

    #[test]
    fn test_check_time_range() {
        assert!(check_time_range(t(9, 0), t(10, 0)).is_ok());
        assert!(check_time_range(t(10, 0), t(10, 0)).is_err());
        assert!(check_time_range(t(11, 0), t(10, 0)).is_err());
    }

    #[test]
    fn test_day_of_week_range() {
        let dto = CreateClassTimeDto {
            class_name: "Algebra I".to_string(),
            group_class_id: None,
            day_of_week: 7,
            start_time: t(9, 0),
            end_time: t(10, 0),
            timezone: None,
        };
        assert!(dto.validate().is_err());
        assert_eq!(WEEKDAYS[6], "Sunday");
    }
}
