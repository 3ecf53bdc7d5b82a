//! Attendance records per enrollment and class date.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::enums::AttendanceStatus;
use crate::ids::{AttendanceId, ClassTimeId, EnrollmentId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AttendanceRecord {
    pub id: AttendanceId,
    pub enrollment_id: EnrollmentId,
    pub class_time_id: Option<ClassTimeId>,
    pub class_date: NaiveDate,
    pub status: AttendanceStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Record or overwrite attendance for one enrollment on one date.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RecordAttendanceDto {
    pub enrollment_id: EnrollmentId,
    pub class_time_id: Option<ClassTimeId>,
    pub class_date: NaiveDate,
    pub status: AttendanceStatus,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct BulkAttendanceEntry {
    pub enrollment_id: EnrollmentId,
    pub status: AttendanceStatus,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct BulkAttendanceDto {
    pub class_date: NaiveDate,
    pub class_time_id: Option<ClassTimeId>,
    #[validate(
        length(min = 1, max = 500, message = "records must contain 1-500 entries"),
        nested
    )]
    pub records: Vec<BulkAttendanceEntry>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AttendanceRangeParams {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceSummary {
    pub enrollment_id: EnrollmentId,
    pub total: i64,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
    /// `(present + late) / total`, or 0 when nothing is recorded.
    pub attendance_rate: f64,
}

impl AttendanceSummary {
    pub fn from_counts(
        enrollment_id: EnrollmentId,
        counts: impl IntoIterator<Item = (AttendanceStatus, i64)>,
    ) -> Self {
        let mut summary = Self {
            enrollment_id,
            total: 0,
            present: 0,
            absent: 0,
            late: 0,
            excused: 0,
            attendance_rate: 0.0,
        };

        for (status, count) in counts {
            match status {
                AttendanceStatus::Present => summary.present += count,
                AttendanceStatus::Absent => summary.absent += count,
                AttendanceStatus::Late => summary.late += count,
                AttendanceStatus::Excused => summary.excused += count,
            }
            summary.total += count;
        }

        if summary.total > 0 {
            summary.attendance_rate = (summary.present + summary.late) as f64 / summary.total as f64;
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_rate_counts_late_as_attended() {
        let id = EnrollmentId::new();
        let summary = AttendanceSummary::from_counts(
            id,
            [
                (AttendanceStatus::Present, 6),
                (AttendanceStatus::Late, 2),
                (AttendanceStatus::Absent, 1),
                (AttendanceStatus::Excused, 1),
            ],
        );

        assert_eq!(summary.total, 10);
        assert_eq!(summary.present, 6);
        assert_eq!(summary.late, 2);
        assert!((summary.attendance_rate - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_empty() {
        let summary = AttendanceSummary::from_counts(EnrollmentId::new(), Vec::new());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.attendance_rate, 0.0);
    }

    #[test]
    fn test_bulk_requires_records() {
        let dto = BulkAttendanceDto {
            class_date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
            class_time_id: None,
            records: vec![],
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_bulk_validates_entries() {
        let dto = BulkAttendanceDto {
            class_date: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
            class_time_id: None,
            records: vec![BulkAttendanceEntry {
                enrollment_id: EnrollmentId::new(),
                status: AttendanceStatus::Present,
                note: Some("x".repeat(501)),
            }],
        };
        assert!(dto.validate().is_err());
    }
}
