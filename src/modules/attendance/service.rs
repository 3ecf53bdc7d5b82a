use std::collections::HashSet;

use anyhow::anyhow;
use chrono::NaiveDate;
use learnhub_core::AppError;
use learnhub_db::constraints::foreign_key_violation;
use learnhub_models::attendance::{
    AttendanceRangeParams, AttendanceRecord, AttendanceSummary, BulkAttendanceDto,
    RecordAttendanceDto,
};
use learnhub_models::ids::{ClassTimeId, EnrollmentId};
use learnhub_models::{AttendanceStatus, EnrollmentStatus};
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::modules::enrollments::service::EnrollmentService;

const ATTENDANCE_COLUMNS: &str =
    "id, enrollment_id, class_time_id, class_date, status, note, created_at, updated_at";

fn check_range(range: &AttendanceRangeParams) -> Result<(), AppError> {
    match (range.from, range.to) {
        (Some(from), Some(to)) if from > to => Err(AppError::bad_request(anyhow!(
            "from ({}) must not be after to ({})",
            from,
            to
        ))),
        _ => Ok(()),
    }
}

pub struct AttendanceService;

impl AttendanceService {
    async fn upsert(
        conn: &mut PgConnection,
        enrollment_id: EnrollmentId,
        class_time_id: Option<ClassTimeId>,
        class_date: NaiveDate,
        status: AttendanceStatus,
        note: Option<&str>,
    ) -> Result<AttendanceRecord, AppError> {
        sqlx::query_as::<_, AttendanceRecord>(&format!(
            "INSERT INTO attendance_records (enrollment_id, class_time_id, class_date, status, note)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (enrollment_id, class_date) DO UPDATE SET
                class_time_id = COALESCE(EXCLUDED.class_time_id, attendance_records.class_time_id),
                status = EXCLUDED.status,
                note = EXCLUDED.note,
                updated_at = NOW()
             RETURNING {ATTENDANCE_COLUMNS}"
        ))
        .bind(enrollment_id)
        .bind(class_time_id)
        .bind(class_date)
        .bind(status)
        .bind(note)
        .fetch_one(conn)
        .await
        .map_err(|e| match foreign_key_violation(&e) {
            Some(_) => AppError::not_found(anyhow!("Class time not found")),
            None => AppError::database(e),
        })
    }

    /// Record (or correct) one attendance entry of an approved enrollment.
    #[instrument(skip(db, dto), fields(enrollment.id = %dto.enrollment_id, class.date = %dto.class_date, db.operation = "UPSERT", db.table = "attendance_records"))]
    pub async fn record_attendance(
        db: &PgPool,
        dto: RecordAttendanceDto,
    ) -> Result<AttendanceRecord, AppError> {
        let mut tx = db.begin().await?;

        let enrollment = EnrollmentService::find(&mut tx, dto.enrollment_id.into(), false).await?;
        if enrollment.status != EnrollmentStatus::Approved {
            return Err(AppError::conflict(anyhow!(
                "Attendance can only be recorded for approved enrollments (status is {})",
                enrollment.status
            )));
        }

        let record = Self::upsert(
            &mut tx,
            dto.enrollment_id,
            dto.class_time_id,
            dto.class_date,
            dto.status,
            dto.note.as_deref(),
        )
        .await?;

        tx.commit().await?;

        debug!(attendance.id = %record.id, status = %record.status, "Attendance recorded");
        Ok(record)
    }

    /// Record a whole class date at once. Either every entry is stored or
    /// none is.
    #[instrument(skip(db, dto), fields(class.date = %dto.class_date, records = dto.records.len(), db.operation = "UPSERT", db.table = "attendance_records"))]
    pub async fn record_bulk(
        db: &PgPool,
        dto: BulkAttendanceDto,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let mut seen = HashSet::new();
        if let Some(duplicate) = dto.records.iter().find(|r| !seen.insert(r.enrollment_id)) {
            return Err(AppError::unprocessable(anyhow!(
                "Enrollment {} appears more than once",
                duplicate.enrollment_id
            )));
        }

        let ids: Vec<Uuid> = dto.records.iter().map(|r| r.enrollment_id.into()).collect();

        let mut tx = db.begin().await?;

        let statuses = sqlx::query_as::<_, (Uuid, EnrollmentStatus)>(
            "SELECT id, status FROM class_enrollments WHERE id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;

        if let Some(missing) = ids.iter().find(|id| !statuses.iter().any(|(found, _)| found == *id)) {
            return Err(AppError::not_found(anyhow!("Enrollment {} not found", missing)));
        }
        if let Some((id, status)) = statuses
            .iter()
            .find(|(_, status)| *status != EnrollmentStatus::Approved)
        {
            return Err(AppError::conflict(anyhow!(
                "Enrollment {} is {}, not approved",
                id,
                status
            )));
        }

        let mut records = Vec::with_capacity(dto.records.len());
        for entry in &dto.records {
            let record = Self::upsert(
                &mut tx,
                entry.enrollment_id,
                dto.class_time_id,
                dto.class_date,
                entry.status,
                entry.note.as_deref(),
            )
            .await?;
            records.push(record);
        }

        tx.commit().await?;

        info!(count = records.len(), "Bulk attendance recorded");
        Ok(records)
    }

    #[instrument(skip(db, range), fields(enrollment.id = %enrollment_id, db.operation = "SELECT", db.table = "attendance_records"))]
    pub async fn list_for_enrollment(
        db: &PgPool,
        enrollment_id: Uuid,
        range: AttendanceRangeParams,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        check_range(&range)?;
        EnrollmentService::get_enrollment(db, enrollment_id).await?;

        let records = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance_records
             WHERE enrollment_id = $1
               AND ($2::date IS NULL OR class_date >= $2)
               AND ($3::date IS NULL OR class_date <= $3)
             ORDER BY class_date"
        ))
        .bind(enrollment_id)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(db)
        .await?;

        Ok(records)
    }

    #[instrument(skip(db, range), fields(enrollment.id = %enrollment_id, db.operation = "SELECT", db.table = "attendance_records"))]
    pub async fn summary(
        db: &PgPool,
        enrollment_id: Uuid,
        range: AttendanceRangeParams,
    ) -> Result<AttendanceSummary, AppError> {
        check_range(&range)?;
        EnrollmentService::get_enrollment(db, enrollment_id).await?;

        let counts = sqlx::query_as::<_, (AttendanceStatus, i64)>(
            "SELECT status, COUNT(*) FROM attendance_records
             WHERE enrollment_id = $1
               AND ($2::date IS NULL OR class_date >= $2)
               AND ($3::date IS NULL OR class_date <= $3)
             GROUP BY status",
        )
        .bind(enrollment_id)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(db)
        .await?;

        Ok(AttendanceSummary::from_counts(enrollment_id.into(), counts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_check_range() {
        let open = AttendanceRangeParams { from: None, to: None };
        assert!(check_range(&open).is_ok());

        let ordered = AttendanceRangeParams {
            from: Some(date("2024-01-01")),
            to: Some(date("2024-01-31")),
        };
        assert!(check_range(&ordered).is_ok());

        let reversed = AttendanceRangeParams {
            from: Some(date("2024-02-01")),
            to: Some(date("2024-01-31")),
        };
        assert!(check_range(&reversed).is_err());
    }
}
