use anyhow::anyhow;
use chrono::NaiveTime;
use learnhub_core::AppError;
use learnhub_db::constraints::foreign_key_violation;
use learnhub_models::class_times::{
    ClassTime, ClassTimeFilterParams, CreateClassTimeDto, UpdateClassTimeDto, WEEKDAYS,
    check_time_range, time_ranges_overlap,
};
use learnhub_models::ids::GroupClassId;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::utils::query::Filters;

const CLASS_TIME_COLUMNS: &str = "id, class_name, group_class_id, day_of_week, start_time, \
     end_time, timezone, created_at, updated_at";

/// A proposed slot, checked against the other slots of the same class.
struct Slot<'a> {
    class_name: &'a str,
    group_class_id: Option<GroupClassId>,
    day_of_week: i16,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

fn find_overlap<'a>(slot: &Slot<'_>, existing: &'a [ClassTime]) -> Option<&'a ClassTime> {
    existing.iter().find(|other| {
        other.day_of_week == slot.day_of_week
            && time_ranges_overlap(slot.start_time, slot.end_time, other.start_time, other.end_time)
    })
}

pub struct ClassTimeService;

impl ClassTimeService {
    /// Reject `slot` when it overlaps another slot of the same class on the
    /// same day. Serialized per class name for the rest of the transaction.
    async fn check_overlap(
        conn: &mut PgConnection,
        slot: &Slot<'_>,
        exclude: Option<Uuid>,
    ) -> Result<(), AppError> {
        check_time_range(slot.start_time, slot.end_time)
            .map_err(|msg| AppError::unprocessable(anyhow!(msg)))?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(slot.class_name)
            .execute(&mut *conn)
            .await?;

        let siblings = sqlx::query_as::<_, ClassTime>(&format!(
            "SELECT {CLASS_TIME_COLUMNS} FROM class_times
             WHERE class_name = $1
               AND group_class_id IS NOT DISTINCT FROM $2
               AND day_of_week = $3
               AND ($4::uuid IS NULL OR id <> $4)"
        ))
        .bind(slot.class_name)
        .bind(slot.group_class_id)
        .bind(slot.day_of_week)
        .bind(exclude)
        .fetch_all(&mut *conn)
        .await?;

        if let Some(other) = find_overlap(slot, &siblings) {
            warn!(class.name = %slot.class_name, conflicting.id = %other.id, "Overlapping class time");
            return Err(AppError::conflict(anyhow!(
                "{} already meets on {} from {} to {}",
                slot.class_name,
                WEEKDAYS[other.day_of_week as usize],
                other.start_time.format("%H:%M"),
                other.end_time.format("%H:%M")
            )));
        }
        Ok(())
    }

    #[instrument(skip(db, dto), fields(class.name = %dto.class_name, db.operation = "INSERT", db.table = "class_times"))]
    pub async fn create_class_time(
        db: &PgPool,
        dto: CreateClassTimeDto,
    ) -> Result<ClassTime, AppError> {
        let mut tx = db.begin().await?;
        let slot = Slot {
            class_name: &dto.class_name,
            group_class_id: dto.group_class_id,
            day_of_week: dto.day_of_week,
            start_time: dto.start_time,
            end_time: dto.end_time,
        };
        Self::check_overlap(&mut tx, &slot, None).await?;

        let class_time = sqlx::query_as::<_, ClassTime>(&format!(
            "INSERT INTO class_times (class_name, group_class_id, day_of_week, start_time, end_time, timezone)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'UTC'))
             RETURNING {CLASS_TIME_COLUMNS}"
        ))
        .bind(&dto.class_name)
        .bind(dto.group_class_id)
        .bind(dto.day_of_week)
        .bind(dto.start_time)
        .bind(dto.end_time)
        .bind(&dto.timezone)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match foreign_key_violation(&e) {
            Some(_) => AppError::not_found(anyhow!("Group class not found")),
            None => AppError::database(e),
        })?;

        tx.commit().await?;

        info!(class_time.id = %class_time.id, "Class time created");
        Ok(class_time)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "class_times"))]
    pub async fn list_class_times(
        db: &PgPool,
        filters: ClassTimeFilterParams,
    ) -> Result<Vec<ClassTime>, AppError> {
        let mut conditions = Filters::new();
        conditions
            .push_opt("class_name = {}", filters.class_name.as_deref())
            .push_opt("group_class_id = {}::uuid", filters.group_class_id)
            .push_opt("day_of_week = {}::smallint", filters.day_of_week);

        let sql = format!(
            "SELECT {CLASS_TIME_COLUMNS} FROM class_times{} ORDER BY day_of_week, start_time",
            conditions.where_clause()
        );
        let mut query = sqlx::query_as::<_, ClassTime>(&sql);
        for param in conditions.params() {
            query = query.bind(param);
        }
        Ok(query.fetch_all(db).await?)
    }

    #[instrument(skip(db, dto), fields(class_time.id = %class_time_id, db.operation = "UPDATE", db.table = "class_times"))]
    pub async fn update_class_time(
        db: &PgPool,
        class_time_id: Uuid,
        dto: UpdateClassTimeDto,
    ) -> Result<ClassTime, AppError> {
        let mut tx = db.begin().await?;

        let current = sqlx::query_as::<_, ClassTime>(&format!(
            "SELECT {CLASS_TIME_COLUMNS} FROM class_times WHERE id = $1 FOR UPDATE"
        ))
        .bind(class_time_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Class time not found")))?;

        let slot = Slot {
            class_name: &current.class_name,
            group_class_id: current.group_class_id,
            day_of_week: dto.day_of_week.unwrap_or(current.day_of_week),
            start_time: dto.start_time.unwrap_or(current.start_time),
            end_time: dto.end_time.unwrap_or(current.end_time),
        };
        Self::check_overlap(&mut tx, &slot, Some(class_time_id)).await?;

        let class_time = sqlx::query_as::<_, ClassTime>(&format!(
            "UPDATE class_times SET
                day_of_week = $2,
                start_time = $3,
                end_time = $4,
                timezone = COALESCE($5, timezone),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {CLASS_TIME_COLUMNS}"
        ))
        .bind(class_time_id)
        .bind(slot.day_of_week)
        .bind(slot.start_time)
        .bind(slot.end_time)
        .bind(&dto.timezone)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(class_time.id = %class_time.id, "Class time updated");
        Ok(class_time)
    }

    #[instrument(skip(db), fields(class_time.id = %class_time_id, db.operation = "DELETE", db.table = "class_times"))]
    pub async fn delete_class_time(db: &PgPool, class_time_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM class_times WHERE id = $1")
            .bind(class_time_id)
            .execute(db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(anyhow!("Class time not found")));
        }

        info!(class_time.id = %class_time_id, "Class time deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use learnhub_models::ids::ClassTimeId;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn existing(day: i16, start: NaiveTime, end: NaiveTime) -> ClassTime {
        ClassTime {
            id: ClassTimeId::new(),
            class_name: "Algebra".to_string(),
            group_class_id: None,
            day_of_week: day,
            start_time: start,
            end_time: end,
            timezone: "UTC".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn slot(day: i16, start: NaiveTime, end: NaiveTime) -> Slot<'static> {
        Slot {
            class_name: "Algebra",
            group_class_id: None,
            day_of_week: day,
            start_time: start,
            end_time: end,
        }
    }

    #[test]
    fn test_overlap_on_same_day() {
        let slots = vec![existing(0, time(9, 0), time(10, 30))];
        assert!(find_overlap(&slot(0, time(10, 0), time(11, 0)), &slots).is_some());
    }

    #[test]
    fn test_adjacent_slots_do_not_overlap() {
        let slots = vec![existing(0, time(9, 0), time(10, 30))];
        assert!(find_overlap(&slot(0, time(10, 30), time(12, 0)), &slots).is_none());
    }

    #[test]
    fn test_other_day_does_not_overlap() {
        let slots = vec![existing(1, time(9, 0), time(10, 30))];
        assert!(find_overlap(&slot(0, time(9, 0), time(10, 30)), &slots).is_none());
    }
}
