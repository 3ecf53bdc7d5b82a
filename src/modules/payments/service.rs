use anyhow::anyhow;
use learnhub_core::{AppError, PaginationMeta, PaginationParams};
use learnhub_db::constraints::unique_violation;
use learnhub_models::payments::{
    MonthlyPayment, PaginatedPaymentsResponse, ReviewPaymentDto, SubmitPaymentDto,
    first_day_of_month,
};
use learnhub_models::{PaymentStatus, ProofStatus};
use learnhub_observability::track_payment_reviewed;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::modules::enrollments::service::EnrollmentService;
use crate::utils::query::Filters;

const PAYMENT_COLUMNS: &str = "id, enrollment_id, billing_month, amount_cents, proof_url, status, \
     reviewer_note, submitted_at, reviewed_at";

/// Outcome of reviewing a pending proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Review {
    Verify,
    Reject,
}

impl Review {
    fn proof_status(self) -> ProofStatus {
        match self {
            Self::Verify => ProofStatus::Verified,
            Self::Reject => ProofStatus::Rejected,
        }
    }

    fn enrollment_status(self) -> PaymentStatus {
        match self {
            Self::Verify => PaymentStatus::Paid,
            Self::Reject => PaymentStatus::Rejected,
        }
    }
}

pub struct PaymentService;

impl PaymentService {
    /// Record a payment proof for one billing month. A rejected proof for the
    /// same month is replaced; any other existing proof is a conflict.
    #[instrument(skip(db, dto), fields(enrollment.id = %enrollment_id, db.operation = "INSERT", db.table = "monthly_payments"))]
    pub async fn submit_payment(
        db: &PgPool,
        enrollment_id: Uuid,
        dto: SubmitPaymentDto,
    ) -> Result<MonthlyPayment, AppError> {
        let billing_month = first_day_of_month(dto.billing_month);

        let mut tx = db.begin().await?;
        let enrollment = EnrollmentService::find(&mut tx, enrollment_id, true).await?;

        if !enrollment.status.is_active() {
            return Err(AppError::conflict(anyhow!(
                "Payments cannot be submitted for a {} enrollment",
                enrollment.status
            )));
        }

        let existing = sqlx::query_scalar::<_, ProofStatus>(
            "SELECT status FROM monthly_payments
             WHERE enrollment_id = $1 AND billing_month = $2
             FOR UPDATE",
        )
        .bind(enrollment_id)
        .bind(billing_month)
        .fetch_optional(&mut *tx)
        .await?;

        let payment = match existing {
            Some(ProofStatus::Rejected) => {
                info!(billing.month = %billing_month, "Resubmitting rejected payment proof");
                sqlx::query_as::<_, MonthlyPayment>(&format!(
                    "UPDATE monthly_payments SET
                        amount_cents = $3,
                        proof_url = $4,
                        status = 'pending',
                        reviewer_note = NULL,
                        reviewed_at = NULL,
                        submitted_at = NOW()
                     WHERE enrollment_id = $1 AND billing_month = $2
                     RETURNING {PAYMENT_COLUMNS}"
                ))
                .bind(enrollment_id)
                .bind(billing_month)
                .bind(dto.amount_cents)
                .bind(&dto.proof_url)
                .fetch_one(&mut *tx)
                .await?
            }
            Some(status) => {
                warn!(billing.month = %billing_month, %status, "Duplicate payment proof");
                return Err(AppError::conflict(anyhow!(
                    "A {} payment for {} already exists",
                    status,
                    billing_month.format("%Y-%m")
                )));
            }
            None => sqlx::query_as::<_, MonthlyPayment>(&format!(
                "INSERT INTO monthly_payments (enrollment_id, billing_month, amount_cents, proof_url)
                 VALUES ($1, $2, $3, $4)
                 RETURNING {PAYMENT_COLUMNS}"
            ))
            .bind(enrollment_id)
            .bind(billing_month)
            .bind(dto.amount_cents)
            .bind(&dto.proof_url)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match unique_violation(&e) {
                Some("monthly_payments_enrollment_month_key") => AppError::conflict(anyhow!(
                    "A payment for {} already exists",
                    billing_month.format("%Y-%m")
                )),
                _ => AppError::database(e),
            })?,
        };

        sqlx::query(
            "UPDATE class_enrollments SET payment_status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(enrollment_id)
        .bind(PaymentStatus::PendingVerification)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(payment.id = %payment.id, billing.month = %payment.billing_month, "Payment proof submitted");
        Ok(payment)
    }

    #[instrument(skip(db, pagination), fields(enrollment.id = %enrollment_id, db.operation = "SELECT", db.table = "monthly_payments"))]
    pub async fn list_for_enrollment(
        db: &PgPool,
        enrollment_id: Uuid,
        pagination: PaginationParams,
    ) -> Result<PaginatedPaymentsResponse, AppError> {
        EnrollmentService::get_enrollment(db, enrollment_id).await?;

        let mut conditions = Filters::new();
        conditions.push("enrollment_id = {}::uuid", enrollment_id);
        Self::page(db, &conditions, "billing_month DESC", pagination).await
    }

    /// Pending proofs, oldest submission first.
    #[instrument(skip(db, pagination), fields(db.operation = "SELECT", db.table = "monthly_payments"))]
    pub async fn list_pending(
        db: &PgPool,
        pagination: PaginationParams,
    ) -> Result<PaginatedPaymentsResponse, AppError> {
        let mut conditions = Filters::new();
        conditions.push("status = {}", ProofStatus::Pending);
        Self::page(db, &conditions, "submitted_at ASC", pagination).await
    }

    async fn page(
        db: &PgPool,
        conditions: &Filters,
        order_by: &str,
        pagination: PaginationParams,
    ) -> Result<PaginatedPaymentsResponse, AppError> {
        let total = conditions.count(db, "monthly_payments").await?;
        let payments = conditions
            .fetch_page::<MonthlyPayment>(
                db,
                &format!("SELECT {PAYMENT_COLUMNS} FROM monthly_payments"),
                order_by,
                pagination.limit(),
                pagination.offset(),
            )
            .await?;

        Ok(PaginatedPaymentsResponse {
            data: payments,
            meta: PaginationMeta::new(total, &pagination),
        })
    }

    /// Verify or reject a pending proof and mirror the outcome on the
    /// enrollment's payment status.
    #[instrument(skip(db, dto), fields(payment.id = %payment_id, review = ?review, db.operation = "UPDATE", db.table = "monthly_payments"))]
    pub async fn review_payment(
        db: &PgPool,
        payment_id: Uuid,
        review: Review,
        dto: ReviewPaymentDto,
    ) -> Result<MonthlyPayment, AppError> {
        let mut tx = db.begin().await?;

        // Lock order is enrollment then payment, the same as submit_payment.
        let enrollment_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT enrollment_id FROM monthly_payments WHERE id = $1",
        )
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Payment not found")))?;

        EnrollmentService::find(&mut tx, enrollment_id, true).await?;

        let current = sqlx::query_as::<_, MonthlyPayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM monthly_payments WHERE id = $1 FOR UPDATE"
        ))
        .bind(payment_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Payment not found")))?;

        if current.status != ProofStatus::Pending {
            return Err(AppError::conflict(anyhow!(
                "Payment has already been {}",
                current.status
            )));
        }

        let payment = sqlx::query_as::<_, MonthlyPayment>(&format!(
            "UPDATE monthly_payments SET status = $2, reviewer_note = $3, reviewed_at = NOW()
             WHERE id = $1
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(payment_id)
        .bind(review.proof_status())
        .bind(&dto.note)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE class_enrollments SET payment_status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(payment.enrollment_id)
        .bind(review.enrollment_status())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        track_payment_reviewed(payment.status.as_str());
        info!(payment.id = %payment.id, status = %payment.status, "Payment reviewed");

        Ok(payment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_outcomes() {
        assert_eq!(Review::Verify.proof_status(), ProofStatus::Verified);
        assert_eq!(Review::Verify.enrollment_status(), PaymentStatus::Paid);
        assert_eq!(Review::Reject.proof_status(), ProofStatus::Rejected);
        assert_eq!(Review::Reject.enrollment_status(), PaymentStatus::Rejected);
    }
}
