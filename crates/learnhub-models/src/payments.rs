//! Monthly payment proofs and their review.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use learnhub_core::pagination::PaginationMeta;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::enums::ProofStatus;
use crate::ids::{EnrollmentId, PaymentId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MonthlyPayment {
    pub id: PaymentId,
    pub enrollment_id: EnrollmentId,
    /// Always the first day of the billed month.
    pub billing_month: NaiveDate,
    pub amount_cents: i64,
    pub proof_url: String,
    pub status: ProofStatus,
    pub reviewer_note: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitPaymentDto {
    /// Any day within the billed month.
    pub billing_month: NaiveDate,
    #[validate(range(min = 1, message = "amount_cents must be positive"))]
    pub amount_cents: i64,
    #[validate(url(message = "proof_url must be a valid URL"))]
    pub proof_url: String,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct ReviewPaymentDto {
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedPaymentsResponse {
    pub data: Vec<MonthlyPayment>,
    pub meta: PaginationMeta,
}

/// Normalise a date to the first day of its month.
pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_day_of_month() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(
            first_day_of_month(date),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
    }

    #[test]
    fn test_submit_payment_dto_validation() {
        let valid = SubmitPaymentDto {
            billing_month: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            amount_cents: 1500,
            proof_url: "https://files.example.com/receipts/123.pdf".to_string(),
        };
        assert!(valid.validate().is_ok());

        let invalid = SubmitPaymentDto {
            amount_cents: 0,
            proof_url: "receipt.pdf".to_string(),
            ..valid
        };
        let errors = invalid.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("amount_cents"));
        assert!(errors.field_errors().contains_key("proof_url"));
    }
}
