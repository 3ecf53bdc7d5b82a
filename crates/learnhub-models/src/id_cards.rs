//! ID cards and their QR scan resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::enrollments::Enrollment;
use crate::enums::CardHolderType;
use crate::ids::{EnrollmentId, IdCardId};

/// A card issued to one holder of an enrollment. `card_number` is the
/// holder's system ID; `redirect_url` is the QR payload.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct IdCard {
    pub id: IdCardId,
    pub card_number: String,
    pub holder_type: CardHolderType,
    pub holder_id: Uuid,
    pub enrollment_id: EnrollmentId,
    pub holder_name: String,
    pub qr_token: String,
    pub redirect_url: String,
    pub scan_count: i32,
    pub last_scanned_at: Option<DateTime<Utc>>,
    pub issued_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl IdCard {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// Someone a card can be printed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardHolder {
    pub holder_type: CardHolderType,
    pub holder_id: Uuid,
    pub name: String,
    /// Missing for student accounts created before system IDs were issued.
    pub system_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IssuedCardsResponse {
    pub enrollment_id: EnrollmentId,
    /// Every unrevoked card of the enrollment after issuing.
    pub cards: Vec<IdCard>,
    /// How many of `cards` were created by this request.
    pub newly_issued: usize,
}

/// Result of resolving a scanned token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CardResolution {
    pub card: IdCard,
    pub enrollment: Enrollment,
    /// Frontend page the scan redirects to.
    pub redirect_to: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_revoked() {
        let mut card = IdCard {
            id: IdCardId::new(),
            card_number: "STU-00001".to_string(),
            holder_type: CardHolderType::Student,
            holder_id: Uuid::new_v4(),
            enrollment_id: EnrollmentId::new(),
            holder_name: "Ada Lovelace".to_string(),
            qr_token: "ab".repeat(32),
            redirect_url: "http://localhost:3000/api/id-cards/scan/abab".to_string(),
            scan_count: 0,
            last_scanned_at: None,
            issued_at: Utc::now(),
            revoked_at: None,
        };
        assert!(!card.is_revoked());
        card.revoked_at = Some(Utc::now());
        assert!(card.is_revoked());
    }
}
