//! Text-backed enums.
//!
//! Enum columns are stored as `TEXT` guarded by `CHECK` constraints. The
//! generated types encode to and decode from that text. Column text is always
//! the snake_case variant name, matching the serde spelling.

use serde::{Deserialize, Serialize};
use sqlx::{
    Database, Decode, Encode, Type,
    postgres::{PgHasArrayType, PgTypeInfo},
};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::value_types::ValueTypeError;

macro_rules! define_text_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($label:literal) {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValueTypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ValueTypeError::InvalidVariant {
                        type_name: $label,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl Type<sqlx::Postgres> for $name {
            fn type_info() -> PgTypeInfo {
                <String as Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &PgTypeInfo) -> bool {
                <String as Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'q> Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }

        impl<'r> Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: <sqlx::Postgres as Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <&str as Decode<'r, sqlx::Postgres>>::decode(value)?;
                Ok(s.parse::<$name>()?)
            }
        }

        impl PgHasArrayType for $name {
            fn array_type_info() -> PgTypeInfo {
                <String as PgHasArrayType>::array_type_info()
            }
        }
    };
}

define_text_enum!(
    UserRole("user role") {
        Admin => "admin",
        Teacher => "teacher",
        Student => "student",
        Parent => "parent",
    }
);

define_text_enum!(
    /// Who an enrollment is for. Each type except `Individual` references
    /// exactly one group class, family or school.
    EnrollmentType("enrollment type") {
        Individual => "individual",
        Group => "group",
        Family => "family",
        School => "school",
    }
);

define_text_enum!(
    EnrollmentStatus("enrollment status") {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Cancelled => "cancelled",
        Completed => "completed",
    }
);

define_text_enum!(
    /// Payment state of an enrollment, driven by proof review.
    PaymentStatus("payment status") {
        Unpaid => "unpaid",
        PendingVerification => "pending_verification",
        Paid => "paid",
        Rejected => "rejected",
    }
);

define_text_enum!(
    /// Review state of a single monthly payment proof.
    ProofStatus("proof status") {
        Pending => "pending",
        Verified => "verified",
        Rejected => "rejected",
    }
);

define_text_enum!(
    AttendanceStatus("attendance status") {
        Present => "present",
        Absent => "absent",
        Late => "late",
        Excused => "excused",
    }
);

define_text_enum!(
    MaterialType("material type") {
        Document => "document",
        Video => "video",
        Link => "link",
        Assignment => "assignment",
    }
);

define_text_enum!(
    CardHolderType("card holder type") {
        Student => "student",
        Family => "family",
        Group => "group",
        School => "school",
    }
);

impl EnrollmentStatus {
    /// Pending and approved enrollments block duplicates and accept payments.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }
}
