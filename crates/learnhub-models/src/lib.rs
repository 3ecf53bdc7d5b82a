//! # LearnHub Models
//!
//! Database entities, request DTOs and response types for the LearnHub API.
//!
//! - [`ids`]: UUID newtypes per entity
//! - [`value_types`]: validated email and phone number
//! - [`enums`]: text-backed status and type enums
//! - one module per domain area

pub mod attendance;
pub mod class_times;
pub mod enrollments;
pub mod enums;
pub mod families;
pub mod groups;
pub mod id_cards;
pub mod ids;
pub mod materials;
pub mod payments;
pub mod projects;
pub mod schools;
pub mod system_ids;
pub mod users;
pub mod value_types;

pub use enums::{
    AttendanceStatus, CardHolderType, EnrollmentStatus, EnrollmentType, MaterialType,
    PaymentStatus, ProofStatus, UserRole,
};
pub use value_types::{Email, PhoneNumber, ValueTypeError};
