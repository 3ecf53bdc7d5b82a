//! # LearnHub Core
//!
//! Foundational types shared by every LearnHub crate:
//!
//! - [`errors`]: application error type with HTTP response conversion
//! - [`pagination`]: limit/offset/page query parameters and response metadata
//! - [`password`]: bcrypt password hashing
//! - [`serde`]: lenient query-string deserializers
//! - [`system_id`]: human-readable system ID generation with collision retry
//!
//! # Example
//!
//! ```ignore
//! use learnhub_core::system_id::{SystemIdGenerator, SystemIdKind};
//!
//! let generator = SystemIdGenerator::new(10);
//! let claimed = generator.claim(&mut store, SystemIdKind::Student, owner).await?;
//! assert!(claimed.value.starts_with("STU-"));
//! ```

pub mod errors;
pub mod pagination;
pub mod password;
pub mod serde;
pub mod system_id;

pub use errors::{AppError, ErrorResponse};
pub use pagination::{PaginationMeta, PaginationParams};
pub use password::{hash_password, verify_password};
pub use system_id::{
    GeneratedId, SystemIdError, SystemIdGenerator, SystemIdKind, SystemIdOwner, SystemIdStore,
};
