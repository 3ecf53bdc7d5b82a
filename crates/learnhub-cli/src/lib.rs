//! # LearnHub CLI
//!
//! Administrative tasks run against the database directly:
//!
//! - [`admin::create_admin`]: create an administrator account
//! - [`seeder::seed_all`]: fill the database with fake users, schools,
//!   families, groups and enrollments
//! - [`backfill::backfill_student_ids`]: issue `STU-` ids to students missing one
//! - [`seeder::clear_all`]: remove everything the seeder created
//!
//! ```ignore
//! use learnhub_cli::seeder::{seed_all, SeedConfig};
//!
//! seed_all(&pool, &SystemIdGenerator::default(), SeedConfig::default()).await?;
//! ```

pub mod admin;
pub mod backfill;
pub mod seeder;
