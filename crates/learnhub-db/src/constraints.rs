//! Helpers for turning constraint violations into domain errors.
//!
//! ```ignore
//! .map_err(|e| match unique_violation(&e) {
//!     Some("users_email_key") => AppError::conflict(anyhow!("Email already in use")),
//!     _ => AppError::database(e),
//! })
//! ```

/// Name of the violated unique constraint, if `err` is a unique violation.
pub fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Some(db_err.constraint().unwrap_or_default())
        }
        _ => None,
    }
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    unique_violation(err).is_some()
}

/// Name of the violated foreign key, if `err` is a foreign key violation.
pub fn foreign_key_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            Some(db_err.constraint().unwrap_or_default())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_violations() {
        let err = sqlx::Error::RowNotFound;
        assert!(unique_violation(&err).is_none());
        assert!(!is_unique_violation(&err));
        assert!(foreign_key_violation(&err).is_none());
    }
}
