//! Storage-level errors.
//!
//! Constraint violations are lifted out of [`sqlx::Error`] so callers can
//! react to them without knowing PostgreSQL SQLSTATE codes.

pub use sqlx::Error as SqlxError;

/// PostgreSQL `unique_violation`.
const PG_UNIQUE_VIOLATION: &str = "23505";
/// PostgreSQL `foreign_key_violation`.
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

/// Constraint backing the project code's global uniqueness.
pub const PROJECT_CODE_CONSTRAINT: &str = "uq_projects_unique_code";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("Foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    /// Whether this is the duplicate-project-code violation.
    pub fn is_duplicate_code(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { constraint } if constraint == PROJECT_CODE_CONSTRAINT)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.code().as_deref() {
                Some(PG_UNIQUE_VIOLATION) => return StoreError::UniqueViolation { constraint },
                Some(PG_FOREIGN_KEY_VIOLATION) => {
                    return StoreError::ForeignKeyViolation { constraint }
                }
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}
