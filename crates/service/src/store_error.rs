use secplan_core::error::CoreError;
use secplan_db::StoreError;

/// Translate a storage failure into the domain taxonomy.
///
/// Duplicate codes become a conflict, dangling references a validation
/// error. Anything else is logged here and surfaced without detail.
pub(crate) fn map_store_error(err: StoreError) -> CoreError {
    match err {
        ref e if e.is_duplicate_code() => CoreError::Conflict("duplicate code".to_string()),
        StoreError::UniqueViolation { constraint } => {
            CoreError::Conflict(format!("duplicate value for {constraint}"))
        }
        StoreError::ForeignKeyViolation { constraint } => {
            tracing::debug!(constraint = %constraint, "Rejected dangling reference");
            CoreError::Validation("invalid reference".to_string())
        }
        StoreError::Database(e) => {
            tracing::error!(error = %e, "Storage failure");
            CoreError::Internal("storage failure".to_string())
        }
    }
}
