//! Per-typology unique code generation.

use std::sync::Arc;

use secplan_core::code::{format_code, is_well_formed, next_sequence};
use secplan_core::error::CoreError;
use secplan_core::types::DbId;
use secplan_db::models::lookup::Typology;
use secplan_db::ProjectStore;

use crate::store_error::map_store_error;

/// Derives the next `{ABBR}-{NNN}` code from the latest project of a
/// typology.
///
/// Reading the latest code and inserting the new project are separate
/// storage calls. Two concurrent creations can compute the same code; the
/// unique constraint rejects the second and the caller sees a conflict.
/// Nothing here retries.
#[derive(Clone)]
pub struct CodeGenerator {
    store: Arc<dyn ProjectStore>,
}

impl CodeGenerator {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }

    /// Next code for `typology_id`. Fails with `NotFound` for an unknown
    /// typology.
    pub async fn generate(&self, typology_id: DbId) -> Result<String, CoreError> {
        let typology = self
            .store
            .find_typology(typology_id)
            .await
            .map_err(map_store_error)?
            .ok_or(CoreError::NotFound {
                entity: "Typology",
                id: typology_id,
            })?;
        self.generate_for(&typology).await
    }

    /// Next code for an already resolved typology.
    pub async fn generate_for(&self, typology: &Typology) -> Result<String, CoreError> {
        let latest = self
            .store
            .latest_code_for_typology(typology.id)
            .await
            .map_err(map_store_error)?;
        let code = format_code(&typology.abbreviation, next_sequence(latest.as_deref()));
        if !is_well_formed(&code) {
            return Err(CoreError::Internal(format!(
                "typology {} has abbreviation {:?}, which cannot form a project code",
                typology.id, typology.abbreviation
            )));
        }
        tracing::debug!(
            typology_id = typology.id,
            latest = ?latest,
            code = %code,
            "Generated project code"
        );
        Ok(code)
    }
}
