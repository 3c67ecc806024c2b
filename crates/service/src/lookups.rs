//! Reference-data catalogs for filters and forms.

use std::sync::Arc;

use secplan_core::access::Caller;
use secplan_core::error::CoreError;
use secplan_db::models::lookup::LookupCatalog;
use secplan_db::ProjectStore;

use crate::store_error::map_store_error;

/// Read-only bulk fetch of every catalog, each ordered by name.
#[derive(Clone)]
pub struct LookupCatalogProvider {
    store: Arc<dyn ProjectStore>,
}

impl LookupCatalogProvider {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self { store }
    }

    /// All catalogs. The assignable-user list is only filled in for an
    /// authenticated caller.
    pub async fn catalog(&self, caller: Option<&Caller>) -> Result<LookupCatalog, CoreError> {
        self.store
            .lookups(caller.is_some())
            .await
            .map_err(map_store_error)
    }
}
