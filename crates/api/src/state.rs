use std::sync::Arc;

use secplan_db::{ProjectStore, UserStore};
use secplan_service::{LookupCatalogProvider, ProjectService};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every member is an `Arc` or wraps one.
#[derive(Clone)]
pub struct AppState {
    pub projects: ProjectService,
    pub lookups: LookupCatalogProvider,
    /// Project storage, used directly only by the health check.
    pub store: Arc<dyn ProjectStore>,
    pub users: Arc<dyn UserStore>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ProjectStore>,
        users: Arc<dyn UserStore>,
        config: ServerConfig,
    ) -> Self {
        Self {
            projects: ProjectService::new(Arc::clone(&store)),
            lookups: LookupCatalogProvider::new(Arc::clone(&store)),
            store,
            users,
            config: Arc::new(config),
        }
    }
}
