//! Handler for the `/lookups` resource.

use axum::extract::State;
use axum::Json;
use secplan_db::models::lookup::LookupCatalog;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// GET /api/v1/lookups
///
/// Every catalog; the assignable-user list only for authenticated callers.
pub async fn get(
    State(state): State<AppState>,
    user: Option<AuthUser>,
) -> AppResult<Json<LookupCatalog>> {
    let caller = user.map(|u| u.caller());
    let catalog = state.lookups.catalog(caller.as_ref()).await?;
    Ok(Json(catalog))
}
