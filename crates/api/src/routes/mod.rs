pub mod auth;
pub mod health;
pub mod lookup;
pub mod project;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/login          login (public)
/// /auth/me             current user (requires auth)
///
/// /projects            list (optional auth), create (coordinator/admin)
/// /projects/{id}       get (optional auth), update via PUT or PATCH (requires auth)
///
/// /lookups             every catalog (optional auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/projects", project::router())
        .nest("/lookups", lookup::router())
}
