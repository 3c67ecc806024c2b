//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! meet the requirement: 401 without a valid token, 403 with the wrong role.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use secplan_core::access::can_create;
use secplan_core::error::CoreError;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires a role that may register projects (`ADMIN` or `COORDINATOR`).
///
/// ```ignore
/// async fn create(RequireCreator(user): RequireCreator) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireCreator(pub AuthUser);

impl FromRequestParts<AppState> for RequireCreator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !can_create(user.role) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Coordinator or Admin role required".into(),
            )));
        }
        Ok(RequireCreator(user))
    }
}

/// Requires any authenticated user (any valid role).
///
/// Functionally equivalent to [`AuthUser`] but named explicitly for routes
/// whose intent "this route requires authentication" should read at a glance.
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(RequireAuth(user))
    }
}
