//! JWT-based caller identity extractors for Axum handlers.

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderValue;
use axum::http::request::Parts;
use secplan_core::access::Caller;
use secplan_core::error::CoreError;
use secplan_core::roles::Role;
use secplan_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// Use `AuthUser` where identity is required and `Option<AuthUser>` where it
/// is optional:
///
/// ```ignore
/// async fn my_handler(user: Option<AuthUser>) -> AppResult<Json<()>> {
///     let caller = user.map(|u| u.caller());
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    pub role: Role,
}

impl AuthUser {
    /// The identity passed to the service layer.
    pub fn caller(&self) -> Caller {
        Caller::new(self.user_id, self.role)
    }
}

fn unauthorized(message: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(message.to_string()))
}

/// Decode the bearer token of a present `Authorization` header.
fn authenticate(header: &HeaderValue, state: &AppState) -> Result<AuthUser, AppError> {
    let token = header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| unauthorized("Invalid Authorization format. Expected: Bearer <token>"))?;

    let claims = validate_token(token, &state.config.jwt)
        .map_err(|_| unauthorized("Invalid or expired token"))?;

    let role = Role::from_name(&claims.role).map_err(|_| {
        tracing::warn!(user_id = claims.sub, role = %claims.role, "Token carries unknown role");
        unauthorized("Invalid or expired token")
    })?;

    Ok(AuthUser {
        user_id: claims.sub,
        role,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;
        authenticate(header, state)
    }
}

/// No header means an anonymous caller. A header that fails to verify is
/// still rejected with 401 rather than downgraded to anonymous.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match parts.headers.get(AUTHORIZATION) {
            None => Ok(None),
            Some(header) => authenticate(header, state).map(Some),
        }
    }
}
