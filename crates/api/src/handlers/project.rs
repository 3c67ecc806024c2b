//! Handlers for the `/projects` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use secplan_core::error::CoreError;
use secplan_core::query::ProjectListParams;
use secplan_core::types::DbId;
use secplan_db::models::project::{CreateProject, ProjectPage, ProjectView, UpdateProject};

use crate::error::{AppError, AppResult};
use crate::extract::{JsonBody, QueryParams};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAuth, RequireCreator};
use crate::state::AppState;

/// Parse a path segment as a positive project id.
///
/// Taking the raw segment keeps a malformed id a `VALIDATION_ERROR` rather
/// than axum's plain-text path rejection.
pub fn parse_id(raw: &str) -> Result<DbId, CoreError> {
    raw.trim()
        .parse::<DbId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| CoreError::Validation("Invalid project id".into()))
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Project",
        id,
    })
}

/// GET /api/v1/projects
///
/// Anonymous callers receive the public projection.
pub async fn list(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    QueryParams(params): QueryParams<ProjectListParams>,
) -> AppResult<Json<ProjectPage>> {
    let caller = user.map(|u| u.caller());
    let page = state.projects.list(params, caller.as_ref()).await?;
    Ok(Json(page))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<ProjectView>> {
    let id = parse_id(&raw_id)?;
    let caller = user.map(|u| u.caller());
    let project = state
        .projects
        .get(id, caller.as_ref())
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(project))
}

/// POST /api/v1/projects
///
/// Code, id and timestamps are assigned by the server.
pub async fn create(
    State(state): State<AppState>,
    RequireCreator(user): RequireCreator,
    JsonBody(input): JsonBody<CreateProject>,
) -> AppResult<(StatusCode, Json<ProjectView>)> {
    let caller = user.caller();
    let project = state.projects.create(input, Some(&caller)).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// PUT | PATCH /api/v1/projects/{id}
///
/// Both verbs apply partial-update semantics: omitted fields are kept,
/// explicit `null` clears a nullable field.
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(raw_id): Path<String>,
    JsonBody(input): JsonBody<UpdateProject>,
) -> AppResult<Json<ProjectView>> {
    let id = parse_id(&raw_id)?;
    let caller = user.caller();
    let project = state
        .projects
        .update(id, input, Some(&caller))
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(project))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_id_accepts_positive_integers() {
        assert_eq!(parse_id("7").unwrap(), 7);
        assert_eq!(parse_id(" 42 ").unwrap(), 42);
    }

    #[test]
    fn parse_id_rejects_everything_else() {
        for raw in ["abc", "0", "-3", "1.5", "", "7abc"] {
            assert_matches!(parse_id(raw), Err(CoreError::Validation(_)), "{raw}");
        }
    }
}
