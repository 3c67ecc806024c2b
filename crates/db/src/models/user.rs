//! User entity model and DTOs.

use secplan_core::error::CoreError;
use secplan_core::roles::Role;
use secplan_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserInfo`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub name: String,
    /// Role name as stored (`ADMIN`, `COORDINATOR`, `USER`).
    pub role: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// The stored role parsed into [`Role`].
    pub fn role(&self) -> Result<Role, CoreError> {
        Role::from_name(&self.role)
    }
}

/// Public user fields returned after login and by `/auth/me`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub email: String,
    pub name: String,
    pub role: Role,
}

/// Minimal user reference for assignment pickers.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct UserSummary {
    pub id: DbId,
    pub name: String,
    pub email: String,
}

/// DTO for creating a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub password_hash: String,
}
