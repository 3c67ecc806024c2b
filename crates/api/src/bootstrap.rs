//! Start-up provisioning of the configured administrator account.

use secplan_core::roles::Role;
use secplan_db::models::user::CreateUser;
use secplan_db::UserStore;

use crate::auth::password::hash_password;
use crate::config::BootstrapAdmin;
use crate::error::{AppError, AppResult};

/// Create the administrator unless a user with that email already exists.
///
/// Returns `true` when a user was created. An existing account is left
/// untouched, including its password.
pub async fn ensure_admin(users: &dyn UserStore, admin: &BootstrapAdmin) -> AppResult<bool> {
    if let Some(existing) = users.find_user_by_email(&admin.email).await? {
        tracing::debug!(user_id = existing.id, "Bootstrap admin already present");
        return Ok(false);
    }

    let password_hash = hash_password(&admin.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = users
        .create_user(&CreateUser {
            email: admin.email.clone(),
            name: admin.name.clone(),
            role: Role::Admin,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = user.id, email = %user.email, "Bootstrap admin created");
    Ok(true)
}
