//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the caller from a JWT Bearer token.
//!   `Option<AuthUser>` yields `None` for anonymous requests.
//! - [`rbac::RequireCreator`] -- Requires a role allowed to create projects.
//! - [`rbac::RequireAuth`] -- Requires any authenticated user.

pub mod auth;
pub mod rbac;
