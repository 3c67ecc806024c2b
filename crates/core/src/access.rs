//! Access policy for project mutations.
//!
//! Pure functions over the caller's role and the project's designer. They
//! return a decision and never fail; the service turns a denial into
//! [`CoreError::Forbidden`](crate::error::CoreError::Forbidden).

use crate::roles::Role;
use crate::types::DbId;

/// The verified identity behind a request. Absent for anonymous callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: DbId,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: DbId, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// Only admins and coordinators may register new projects.
pub fn can_create(role: Role) -> bool {
    match role {
        Role::Admin | Role::Coordinator => true,
        Role::User => false,
    }
}

/// Whether `role`/`caller_id` may edit a project whose designer is `designer_id`.
///
/// Admins and coordinators always may. A plain user may only edit projects
/// they are the designer of; an unassigned designer never matches.
pub fn can_edit(role: Role, caller_id: DbId, designer_id: Option<DbId>) -> bool {
    match role {
        Role::Admin | Role::Coordinator => true,
        Role::User => designer_id == Some(caller_id),
    }
}

/// [`can_edit`] for an optional caller. Anonymous callers never mutate.
pub fn caller_can_edit(caller: Option<&Caller>, designer_id: Option<DbId>) -> bool {
    caller.is_some_and(|c| can_edit(c.role, c.user_id, designer_id))
}
