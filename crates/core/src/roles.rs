//! User roles.
//!
//! Role names must match the `CHECK` constraint on `users.role` in
//! `20261019000002_create_users_table.sql`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_COORDINATOR: &str = "COORDINATOR";
pub const ROLE_USER: &str = "USER";

/// Closed set of roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Coordinator,
    User,
}

impl Role {
    /// Parse from the database / token `role` value.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            ROLE_ADMIN => Ok(Self::Admin),
            ROLE_COORDINATOR => Ok(Self::Coordinator),
            ROLE_USER => Ok(Self::User),
            other => Err(CoreError::Validation(format!("Unknown role '{other}'"))),
        }
    }

    /// Database name value.
    pub fn name(self) -> &'static str {
        match self {
            Self::Admin => ROLE_ADMIN,
            Self::Coordinator => ROLE_COORDINATOR,
            Self::User => ROLE_USER,
        }
    }

    /// Admins and coordinators bypass ownership checks.
    pub fn is_privileged(self) -> bool {
        matches!(self, Self::Admin | Self::Coordinator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
