//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - `FromRow` + `Serialize` structs matching database rows
//! - `Deserialize` DTOs for inserts and patches
//! - for projects, the projected views returned to callers

pub mod lookup;
pub mod project;
pub mod user;
