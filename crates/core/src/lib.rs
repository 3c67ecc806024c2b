//! Domain logic for the municipal project tracker.
//!
//! Everything in this crate is pure: no database, no HTTP. The db, service
//! and api crates build on these types and rules.

pub mod access;
pub mod code;
pub mod error;
pub mod patch;
pub mod projection;
pub mod query;
pub mod roles;
pub mod types;
pub mod validation;
