//! HTTP boundary for the project tracker.
//!
//! The binary (`main.rs`) and the integration tests build the same router
//! through [`router::build_app_router`].

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
