pub mod auth;
pub mod lookup;
pub mod project;
