//! Repository layer: one zero-sized struct per aggregate, each taking a
//! [`sqlx::PgPool`] (or a transaction) explicitly.

pub mod lookup_repo;
pub mod project_repo;
pub mod user_repo;

pub use lookup_repo::LookupRepo;
pub use project_repo::ProjectRepo;
pub use user_repo::UserRepo;
