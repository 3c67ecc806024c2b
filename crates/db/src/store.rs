//! Storage traits the service layer depends on.
//!
//! The service never touches SQL: it talks to a [`ProjectStore`] and a
//! [`UserStore`]. [`PgStore`] implements both over the repositories; an
//! in-memory implementation lives in [`crate::memory`] behind the
//! `test-support` feature.

use async_trait::async_trait;
use secplan_core::query::ProjectQuery;
use secplan_core::types::DbId;

use crate::error::StoreError;
use crate::models::lookup::{LookupCatalog, Program, Typology};
use crate::models::project::{CreateProject, ProjectRow, UpdateProject};
use crate::models::user::{CreateUser, User};
use crate::repositories::{LookupRepo, ProjectRepo, UserRepo};
use crate::DbPool;

pub type StoreResult<T> = Result<T, StoreError>;

/// Project persistence and the catalogs projects reference.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Verify the backing store is reachable.
    async fn health_check(&self) -> StoreResult<()>;

    async fn find_typology(&self, id: DbId) -> StoreResult<Option<Typology>>;

    async fn find_program(&self, id: DbId) -> StoreResult<Option<Program>>;

    /// Code of the most recently created project of a typology.
    async fn latest_code_for_typology(&self, typology_id: DbId) -> StoreResult<Option<String>>;

    /// Insert under `unique_code`. A duplicate code surfaces as
    /// [`StoreError::UniqueViolation`], a dangling reference as
    /// [`StoreError::ForeignKeyViolation`].
    async fn insert_project(&self, unique_code: &str, input: &CreateProject) -> StoreResult<DbId>;

    /// Apply a partial update. `Ok(false)` when the id does not exist.
    async fn update_project(&self, id: DbId, input: &UpdateProject) -> StoreResult<bool>;

    async fn find_project(&self, id: DbId) -> StoreResult<Option<ProjectRow>>;

    /// One page of matching projects and the total number of matches.
    async fn list_projects(&self, query: &ProjectQuery) -> StoreResult<(Vec<ProjectRow>, i64)>;

    /// Every catalog; active users only when `include_users` is set.
    async fn lookups(&self, include_users: bool) -> StoreResult<LookupCatalog>;
}

/// User accounts, as needed by login and identity resolution.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>>;

    async fn create_user(&self, input: &CreateUser) -> StoreResult<User>;
}

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(crate::health_check(&self.pool).await?)
    }

    async fn find_typology(&self, id: DbId) -> StoreResult<Option<Typology>> {
        Ok(LookupRepo::find_typology(&self.pool, id).await?)
    }

    async fn find_program(&self, id: DbId) -> StoreResult<Option<Program>> {
        Ok(LookupRepo::find_program(&self.pool, id).await?)
    }

    async fn latest_code_for_typology(&self, typology_id: DbId) -> StoreResult<Option<String>> {
        Ok(ProjectRepo::latest_code_for_typology(&self.pool, typology_id).await?)
    }

    async fn insert_project(&self, unique_code: &str, input: &CreateProject) -> StoreResult<DbId> {
        Ok(ProjectRepo::create(&self.pool, unique_code, input).await?)
    }

    async fn update_project(&self, id: DbId, input: &UpdateProject) -> StoreResult<bool> {
        Ok(ProjectRepo::update(&self.pool, id, input).await?)
    }

    async fn find_project(&self, id: DbId) -> StoreResult<Option<ProjectRow>> {
        Ok(ProjectRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_projects(&self, query: &ProjectQuery) -> StoreResult<(Vec<ProjectRow>, i64)> {
        Ok(ProjectRepo::list(&self.pool, query).await?)
    }

    async fn lookups(&self, include_users: bool) -> StoreResult<LookupCatalog> {
        Ok(LookupRepo::catalog(&self.pool, include_users).await?)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_email(&self.pool, email).await?)
    }

    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn create_user(&self, input: &CreateUser) -> StoreResult<User> {
        Ok(UserRepo::create(&self.pool, input).await?)
    }
}
