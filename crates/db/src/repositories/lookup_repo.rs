//! Repository for the reference-data catalogs.

use secplan_core::types::DbId;
use sqlx::PgPool;

use crate::models::lookup::{
    FinancingLine, FinancingStage, LookupCatalog, Program, Sector, Status, Typology, Unit,
};
use crate::repositories::UserRepo;

/// Read-only access to the lookup tables.
pub struct LookupRepo;

impl LookupRepo {
    pub async fn statuses(pool: &PgPool) -> Result<Vec<Status>, sqlx::Error> {
        sqlx::query_as::<_, Status>("SELECT id, name FROM project_statuses ORDER BY name, id")
            .fetch_all(pool)
            .await
    }

    pub async fn typologies(pool: &PgPool) -> Result<Vec<Typology>, sqlx::Error> {
        sqlx::query_as::<_, Typology>(
            "SELECT id, name, abbreviation, color FROM typologies ORDER BY name, id",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn units(pool: &PgPool) -> Result<Vec<Unit>, sqlx::Error> {
        sqlx::query_as::<_, Unit>(
            "SELECT id, name, abbreviation FROM municipal_units ORDER BY name, id",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn sectors(pool: &PgPool) -> Result<Vec<Sector>, sqlx::Error> {
        sqlx::query_as::<_, Sector>("SELECT id, name FROM sectors ORDER BY name, id")
            .fetch_all(pool)
            .await
    }

    pub async fn financing_lines(pool: &PgPool) -> Result<Vec<FinancingLine>, sqlx::Error> {
        sqlx::query_as::<_, FinancingLine>("SELECT id, name FROM financing_lines ORDER BY name, id")
            .fetch_all(pool)
            .await
    }

    pub async fn programs(pool: &PgPool) -> Result<Vec<Program>, sqlx::Error> {
        sqlx::query_as::<_, Program>(
            "SELECT id, name, financing_line_id FROM programs ORDER BY name, id",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn financing_stages(pool: &PgPool) -> Result<Vec<FinancingStage>, sqlx::Error> {
        sqlx::query_as::<_, FinancingStage>(
            "SELECT id, name FROM financing_stages ORDER BY name, id",
        )
        .fetch_all(pool)
        .await
    }

    /// Load every catalog concurrently. Users are only fetched when
    /// `include_users` is set.
    pub async fn catalog(pool: &PgPool, include_users: bool) -> Result<LookupCatalog, sqlx::Error> {
        let users = async {
            if include_users {
                UserRepo::list_active_summaries(pool).await
            } else {
                Ok(Vec::new())
            }
        };

        let (statuses, typologies, units, sectors, financing_lines, programs, financing_stages, users) =
            tokio::try_join!(
                Self::statuses(pool),
                Self::typologies(pool),
                Self::units(pool),
                Self::sectors(pool),
                Self::financing_lines(pool),
                Self::programs(pool),
                Self::financing_stages(pool),
                users,
            )?;

        Ok(LookupCatalog {
            statuses,
            typologies,
            units,
            sectors,
            financing_lines,
            programs,
            financing_stages,
            users,
        })
    }

    pub async fn find_typology(pool: &PgPool, id: DbId) -> Result<Option<Typology>, sqlx::Error> {
        sqlx::query_as::<_, Typology>(
            "SELECT id, name, abbreviation, color FROM typologies WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_program(pool: &PgPool, id: DbId) -> Result<Option<Program>, sqlx::Error> {
        sqlx::query_as::<_, Program>(
            "SELECT id, name, financing_line_id FROM programs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
