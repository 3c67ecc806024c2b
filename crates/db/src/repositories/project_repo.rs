//! Repository for the `projects` table.
//!
//! Reads always join the lookup tables so a single [`ProjectRow`] carries
//! everything either projection needs.

use chrono::NaiveDate;
use secplan_core::patch::Patch;
use secplan_core::query::{like_pattern, ProjectQuery};
use secplan_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::project::{CreateProject, Currency, ProjectRow, UpdateProject};

/// Joined column list for `projects` reads (alias `p`).
const COLUMNS: &str = "\
    p.id, p.unique_code, p.name, p.description, p.typology_id, p.status_id, \
    p.unit_id, p.sector_id, p.address, p.land_area, p.building_area, p.year, \
    p.prioritized, p.designer_id, p.formulator_id, p.financing_line_id, \
    p.program_id, p.financing_stage_id, p.file_code, p.application_date, \
    p.amount, p.currency, p.awarded_amount, p.tender_code, \
    p.created_at, p.updated_at, \
    t.name AS typology_name, t.abbreviation AS typology_abbreviation, \
    t.color AS typology_color, \
    s.name AS status_name, \
    u.name AS unit_name, u.abbreviation AS unit_abbreviation, \
    sec.name AS sector_name, \
    d.name AS designer_name, d.email AS designer_email, \
    f.name AS formulator_name, f.email AS formulator_email, \
    fl.name AS financing_line_name, \
    pr.name AS program_name, \
    fs.name AS financing_stage_name";

const FROM_JOINED: &str = "\
    FROM projects p \
    JOIN typologies t ON t.id = p.typology_id \
    LEFT JOIN project_statuses s ON s.id = p.status_id \
    LEFT JOIN municipal_units u ON u.id = p.unit_id \
    LEFT JOIN sectors sec ON sec.id = p.sector_id \
    LEFT JOIN users d ON d.id = p.designer_id \
    LEFT JOIN users f ON f.id = p.formulator_id \
    LEFT JOIN financing_lines fl ON fl.id = p.financing_line_id \
    LEFT JOIN programs pr ON pr.id = p.program_id \
    LEFT JOIN financing_stages fs ON fs.id = p.financing_stage_id";

/// Free-text search covers these columns.
const SEARCH_COLUMNS: [&str; 4] = ["p.name", "p.unique_code", "p.description", "p.address"];

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a project under an already generated code. Returns the new id.
    pub async fn create(
        pool: &PgPool,
        unique_code: &str,
        input: &CreateProject,
    ) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO projects (\
                unique_code, name, description, typology_id, status_id, unit_id, \
                sector_id, address, land_area, building_area, year, prioritized, \
                designer_id, formulator_id, financing_line_id, program_id, \
                financing_stage_id, file_code, application_date, amount, currency, \
                awarded_amount, tender_code\
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, \
                       $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23) \
             RETURNING id",
        )
        .bind(unique_code)
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(input.typology_id)
        .bind(input.status_id)
        .bind(input.unit_id)
        .bind(input.sector_id)
        .bind(input.address.as_deref())
        .bind(input.land_area)
        .bind(input.building_area)
        .bind(input.year)
        .bind(input.prioritized)
        .bind(input.designer_id)
        .bind(input.formulator_id)
        .bind(input.financing_line_id)
        .bind(input.program_id)
        .bind(input.financing_stage_id)
        .bind(input.file_code.as_deref())
        .bind(input.application_date)
        .bind(input.amount)
        .bind(input.currency)
        .bind(input.awarded_amount)
        .bind(input.tender_code.as_deref())
        .fetch_one(pool)
        .await?;
        Ok(id)
    }

    /// Find a project by id, joined with its lookups.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ProjectRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} {FROM_JOINED} WHERE p.id = $1");
        sqlx::query_as::<_, ProjectRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// One page of projects plus the total number of matches.
    ///
    /// Both queries run in a single `REPEATABLE READ` transaction so the
    /// total and the page come from the same snapshot.
    pub async fn list(
        pool: &PgPool,
        query: &ProjectQuery,
    ) -> Result<(Vec<ProjectRow>, i64), sqlx::Error> {
        let (where_clause, bind_values, bind_idx) = build_project_filter(query);

        let mut tx = pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let count_query = format!("SELECT COUNT(*) FROM projects p {where_clause}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_query);
        for val in &bind_values {
            count_q = match val {
                BindValue::BigInt(v) => count_q.bind(*v),
                BindValue::Int(v) => count_q.bind(*v),
                BindValue::Bool(v) => count_q.bind(*v),
                BindValue::Text(v) => count_q.bind(v.clone()),
            };
        }
        let total = count_q.fetch_one(&mut *tx).await?;

        let dir = query.sort_order.sql();
        let page_query = format!(
            "SELECT {COLUMNS} {FROM_JOINED} {where_clause} \
             ORDER BY {sort} {dir} NULLS LAST, p.id {dir} \
             LIMIT ${bind_idx} OFFSET ${next_idx}",
            sort = query.sort_by.column(),
            next_idx = bind_idx + 1,
        );
        let mut page_q = sqlx::query_as::<_, ProjectRow>(&page_query);
        for val in &bind_values {
            page_q = match val {
                BindValue::BigInt(v) => page_q.bind(*v),
                BindValue::Int(v) => page_q.bind(*v),
                BindValue::Bool(v) => page_q.bind(*v),
                BindValue::Text(v) => page_q.bind(v.clone()),
            };
        }
        let rows = page_q
            .bind(query.limit)
            .bind(query.offset())
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((rows, total))
    }

    /// Apply a partial update. Returns `false` if no row has the given id.
    ///
    /// Only keys present in `input` are written; `updated_at` is bumped by
    /// the table trigger.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<bool, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::update_inner(&mut conn, id, input).await
    }

    async fn update_inner(
        conn: &mut PgConnection,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<bool, sqlx::Error> {
        let mut sets: Vec<String> = Vec::new();
        let mut bind_idx = 2u32;
        let mut bind_values: Vec<SetValue> = Vec::new();

        let mut push = |column: &str, value: Option<SetValue>| match value {
            Some(v) => {
                sets.push(format!("{column} = ${bind_idx}"));
                bind_idx += 1;
                bind_values.push(v);
            }
            None => sets.push(format!("{column} = NULL")),
        };

        macro_rules! patch_field {
            ($field:ident, $variant:ident) => {
                match &input.$field {
                    Patch::Unset => {}
                    Patch::Null => push(stringify!($field), None),
                    Patch::Value(v) => push(stringify!($field), Some(SetValue::$variant(v.clone()))),
                }
            };
        }

        patch_field!(name, Text);
        patch_field!(description, Text);
        patch_field!(status_id, BigInt);
        patch_field!(unit_id, BigInt);
        patch_field!(sector_id, BigInt);
        patch_field!(address, Text);
        patch_field!(land_area, Float);
        patch_field!(building_area, Float);
        patch_field!(year, Int);
        patch_field!(prioritized, Bool);
        patch_field!(designer_id, BigInt);
        patch_field!(formulator_id, BigInt);
        patch_field!(financing_line_id, BigInt);
        patch_field!(program_id, BigInt);
        patch_field!(financing_stage_id, BigInt);
        patch_field!(file_code, Text);
        patch_field!(application_date, Date);
        patch_field!(amount, Float);
        patch_field!(currency, Currency);
        patch_field!(awarded_amount, Float);
        patch_field!(tender_code, Text);

        if sets.is_empty() {
            let exists: Option<DbId> = sqlx::query_scalar("SELECT id FROM projects WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;
            return Ok(exists.is_some());
        }

        let query = format!("UPDATE projects SET {} WHERE id = $1", sets.join(", "));
        let mut q = sqlx::query(&query).bind(id);
        for val in bind_values {
            q = match val {
                SetValue::BigInt(v) => q.bind(v),
                SetValue::Int(v) => q.bind(v),
                SetValue::Bool(v) => q.bind(v),
                SetValue::Float(v) => q.bind(v),
                SetValue::Text(v) => q.bind(v),
                SetValue::Date(v) => q.bind(v),
                SetValue::Currency(v) => q.bind(v),
            };
        }
        let result = q.execute(&mut *conn).await?;
        Ok(result.rows_affected() > 0)
    }

    /// The most recently created code for a typology, if it has any projects.
    ///
    /// "Most recent" is by `created_at`, with `id` breaking ties.
    pub async fn latest_code_for_typology(
        pool: &PgPool,
        typology_id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT unique_code FROM projects \
             WHERE typology_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT 1",
        )
        .bind(typology_id)
        .fetch_optional(pool)
        .await
    }
}

// ---------------------------------------------------------------------------
// Internal helpers for dynamic query building
// ---------------------------------------------------------------------------

/// Typed bind value for dynamically-built list filters.
enum BindValue {
    BigInt(i64),
    Int(i32),
    Bool(bool),
    Text(String),
}

/// Typed bind value for dynamically-built `SET` lists.
enum SetValue {
    BigInt(i64),
    Int(i32),
    Bool(bool),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Currency(Currency),
}

/// Build a WHERE clause and bind values from a [`ProjectQuery`].
///
/// Returns `(where_clause, bind_values, next_bind_index)`. The clause is
/// empty if nothing constrains the list, or starts with `WHERE `.
fn build_project_filter(query: &ProjectQuery) -> (String, Vec<BindValue>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;
    let mut bind_values: Vec<BindValue> = Vec::new();

    if let Some(ref term) = query.search {
        let ors: Vec<String> = SEARCH_COLUMNS
            .iter()
            .map(|col| format!("{col} ILIKE ${bind_idx} ESCAPE '\\'"))
            .collect();
        conditions.push(format!("({})", ors.join(" OR ")));
        bind_idx += 1;
        bind_values.push(BindValue::Text(like_pattern(term)));
    }

    for (column, value) in query.filters.id_constraints() {
        conditions.push(format!("{column} = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::BigInt(value));
    }

    if let Some(year) = query.filters.year {
        conditions.push(format!("p.year = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Int(year));
    }

    if let Some(prioritized) = query.filters.prioritized {
        conditions.push(format!("p.prioritized = ${bind_idx}"));
        bind_idx += 1;
        bind_values.push(BindValue::Bool(prioritized));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, bind_values, bind_idx)
}
