//! Reference-data rows: statuses, typologies, units, sectors and the
//! funding hierarchy.

use secplan_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

use crate::models::user::UserSummary;

/// A row from `project_statuses`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Status {
    pub id: DbId,
    pub name: String,
}

/// A row from `typologies`. The abbreviation prefixes project codes.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Typology {
    pub id: DbId,
    pub name: String,
    pub abbreviation: String,
    /// Chip colour shown next to the typology, e.g. `#3498DB`.
    pub color: Option<String>,
}

/// A row from `municipal_units`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Unit {
    pub id: DbId,
    pub name: String,
    pub abbreviation: String,
}

/// A row from `sectors`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Sector {
    pub id: DbId,
    pub name: String,
}

/// A row from `financing_lines`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct FinancingLine {
    pub id: DbId,
    pub name: String,
}

/// A row from `programs`. Every program belongs to one financing line.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Program {
    pub id: DbId,
    pub name: String,
    pub financing_line_id: DbId,
}

/// A row from `financing_stages`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct FinancingStage {
    pub id: DbId,
    pub name: String,
}

/// Every catalog, each ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LookupCatalog {
    pub statuses: Vec<Status>,
    pub typologies: Vec<Typology>,
    pub units: Vec<Unit>,
    pub sectors: Vec<Sector>,
    pub financing_lines: Vec<FinancingLine>,
    pub programs: Vec<Program>,
    pub financing_stages: Vec<FinancingStage>,
    /// Active users assignable as designer or formulator. Left empty for
    /// anonymous callers.
    pub users: Vec<UserSummary>,
}
