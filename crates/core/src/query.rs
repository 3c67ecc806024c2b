//! Project list query: pagination, sorting, search and exact-match filters.
//!
//! [`ProjectListParams`] is the raw, flat query-string shape. It is
//! normalized into a [`ProjectQuery`] whose sort column is always one of a
//! fixed whitelist, so the repository can splice it into SQL directly.

use serde::Deserialize;

use crate::error::{CoreError, FieldError};
use crate::types::DbId;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Raw list parameters as received from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub search: Option<String>,
    pub status_id: Option<DbId>,
    pub typology_id: Option<DbId>,
    pub unit_id: Option<DbId>,
    pub sector_id: Option<DbId>,
    pub financing_line_id: Option<DbId>,
    pub program_id: Option<DbId>,
    pub financing_stage_id: Option<DbId>,
    pub designer_id: Option<DbId>,
    pub formulator_id: Option<DbId>,
    pub year: Option<i32>,
    pub prioritized: Option<bool>,
}

/// Sortable columns. Anything else falls back to [`SortField::UpdatedAt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Name,
    UniqueCode,
    Year,
    LandArea,
    BuildingArea,
    Amount,
}

impl SortField {
    /// Field used when `sort_by` is omitted.
    pub const DEFAULT: SortField = SortField::CreatedAt;

    /// Field used when `sort_by` names something that is not sortable.
    pub const FALLBACK: SortField = SortField::UpdatedAt;

    /// Resolve a client-supplied sort key. Accepts snake_case and camelCase.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::DEFAULT;
        };
        match raw {
            "created_at" | "createdAt" => Self::CreatedAt,
            "updated_at" | "updatedAt" => Self::UpdatedAt,
            "name" => Self::Name,
            "unique_code" | "uniqueCode" | "codeUnique" | "code" => Self::UniqueCode,
            "year" => Self::Year,
            "land_area" | "landArea" => Self::LandArea,
            "building_area" | "buildingArea" => Self::BuildingArea,
            "amount" => Self::Amount,
            _ => Self::FALLBACK,
        }
    }

    /// Column of the `projects` table (aliased `p`) this field sorts by.
    pub fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "p.created_at",
            Self::UpdatedAt => "p.updated_at",
            Self::Name => "p.name",
            Self::UniqueCode => "p.unique_code",
            Self::Year => "p.year",
            Self::LandArea => "p.land_area",
            Self::BuildingArea => "p.building_area",
            Self::Amount => "p.amount",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: Option<&str>) -> Result<Self, CoreError> {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("desc") => Ok(Self::Desc),
            Some("asc") => Ok(Self::Asc),
            Some(other) => Err(CoreError::field(
                "sort_order",
                format!("Invalid sort order '{other}'. Must be 'asc' or 'desc'"),
            )),
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Exact-match filters. Every `Some` becomes an equality constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFilters {
    pub status_id: Option<DbId>,
    pub typology_id: Option<DbId>,
    pub unit_id: Option<DbId>,
    pub sector_id: Option<DbId>,
    pub financing_line_id: Option<DbId>,
    pub program_id: Option<DbId>,
    pub financing_stage_id: Option<DbId>,
    pub designer_id: Option<DbId>,
    pub formulator_id: Option<DbId>,
    pub year: Option<i32>,
    pub prioritized: Option<bool>,
}

impl ProjectFilters {
    /// `(column, value)` pairs for every id-valued filter that is set.
    pub fn id_constraints(&self) -> Vec<(&'static str, DbId)> {
        [
            ("p.status_id", self.status_id),
            ("p.typology_id", self.typology_id),
            ("p.unit_id", self.unit_id),
            ("p.sector_id", self.sector_id),
            ("p.financing_line_id", self.financing_line_id),
            ("p.program_id", self.program_id),
            ("p.financing_stage_id", self.financing_stage_id),
            ("p.designer_id", self.designer_id),
            ("p.formulator_id", self.formulator_id),
        ]
        .into_iter()
        .filter_map(|(col, v)| v.map(|v| (col, v)))
        .collect()
    }
}

/// A validated list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectQuery {
    pub page: i64,
    pub limit: i64,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    /// Trimmed, non-empty free-text search term.
    pub search: Option<String>,
    pub filters: ProjectFilters,
}

impl Default for ProjectQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_by: SortField::DEFAULT,
            sort_order: SortOrder::Desc,
            search: None,
            filters: ProjectFilters::default(),
        }
    }
}

impl ProjectQuery {
    /// Validate and normalize raw parameters.
    ///
    /// `page` and `limit` must be at least 1; `limit` is capped at
    /// [`MAX_LIMIT`]. All problems are reported together.
    pub fn from_params(params: ProjectListParams) -> Result<Self, CoreError> {
        let mut errors = Vec::new();

        let page = params.page.unwrap_or(DEFAULT_PAGE);
        if page < 1 {
            errors.push(FieldError::new("page", "page must be at least 1"));
        }

        let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
        if limit < 1 {
            errors.push(FieldError::new("limit", "limit must be at least 1"));
        }

        let sort_order = match SortOrder::parse(params.sort_order.as_deref()) {
            Ok(order) => order,
            Err(CoreError::InvalidFields(mut fields)) => {
                errors.append(&mut fields);
                SortOrder::Desc
            }
            Err(other) => return Err(other),
        };

        if !errors.is_empty() {
            return Err(CoreError::InvalidFields(errors));
        }

        let search = params
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            page,
            limit: limit.min(MAX_LIMIT),
            sort_by: SortField::parse(params.sort_by.as_deref()),
            sort_order,
            search,
            filters: ProjectFilters {
                status_id: params.status_id,
                typology_id: params.typology_id,
                unit_id: params.unit_id,
                sector_id: params.sector_id,
                financing_line_id: params.financing_line_id,
                program_id: params.program_id,
                financing_stage_id: params.financing_stage_id,
                designer_id: params.designer_id,
                formulator_id: params.formulator_id,
                year: params.year,
                prioritized: params.prioritized,
            },
        })
    }

    /// Rows to skip: `(page - 1) * limit`.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Build an `ILIKE` pattern matching `term` anywhere, with `%`, `_` and `\`
/// in the term matched literally.
///
/// ```
/// use secplan_core::query::like_pattern;
/// assert_eq!(like_pattern("plaza"), "%plaza%");
/// assert_eq!(like_pattern("50%"), "%50\\%%");
/// ```
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
