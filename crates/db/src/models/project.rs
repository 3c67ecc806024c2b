//! Project entity model, DTOs and projected views.

use chrono::NaiveDate;
use secplan_core::error::{CoreError, FieldError};
use secplan_core::patch::Patch;
use secplan_core::projection::Projection;
use secplan_core::types::{DbId, Timestamp};
use secplan_core::validation::{
    check_name, check_positive, check_positive_id, check_year, FieldErrors,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

/// Currency of the requested and awarded amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "currency", rename_all = "UPPERCASE")]
pub enum Currency {
    /// Chilean peso.
    #[default]
    Clp,
    /// Unidad de Fomento.
    Uf,
}

/// A project row from `projects`, joined with the names of everything it
/// references. This is the only shape the storage layer returns; callers
/// project it into a [`ProjectView`].
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ProjectRow {
    pub id: DbId,
    pub unique_code: String,
    pub name: String,
    pub description: Option<String>,
    pub typology_id: DbId,
    pub status_id: Option<DbId>,
    pub unit_id: Option<DbId>,
    pub sector_id: Option<DbId>,
    pub address: Option<String>,
    pub land_area: Option<f64>,
    pub building_area: Option<f64>,
    pub year: Option<i32>,
    pub prioritized: bool,
    pub designer_id: Option<DbId>,
    pub formulator_id: Option<DbId>,
    pub financing_line_id: Option<DbId>,
    pub program_id: Option<DbId>,
    pub financing_stage_id: Option<DbId>,
    pub file_code: Option<String>,
    pub application_date: Option<NaiveDate>,
    pub amount: Option<f64>,
    pub currency: Currency,
    pub awarded_amount: Option<f64>,
    pub tender_code: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,

    // --- joined ---
    pub typology_name: String,
    pub typology_abbreviation: String,
    pub typology_color: Option<String>,
    pub status_name: Option<String>,
    pub unit_name: Option<String>,
    pub unit_abbreviation: Option<String>,
    pub sector_name: Option<String>,
    pub designer_name: Option<String>,
    pub designer_email: Option<String>,
    pub formulator_name: Option<String>,
    pub formulator_email: Option<String>,
    pub financing_line_name: Option<String>,
    pub program_name: Option<String>,
    pub financing_stage_name: Option<String>,
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

// The derive below runs the same checks as `UpdateProject::validate_fields`.

fn rule(result: Result<(), String>) -> Result<(), ValidationError> {
    result.map_err(|message| ValidationError::new("invalid").with_message(message.into()))
}

fn valid_name(name: &str) -> Result<(), ValidationError> {
    rule(check_name(name))
}

fn valid_id(id: &DbId) -> Result<(), ValidationError> {
    rule(check_positive_id(*id))
}

fn valid_positive(value: f64) -> Result<(), ValidationError> {
    rule(check_positive(value))
}

fn valid_year(year: i32) -> Result<(), ValidationError> {
    rule(check_year(year))
}

/// DTO for creating a new project. The code, id and timestamps are assigned
/// by the server.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateProject {
    #[validate(custom(function = "valid_name"))]
    pub name: String,
    #[validate(custom(function = "valid_id"))]
    pub typology_id: DbId,
    #[validate(custom(function = "valid_id"))]
    pub status_id: Option<DbId>,
    pub description: Option<String>,
    #[validate(custom(function = "valid_id"))]
    pub unit_id: Option<DbId>,
    pub address: Option<String>,
    #[validate(custom(function = "valid_positive"))]
    pub land_area: Option<f64>,
    #[validate(custom(function = "valid_positive"))]
    pub building_area: Option<f64>,
    #[validate(custom(function = "valid_id"))]
    pub sector_id: Option<DbId>,
    #[validate(custom(function = "valid_year"))]
    pub year: Option<i32>,
    /// Defaults to `false` if omitted.
    #[serde(default)]
    pub prioritized: bool,
    #[validate(custom(function = "valid_id"))]
    pub designer_id: Option<DbId>,
    #[validate(custom(function = "valid_id"))]
    pub formulator_id: Option<DbId>,
    #[validate(custom(function = "valid_id"))]
    pub financing_line_id: Option<DbId>,
    #[validate(custom(function = "valid_id"))]
    pub program_id: Option<DbId>,
    #[validate(custom(function = "valid_id"))]
    pub financing_stage_id: Option<DbId>,
    pub file_code: Option<String>,
    pub application_date: Option<NaiveDate>,
    #[validate(custom(function = "valid_positive"))]
    pub amount: Option<f64>,
    /// Defaults to CLP if omitted.
    #[serde(default)]
    pub currency: Currency,
    #[validate(custom(function = "valid_positive"))]
    pub awarded_amount: Option<f64>,
    pub tender_code: Option<String>,
}

impl CreateProject {
    /// Run the field rules, reporting every failing field.
    pub fn validate_fields(&self) -> Result<(), CoreError> {
        match self.validate() {
            Ok(()) => Ok(()),
            Err(errors) => {
                let mut fields: Vec<FieldError> = errors
                    .field_errors()
                    .into_iter()
                    .flat_map(|(field, errs)| {
                        let field = field.to_string();
                        errs.iter().map(move |e| {
                            let message = e
                                .message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string());
                            FieldError::new(field.clone(), message)
                        })
                    })
                    .collect();
                fields.sort_by(|a, b| a.field.cmp(&b.field));
                Err(CoreError::InvalidFields(fields))
            }
        }
    }

    /// Trim free-text fields and turn blank strings into `None`.
    pub fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        for field in [
            &mut self.description,
            &mut self.address,
            &mut self.file_code,
            &mut self.tender_code,
        ] {
            *field = field
                .take()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
        }
    }
}

/// DTO for a partial update.
///
/// Omitted keys leave the column untouched, explicit `null` clears it. The
/// typology and the unique code are not part of this DTO, so they cannot be
/// changed through it; unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub status_id: Patch<DbId>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub unit_id: Patch<DbId>,
    #[serde(default)]
    pub address: Patch<String>,
    #[serde(default)]
    pub land_area: Patch<f64>,
    #[serde(default)]
    pub building_area: Patch<f64>,
    #[serde(default)]
    pub sector_id: Patch<DbId>,
    #[serde(default)]
    pub year: Patch<i32>,
    #[serde(default)]
    pub prioritized: Patch<bool>,
    #[serde(default)]
    pub designer_id: Patch<DbId>,
    #[serde(default)]
    pub formulator_id: Patch<DbId>,
    #[serde(default)]
    pub financing_line_id: Patch<DbId>,
    #[serde(default)]
    pub program_id: Patch<DbId>,
    #[serde(default)]
    pub financing_stage_id: Patch<DbId>,
    #[serde(default)]
    pub file_code: Patch<String>,
    #[serde(default)]
    pub application_date: Patch<NaiveDate>,
    #[serde(default)]
    pub amount: Patch<f64>,
    #[serde(default)]
    pub currency: Patch<Currency>,
    #[serde(default)]
    pub awarded_amount: Patch<f64>,
    #[serde(default)]
    pub tender_code: Patch<String>,
}

impl UpdateProject {
    /// True when no field is present at all.
    pub fn is_empty(&self) -> bool {
        !(self.name.is_set()
            || self.status_id.is_set()
            || self.description.is_set()
            || self.unit_id.is_set()
            || self.address.is_set()
            || self.land_area.is_set()
            || self.building_area.is_set()
            || self.sector_id.is_set()
            || self.year.is_set()
            || self.prioritized.is_set()
            || self.designer_id.is_set()
            || self.formulator_id.is_set()
            || self.financing_line_id.is_set()
            || self.program_id.is_set()
            || self.financing_stage_id.is_set()
            || self.file_code.is_set()
            || self.application_date.is_set()
            || self.amount.is_set()
            || self.currency.is_set()
            || self.awarded_amount.is_set()
            || self.tender_code.is_set())
    }

    /// Run the same field rules as [`CreateProject`] on the present values.
    /// Required columns (`name`, `prioritized`, `currency`) reject `null`.
    pub fn validate_fields(&self) -> Result<(), CoreError> {
        let mut errors = FieldErrors::new();

        match &self.name {
            Patch::Null => errors.push("name", "name cannot be null"),
            Patch::Value(name) => errors.check("name", check_name(name)),
            Patch::Unset => {}
        }
        if matches!(self.prioritized, Patch::Null) {
            errors.push("prioritized", "prioritized cannot be null");
        }
        if matches!(self.currency, Patch::Null) {
            errors.push("currency", "currency cannot be null");
        }
        if let Some(year) = self.year.value() {
            errors.check("year", check_year(*year));
        }
        for (field, value) in [
            ("land_area", &self.land_area),
            ("building_area", &self.building_area),
            ("amount", &self.amount),
            ("awarded_amount", &self.awarded_amount),
        ] {
            if let Some(v) = value.value() {
                errors.check(field, check_positive(*v));
            }
        }
        for (field, value) in self.id_fields() {
            if let Some(id) = value.value() {
                errors.check(field, check_positive_id(*id));
            }
        }

        errors.into_result()
    }

    /// Trim free-text fields; blank strings become `null`.
    pub fn normalize(&mut self) {
        if let Patch::Value(name) = &mut self.name {
            *name = name.trim().to_string();
        }
        for field in [
            &mut self.description,
            &mut self.address,
            &mut self.file_code,
            &mut self.tender_code,
        ] {
            if let Patch::Value(s) = field {
                let trimmed = s.trim();
                *field = if trimmed.is_empty() {
                    Patch::Null
                } else {
                    Patch::Value(trimmed.to_string())
                };
            }
        }
    }

    /// The foreign-key fields with their column names.
    pub fn id_fields(&self) -> [(&'static str, &Patch<DbId>); 8] {
        [
            ("status_id", &self.status_id),
            ("unit_id", &self.unit_id),
            ("sector_id", &self.sector_id),
            ("designer_id", &self.designer_id),
            ("formulator_id", &self.formulator_id),
            ("financing_line_id", &self.financing_line_id),
            ("program_id", &self.program_id),
            ("financing_stage_id", &self.financing_stage_id),
        ]
    }
}

// ---------------------------------------------------------------------------
// Projected views
// ---------------------------------------------------------------------------

/// `{ name }` reference to a lookup row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameRef {
    pub name: String,
}

/// `{ id, name }` reference to a lookup row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdNameRef {
    pub id: DbId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitRef {
    pub name: String,
    pub abbreviation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypologyRef {
    pub name: String,
    pub abbreviation: String,
    pub color: Option<String>,
}

/// Team member reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRef {
    pub id: DbId,
    pub name: String,
    pub email: String,
}

/// Fields anyone may see.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicProject {
    pub id: DbId,
    pub unique_code: String,
    pub name: String,
    pub status: Option<NameRef>,
    pub unit: Option<UnitRef>,
    pub typology: TypologyRef,
    pub address: Option<String>,
    pub land_area: Option<f64>,
    pub building_area: Option<f64>,
    pub sector: Option<NameRef>,
    pub year: Option<i32>,
    pub prioritized: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields any authenticated caller may see: the public set plus
/// description, team, funding and every foreign-key id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InternalProject {
    #[serde(flatten)]
    pub public: PublicProject,
    pub description: Option<String>,
    pub designer: Option<UserRef>,
    pub formulator: Option<UserRef>,
    pub financing_line: Option<IdNameRef>,
    pub program: Option<IdNameRef>,
    pub financing_stage: Option<IdNameRef>,
    pub amount: Option<f64>,
    pub currency: Currency,
    pub file_code: Option<String>,
    pub application_date: Option<NaiveDate>,
    pub awarded_amount: Option<f64>,
    pub tender_code: Option<String>,
    pub status_id: Option<DbId>,
    pub unit_id: Option<DbId>,
    pub typology_id: DbId,
    pub sector_id: Option<DbId>,
    pub designer_id: Option<DbId>,
    pub formulator_id: Option<DbId>,
    pub financing_line_id: Option<DbId>,
    pub program_id: Option<DbId>,
    pub financing_stage_id: Option<DbId>,
}

/// A project as returned to a caller, shaped by their [`Projection`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProjectView {
    Public(PublicProject),
    Internal(InternalProject),
}

impl ProjectView {
    pub fn from_row(row: ProjectRow, projection: Projection) -> Self {
        match projection {
            Projection::Public => ProjectView::Public(PublicProject::from(row)),
            Projection::Internal => ProjectView::Internal(InternalProject::from(row)),
        }
    }

    fn public(&self) -> &PublicProject {
        match self {
            ProjectView::Public(p) => p,
            ProjectView::Internal(p) => &p.public,
        }
    }

    pub fn id(&self) -> DbId {
        self.public().id
    }

    pub fn unique_code(&self) -> &str {
        &self.public().unique_code
    }
}

fn user_ref(id: Option<DbId>, name: Option<String>, email: Option<String>) -> Option<UserRef> {
    match (id, name, email) {
        (Some(id), Some(name), Some(email)) => Some(UserRef { id, name, email }),
        _ => None,
    }
}

fn id_name_ref(id: Option<DbId>, name: Option<String>) -> Option<IdNameRef> {
    match (id, name) {
        (Some(id), Some(name)) => Some(IdNameRef { id, name }),
        _ => None,
    }
}

impl From<ProjectRow> for PublicProject {
    fn from(row: ProjectRow) -> Self {
        PublicProject {
            id: row.id,
            unique_code: row.unique_code,
            name: row.name,
            status: row.status_name.map(|name| NameRef { name }),
            unit: row.unit_name.map(|name| UnitRef {
                name,
                abbreviation: row.unit_abbreviation,
            }),
            typology: TypologyRef {
                name: row.typology_name,
                abbreviation: row.typology_abbreviation,
                color: row.typology_color,
            },
            address: row.address,
            land_area: row.land_area,
            building_area: row.building_area,
            sector: row.sector_name.map(|name| NameRef { name }),
            year: row.year,
            prioritized: row.prioritized,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<ProjectRow> for InternalProject {
    fn from(row: ProjectRow) -> Self {
        let designer = user_ref(
            row.designer_id,
            row.designer_name.clone(),
            row.designer_email.clone(),
        );
        let formulator = user_ref(
            row.formulator_id,
            row.formulator_name.clone(),
            row.formulator_email.clone(),
        );
        let financing_line = id_name_ref(row.financing_line_id, row.financing_line_name.clone());
        let program = id_name_ref(row.program_id, row.program_name.clone());
        let financing_stage =
            id_name_ref(row.financing_stage_id, row.financing_stage_name.clone());

        InternalProject {
            description: row.description.clone(),
            designer,
            formulator,
            financing_line,
            program,
            financing_stage,
            amount: row.amount,
            currency: row.currency,
            file_code: row.file_code.clone(),
            application_date: row.application_date,
            awarded_amount: row.awarded_amount,
            tender_code: row.tender_code.clone(),
            status_id: row.status_id,
            unit_id: row.unit_id,
            typology_id: row.typology_id,
            sector_id: row.sector_id,
            designer_id: row.designer_id,
            formulator_id: row.formulator_id,
            financing_line_id: row.financing_line_id,
            program_id: row.program_id,
            financing_stage_id: row.financing_stage_id,
            public: PublicProject::from(row),
        }
    }
}

/// One page of a project listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectPage {
    pub items: Vec<ProjectView>,
    /// Rows matching the filters, ignoring pagination.
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use secplan_core::projection::{INTERNAL_ONLY_FIELDS, PUBLIC_FIELDS};

    use super::*;

    fn sample_row() -> ProjectRow {
        let now = Utc::now();
        ProjectRow {
            id: 7,
            unique_code: "EQ-001".into(),
            name: "Centro Comunitario".into(),
            description: Some("Edificio de 2 pisos".into()),
            typology_id: 2,
            status_id: Some(3),
            unit_id: Some(1),
            sector_id: Some(3),
            address: Some("Calle Tanto #123".into()),
            land_area: Some(800.0),
            building_area: Some(650.0),
            year: Some(2023),
            prioritized: false,
            designer_id: Some(1),
            formulator_id: None,
            financing_line_id: Some(3),
            program_id: Some(3),
            financing_stage_id: Some(2),
            file_code: Some("EXP-1".into()),
            application_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            amount: Some(550_000_000.0),
            currency: Currency::Clp,
            awarded_amount: None,
            tender_code: None,
            created_at: now,
            updated_at: now,
            typology_name: "EQUIPAMIENTO".into(),
            typology_abbreviation: "EQ".into(),
            typology_color: Some("#3498DB".into()),
            status_name: Some("EJECUCIÓN".into()),
            unit_name: Some("ARQUITECTURA".into()),
            unit_abbreviation: Some("ARQ".into()),
            sector_name: Some("Lorenzo Arenas".into()),
            designer_name: Some("Admin".into()),
            designer_email: Some("admin@example.cl".into()),
            formulator_name: None,
            formulator_email: None,
            financing_line_name: Some("GORE".into()),
            program_name: Some("FNDR".into()),
            financing_stage_name: Some("POSTULACIÓN".into()),
        }
    }

    fn keys(view: &ProjectView) -> Vec<String> {
        let json = serde_json::to_value(view).unwrap();
        let mut keys: Vec<String> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    #[test]
    fn public_view_serializes_exactly_the_public_fields() {
        let view = ProjectView::from_row(sample_row(), Projection::Public);
        let mut expected: Vec<String> = PUBLIC_FIELDS.iter().map(|s| s.to_string()).collect();
        expected.sort();
        assert_eq!(keys(&view), expected);
    }

    #[test]
    fn internal_view_serializes_public_plus_internal_fields() {
        let view = ProjectView::from_row(sample_row(), Projection::Internal);
        let mut expected: Vec<String> = PUBLIC_FIELDS
            .iter()
            .chain(INTERNAL_ONLY_FIELDS)
            .map(|s| s.to_string())
            .collect();
        expected.sort();
        assert_eq!(keys(&view), expected);
    }

    #[test]
    fn nested_refs_are_built_from_joined_columns() {
        let view = ProjectView::from_row(sample_row(), Projection::Internal);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["typology"]["abbreviation"], "EQ");
        assert_eq!(json["unit"]["abbreviation"], "ARQ");
        assert_eq!(json["designer"]["email"], "admin@example.cl");
        assert!(json["formulator"].is_null());
        assert_eq!(json["program"]["name"], "FNDR");
        assert_eq!(json["currency"], "CLP");
        assert_eq!(json["application_date"], "2024-03-01");
    }

    #[test]
    fn update_with_no_keys_is_empty() {
        let patch: UpdateProject = serde_json::from_str("{}").unwrap();
        assert!(patch.is_empty());

        let patch: UpdateProject =
            serde_json::from_str(r#"{"typology_id": 3, "unique_code": "X-001"}"#).unwrap();
        assert!(patch.is_empty(), "immutable keys are ignored");

        let patch: UpdateProject = serde_json::from_str(r#"{"sector_id": null}"#).unwrap();
        assert!(!patch.is_empty());
    }

    #[test]
    fn update_rejects_null_for_required_columns() {
        let patch: UpdateProject =
            serde_json::from_str(r#"{"name": null, "prioritized": null, "year": 1800}"#).unwrap();
        assert_matches!(patch.validate_fields(), Err(CoreError::InvalidFields(fields)) => {
            let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
            assert_eq!(names, ["name", "prioritized", "year"]);
        });
    }

    #[test]
    fn update_normalize_turns_blank_text_into_null() {
        let mut patch: UpdateProject =
            serde_json::from_str(r#"{"description": "   ", "address": " Av. Uno "}"#).unwrap();
        patch.normalize();
        assert_eq!(patch.description, Patch::Null);
        assert_eq!(patch.address, Patch::Value("Av. Uno".to_string()));
    }

    #[test]
    fn create_defaults_and_validation() {
        let input: CreateProject =
            serde_json::from_str(r#"{"name": "Plaza Perú", "typology_id": 3}"#).unwrap();
        assert!(!input.prioritized);
        assert_eq!(input.currency, Currency::Clp);
        assert!(input.validate_fields().is_ok());

        let input: CreateProject = serde_json::from_str(
            r#"{"name": "Pl", "typology_id": 3, "land_area": 0, "year": 2200}"#,
        )
        .unwrap();
        assert_matches!(input.validate_fields(), Err(CoreError::InvalidFields(fields)) => {
            let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
            assert_eq!(names, ["land_area", "name", "year"]);
        });
    }

    #[test]
    fn create_and_update_report_the_same_messages() {
        let raw = r#"{"name": " ab ", "typology_id": 3, "amount": -5, "year": 1899, "unit_id": 0}"#;
        let create: CreateProject = serde_json::from_str(raw).unwrap();
        let update: UpdateProject = serde_json::from_str(raw).unwrap();

        let (Err(CoreError::InvalidFields(created)), Err(CoreError::InvalidFields(updated))) =
            (create.validate_fields(), update.validate_fields())
        else {
            panic!("both payloads should fail");
        };
        let by_field = |fields: Vec<FieldError>| {
            let mut pairs: Vec<_> = fields.into_iter().map(|f| (f.field, f.message)).collect();
            pairs.sort();
            pairs
        };
        let created = by_field(created);
        assert_eq!(created, by_field(updated));
        assert_eq!(created.len(), 4);
        assert!(created.contains(&("name".to_string(), check_name("ab").unwrap_err())));
    }
}
