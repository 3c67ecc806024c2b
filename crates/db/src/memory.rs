//! In-memory [`ProjectStore`] and [`UserStore`] for tests.
//!
//! Mirrors the relational rules of the PostgreSQL schema that callers can
//! observe: the unique-code constraint, foreign keys, column defaults,
//! `updated_at` bumping and the list ordering (nulls last, `id` tiebreak).
//! Seeded with the same reference data as the lookup-table migration.

use std::cmp::Ordering;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use secplan_core::patch::Patch;
use secplan_core::query::{ProjectQuery, SortField, SortOrder};
use secplan_core::roles::Role;
use secplan_core::types::{DbId, Timestamp};

use crate::error::{StoreError, PROJECT_CODE_CONSTRAINT};
use crate::models::lookup::{
    FinancingLine, FinancingStage, LookupCatalog, Program, Sector, Status, Typology, Unit,
};
use crate::models::project::{CreateProject, ProjectRow, UpdateProject};
use crate::models::user::{CreateUser, User, UserSummary};
use crate::store::{ProjectStore, StoreResult, UserStore};

#[derive(Debug, Default)]
struct State {
    catalog: LookupCatalog,
    users: Vec<User>,
    projects: Vec<ProjectRow>,
    next_project_id: DbId,
    next_user_id: DbId,
    last_timestamp: Option<Timestamp>,
}

impl State {
    /// A strictly increasing clock, like distinct transactions' `NOW()`.
    fn now(&mut self) -> Timestamp {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }

    fn check_fk(&self, column: &str, id: Option<DbId>) -> StoreResult<()> {
        let Some(id) = id else { return Ok(()) };
        let c = &self.catalog;
        let exists = match column {
            "typology_id" => c.typologies.iter().any(|r| r.id == id),
            "status_id" => c.statuses.iter().any(|r| r.id == id),
            "unit_id" => c.units.iter().any(|r| r.id == id),
            "sector_id" => c.sectors.iter().any(|r| r.id == id),
            "financing_line_id" => c.financing_lines.iter().any(|r| r.id == id),
            "program_id" => c.programs.iter().any(|r| r.id == id),
            "financing_stage_id" => c.financing_stages.iter().any(|r| r.id == id),
            "designer_id" | "formulator_id" => self.users.iter().any(|u| u.id == id),
            _ => true,
        };
        if exists {
            Ok(())
        } else {
            Err(StoreError::ForeignKeyViolation {
                constraint: format!("projects_{column}_fkey"),
            })
        }
    }

    fn check_row_fks(&self, row: &ProjectRow) -> StoreResult<()> {
        self.check_fk("typology_id", Some(row.typology_id))?;
        for (column, id) in [
            ("status_id", row.status_id),
            ("unit_id", row.unit_id),
            ("sector_id", row.sector_id),
            ("designer_id", row.designer_id),
            ("formulator_id", row.formulator_id),
            ("financing_line_id", row.financing_line_id),
            ("program_id", row.program_id),
            ("financing_stage_id", row.financing_stage_id),
        ] {
            self.check_fk(column, id)?;
        }
        Ok(())
    }

    /// Fill the joined name columns from the current catalogs.
    fn hydrate(&self, mut row: ProjectRow) -> ProjectRow {
        let c = &self.catalog;
        if let Some(t) = c.typologies.iter().find(|t| t.id == row.typology_id) {
            row.typology_name = t.name.clone();
            row.typology_abbreviation = t.abbreviation.clone();
            row.typology_color = t.color.clone();
        }
        row.status_name = row
            .status_id
            .and_then(|id| c.statuses.iter().find(|r| r.id == id))
            .map(|r| r.name.clone());
        let unit = row.unit_id.and_then(|id| c.units.iter().find(|r| r.id == id));
        row.unit_name = unit.map(|r| r.name.clone());
        row.unit_abbreviation = unit.map(|r| r.abbreviation.clone());
        row.sector_name = row
            .sector_id
            .and_then(|id| c.sectors.iter().find(|r| r.id == id))
            .map(|r| r.name.clone());
        let designer = row.designer_id.and_then(|id| self.users.iter().find(|u| u.id == id));
        row.designer_name = designer.map(|u| u.name.clone());
        row.designer_email = designer.map(|u| u.email.clone());
        let formulator = row
            .formulator_id
            .and_then(|id| self.users.iter().find(|u| u.id == id));
        row.formulator_name = formulator.map(|u| u.name.clone());
        row.formulator_email = formulator.map(|u| u.email.clone());
        row.financing_line_name = row
            .financing_line_id
            .and_then(|id| c.financing_lines.iter().find(|r| r.id == id))
            .map(|r| r.name.clone());
        row.program_name = row
            .program_id
            .and_then(|id| c.programs.iter().find(|r| r.id == id))
            .map(|r| r.name.clone());
        row.financing_stage_name = row
            .financing_stage_id
            .and_then(|id| c.financing_stages.iter().find(|r| r.id == id))
            .map(|r| r.name.clone());
        row
    }
}

/// Thread-safe in-memory store. The lock is never held across an await.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// An empty store with no reference data.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the same catalogs the lookup migration seeds.
    pub fn seeded() -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            state.catalog = seed_catalog();
            state.next_project_id = 1;
            state.next_user_id = 1;
        }
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A panic while holding the lock only happens inside a failing test.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a user directly, bypassing password hashing. Returns the row.
    pub fn add_user(&self, email: &str, name: &str, role: Role, password_hash: &str) -> User {
        let mut state = self.lock();
        let now = state.now();
        state.next_user_id = state.next_user_id.max(1);
        let user = User {
            id: state.next_user_id,
            email: email.to_string(),
            name: name.to_string(),
            role: role.name().to_string(),
            password_hash: password_hash.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.next_user_id += 1;
        state.users.push(user.clone());
        user
    }

    /// Mark a user inactive.
    pub fn deactivate_user(&self, id: DbId) {
        let mut state = self.lock();
        let now = state.now();
        if let Some(user) = state.users.iter_mut().find(|u| u.id == id) {
            user.is_active = false;
            user.updated_at = now;
        }
    }

    /// Add a typology that is not part of the seed.
    pub fn add_typology(&self, name: &str, abbreviation: &str) -> Typology {
        let mut state = self.lock();
        let id = state.catalog.typologies.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let typology = Typology {
            id,
            name: name.to_string(),
            abbreviation: abbreviation.to_string(),
            color: None,
        };
        state.catalog.typologies.push(typology.clone());
        typology
    }

    /// Number of stored projects.
    pub fn project_count(&self) -> usize {
        self.lock().projects.len()
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_typology(&self, id: DbId) -> StoreResult<Option<Typology>> {
        let state = self.lock();
        Ok(state.catalog.typologies.iter().find(|t| t.id == id).cloned())
    }

    async fn find_program(&self, id: DbId) -> StoreResult<Option<Program>> {
        let state = self.lock();
        Ok(state.catalog.programs.iter().find(|p| p.id == id).cloned())
    }

    async fn latest_code_for_typology(&self, typology_id: DbId) -> StoreResult<Option<String>> {
        let state = self.lock();
        Ok(state
            .projects
            .iter()
            .filter(|p| p.typology_id == typology_id)
            .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .map(|p| p.unique_code.clone()))
    }

    async fn insert_project(&self, unique_code: &str, input: &CreateProject) -> StoreResult<DbId> {
        let mut state = self.lock();
        if state.projects.iter().any(|p| p.unique_code == unique_code) {
            return Err(StoreError::UniqueViolation {
                constraint: PROJECT_CODE_CONSTRAINT.to_string(),
            });
        }
        let now = state.now();
        let row = ProjectRow {
            id: state.next_project_id.max(1),
            unique_code: unique_code.to_string(),
            name: input.name.clone(),
            description: input.description.clone(),
            typology_id: input.typology_id,
            status_id: input.status_id,
            unit_id: input.unit_id,
            sector_id: input.sector_id,
            address: input.address.clone(),
            land_area: input.land_area,
            building_area: input.building_area,
            year: input.year,
            prioritized: input.prioritized,
            designer_id: input.designer_id,
            formulator_id: input.formulator_id,
            financing_line_id: input.financing_line_id,
            program_id: input.program_id,
            financing_stage_id: input.financing_stage_id,
            file_code: input.file_code.clone(),
            application_date: input.application_date,
            amount: input.amount,
            currency: input.currency,
            awarded_amount: input.awarded_amount,
            tender_code: input.tender_code.clone(),
            created_at: now,
            updated_at: now,
            typology_name: String::new(),
            typology_abbreviation: String::new(),
            typology_color: None,
            status_name: None,
            unit_name: None,
            unit_abbreviation: None,
            sector_name: None,
            designer_name: None,
            designer_email: None,
            formulator_name: None,
            formulator_email: None,
            financing_line_name: None,
            program_name: None,
            financing_stage_name: None,
        };
        state.check_row_fks(&row)?;
        state.next_project_id = row.id + 1;
        let id = row.id;
        state.projects.push(row);
        Ok(id)
    }

    async fn update_project(&self, id: DbId, input: &UpdateProject) -> StoreResult<bool> {
        let mut state = self.lock();
        let Some(current) = state.projects.iter().find(|p| p.id == id).cloned() else {
            return Ok(false);
        };

        let mut next = current;
        if let Patch::Value(name) = &input.name {
            next.name = name.clone();
        }
        if let Patch::Value(prioritized) = input.prioritized {
            next.prioritized = prioritized;
        }
        if let Patch::Value(currency) = input.currency {
            next.currency = currency;
        }
        next.description = input.description.resolved(next.description.as_ref());
        next.status_id = input.status_id.resolved(next.status_id.as_ref());
        next.unit_id = input.unit_id.resolved(next.unit_id.as_ref());
        next.sector_id = input.sector_id.resolved(next.sector_id.as_ref());
        next.address = input.address.resolved(next.address.as_ref());
        next.land_area = input.land_area.resolved(next.land_area.as_ref());
        next.building_area = input.building_area.resolved(next.building_area.as_ref());
        next.year = input.year.resolved(next.year.as_ref());
        next.designer_id = input.designer_id.resolved(next.designer_id.as_ref());
        next.formulator_id = input.formulator_id.resolved(next.formulator_id.as_ref());
        next.financing_line_id = input
            .financing_line_id
            .resolved(next.financing_line_id.as_ref());
        next.program_id = input.program_id.resolved(next.program_id.as_ref());
        next.financing_stage_id = input
            .financing_stage_id
            .resolved(next.financing_stage_id.as_ref());
        next.file_code = input.file_code.resolved(next.file_code.as_ref());
        next.application_date = input
            .application_date
            .resolved(next.application_date.as_ref());
        next.amount = input.amount.resolved(next.amount.as_ref());
        next.awarded_amount = input.awarded_amount.resolved(next.awarded_amount.as_ref());
        next.tender_code = input.tender_code.resolved(next.tender_code.as_ref());

        state.check_row_fks(&next)?;
        next.updated_at = state.now();
        if let Some(slot) = state.projects.iter_mut().find(|p| p.id == id) {
            *slot = next;
        }
        Ok(true)
    }

    async fn find_project(&self, id: DbId) -> StoreResult<Option<ProjectRow>> {
        let state = self.lock();
        let row = state.projects.iter().find(|p| p.id == id).cloned();
        Ok(row.map(|r| state.hydrate(r)))
    }

    async fn list_projects(&self, query: &ProjectQuery) -> StoreResult<(Vec<ProjectRow>, i64)> {
        let state = self.lock();
        let mut matches: Vec<ProjectRow> = state
            .projects
            .iter()
            .filter(|p| matches_query(p, query))
            .cloned()
            .collect();
        let total = matches.len() as i64;

        matches.sort_by(|a, b| compare_rows(a, b, query.sort_by, query.sort_order));

        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(0);
        let page = matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|r| state.hydrate(r))
            .collect();
        Ok((page, total))
    }

    async fn lookups(&self, include_users: bool) -> StoreResult<LookupCatalog> {
        let state = self.lock();
        let mut catalog = state.catalog.clone();
        sort_by_name(&mut catalog.statuses, |r| (&r.name, r.id));
        sort_by_name(&mut catalog.typologies, |r| (&r.name, r.id));
        sort_by_name(&mut catalog.units, |r| (&r.name, r.id));
        sort_by_name(&mut catalog.sectors, |r| (&r.name, r.id));
        sort_by_name(&mut catalog.financing_lines, |r| (&r.name, r.id));
        sort_by_name(&mut catalog.programs, |r| (&r.name, r.id));
        sort_by_name(&mut catalog.financing_stages, |r| (&r.name, r.id));
        if include_users {
            let mut users: Vec<UserSummary> = state
                .users
                .iter()
                .filter(|u| u.is_active)
                .map(|u| UserSummary {
                    id: u.id,
                    name: u.name.clone(),
                    email: u.email.clone(),
                })
                .collect();
            sort_by_name(&mut users, |u| (&u.name, u.id));
            catalog.users = users;
        }
        Ok(catalog)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.lock();
        Ok(state
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        let state = self.lock();
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, input: &CreateUser) -> StoreResult<User> {
        if self.find_user_by_email(&input.email).await?.is_some() {
            return Err(StoreError::UniqueViolation {
                constraint: "uq_users_email".to_string(),
            });
        }
        Ok(self.add_user(&input.email, &input.name, input.role, &input.password_hash))
    }
}

fn sort_by_name<T>(rows: &mut [T], key: impl Fn(&T) -> (&String, DbId)) {
    rows.sort_by(|a, b| key(a).cmp(&key(b)));
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

fn matches_query(p: &ProjectRow, query: &ProjectQuery) -> bool {
    if let Some(term) = &query.search {
        let term = term.to_lowercase();
        let hit = contains_ci(Some(&p.name), &term)
            || contains_ci(Some(&p.unique_code), &term)
            || contains_ci(p.description.as_deref(), &term)
            || contains_ci(p.address.as_deref(), &term);
        if !hit {
            return false;
        }
    }

    let f = &query.filters;
    let id_filters = [
        (f.status_id, p.status_id),
        (f.typology_id, Some(p.typology_id)),
        (f.unit_id, p.unit_id),
        (f.sector_id, p.sector_id),
        (f.financing_line_id, p.financing_line_id),
        (f.program_id, p.program_id),
        (f.financing_stage_id, p.financing_stage_id),
        (f.designer_id, p.designer_id),
        (f.formulator_id, p.formulator_id),
    ];
    if id_filters
        .iter()
        .any(|(wanted, actual)| wanted.is_some() && wanted != actual)
    {
        return false;
    }
    if f.year.is_some() && f.year != p.year {
        return false;
    }
    if let Some(prioritized) = f.prioritized {
        if p.prioritized != prioritized {
            return false;
        }
    }
    true
}

/// Compare two optional keys with `None` last regardless of direction.
fn cmp_nulls_last<T: PartialOrd>(a: Option<T>, b: Option<T>, order: SortOrder) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        }
    }
}

fn compare_rows(a: &ProjectRow, b: &ProjectRow, field: SortField, order: SortOrder) -> Ordering {
    let primary = match field {
        SortField::CreatedAt => cmp_nulls_last(Some(a.created_at), Some(b.created_at), order),
        SortField::UpdatedAt => cmp_nulls_last(Some(a.updated_at), Some(b.updated_at), order),
        SortField::Name => cmp_nulls_last(Some(&a.name), Some(&b.name), order),
        SortField::UniqueCode => cmp_nulls_last(Some(&a.unique_code), Some(&b.unique_code), order),
        SortField::Year => cmp_nulls_last(a.year, b.year, order),
        SortField::LandArea => cmp_nulls_last(a.land_area, b.land_area, order),
        SortField::BuildingArea => cmp_nulls_last(a.building_area, b.building_area, order),
        SortField::Amount => cmp_nulls_last(a.amount, b.amount, order),
    };
    primary.then_with(|| match order {
        SortOrder::Asc => a.id.cmp(&b.id),
        SortOrder::Desc => b.id.cmp(&a.id),
    })
}

fn seed_catalog() -> LookupCatalog {
    fn named<T>(names: &[&str], build: impl Fn(DbId, String) -> T) -> Vec<T> {
        names
            .iter()
            .zip(1..)
            .map(|(name, id)| build(id, name.to_string()))
            .collect()
    }

    let statuses = named(
        &[
            "APROBADO",
            "DISEÑO",
            "EJECUCIÓN",
            "EJECUTADO",
            "FINANCIADO",
            "LICITACIÓN",
            "POSTULACIÓN",
            "POR DEFINIR",
        ],
        |id, name| Status { id, name },
    );
    let typologies = [
        ("ACTIVO", "ACT", "#F39C12"),
        ("EQUIPAMIENTO", "EQ", "#3498DB"),
        ("ESPACIO PÚBLICO", "EP", "#27AE60"),
        ("INFRAESTRUCTURA", "INF", "#8E44AD"),
        ("MIXTO", "MIX", "#7F8C8D"),
        ("VIVIENDA", "VIV", "#E74C3C"),
    ]
    .iter()
    .zip(1..)
    .map(|((name, abbr, color), id)| Typology {
        id,
        name: name.to_string(),
        abbreviation: abbr.to_string(),
        color: Some(color.to_string()),
    })
    .collect();
    let units = [
        ("ARQUITECTURA", "ARQ"),
        ("ASESORÍA URBANA", "AU"),
        ("INGENIERÍA", "ING"),
        ("SECPLAN", "SECPLAN"),
    ]
    .iter()
    .zip(1..)
    .map(|((name, abbr), id)| Unit {
        id,
        name: name.to_string(),
        abbreviation: abbr.to_string(),
    })
    .collect();
    let sectors = named(
        &[
            "Concepción Centro",
            "Pedro de Valdivia",
            "Lorenzo Arenas",
            "Barrio Norte",
            "Pedro del Río Zañartu",
        ],
        |id, name| Sector { id, name },
    );
    let financing_lines = named(
        &["POR DEFINIR", "SUBDERE", "GORE", "MINVU", "MUNICIPAL", "OTRO"],
        |id, name| FinancingLine { id, name },
    );
    // Line ids follow the order above: POR DEFINIR = 1 .. OTRO = 6.
    let programs = [
        ("PMU", 2),
        ("PMB", 2),
        ("FNDR", 3),
        ("DS49", 4),
        ("DS19", 4),
        ("PROPIO", 5),
        ("SIN PROGRAMA", 1),
        ("EXTERNO", 6),
    ]
    .iter()
    .zip(1..)
    .map(|((name, line), id)| Program {
        id,
        name: name.to_string(),
        financing_line_id: *line,
    })
    .collect();
    let financing_stages = named(
        &[
            "IDENTIFICACIÓN",
            "POSTULACIÓN",
            "ADMISIBILIDAD",
            "RECOMENDADO (RS)",
            "FINANCIADO",
            "LICITACIÓN",
            "ADJUDICADO",
            "EJECUCIÓN",
            "TERMINADO",
        ],
        |id, name| FinancingStage { id, name },
    );

    LookupCatalog {
        statuses,
        typologies,
        units,
        sectors,
        financing_lines,
        programs,
        financing_stages,
        users: Vec::new(),
    }
}
