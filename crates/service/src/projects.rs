//! Project list, get, create and update.

use std::sync::Arc;

use secplan_core::access::{can_create, caller_can_edit, Caller};
use secplan_core::error::CoreError;
use secplan_core::projection::Projection;
use secplan_core::query::{ProjectListParams, ProjectQuery};
use secplan_core::types::DbId;
use secplan_db::models::project::{CreateProject, ProjectPage, ProjectView, UpdateProject};
use secplan_db::ProjectStore;

use crate::code_generator::CodeGenerator;
use crate::store_error::map_store_error;

/// Orchestrates project reads and mutations over a [`ProjectStore`].
#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn ProjectStore>,
    codes: CodeGenerator,
}

impl ProjectService {
    pub fn new(store: Arc<dyn ProjectStore>) -> Self {
        Self {
            codes: CodeGenerator::new(Arc::clone(&store)),
            store,
        }
    }

    /// One page of projects, projected for the caller.
    pub async fn list(
        &self,
        params: ProjectListParams,
        caller: Option<&Caller>,
    ) -> Result<ProjectPage, CoreError> {
        let query = ProjectQuery::from_params(params)?;
        let projection = Projection::for_caller(caller.is_some());

        let (rows, total) = self
            .store
            .list_projects(&query)
            .await
            .map_err(map_store_error)?;

        tracing::debug!(
            page = query.page,
            limit = query.limit,
            total,
            returned = rows.len(),
            "Listed projects"
        );

        Ok(ProjectPage {
            items: rows
                .into_iter()
                .map(|row| ProjectView::from_row(row, projection))
                .collect(),
            total,
            page: query.page,
            limit: query.limit,
        })
    }

    /// A single project, or `None` if it does not exist.
    pub async fn get(
        &self,
        id: DbId,
        caller: Option<&Caller>,
    ) -> Result<Option<ProjectView>, CoreError> {
        let projection = Projection::for_caller(caller.is_some());
        let row = self.store.find_project(id).await.map_err(map_store_error)?;
        Ok(row.map(|row| ProjectView::from_row(row, projection)))
    }

    /// Register a new project under a freshly generated code.
    ///
    /// Returns the stored record in the internal projection.
    pub async fn create(
        &self,
        mut input: CreateProject,
        caller: Option<&Caller>,
    ) -> Result<ProjectView, CoreError> {
        let caller = caller.ok_or_else(|| {
            CoreError::Unauthorized("Authentication required to create projects".to_string())
        })?;
        if !can_create(caller.role) {
            return Err(CoreError::Forbidden(format!(
                "Role {} cannot create projects",
                caller.role
            )));
        }

        input.normalize();
        input.validate_fields()?;

        let typology = self
            .store
            .find_typology(input.typology_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| CoreError::field("typology_id", "typology does not exist"))?;

        self.check_program_line(input.program_id, input.financing_line_id)
            .await?;

        let code = self.codes.generate_for(&typology).await?;
        let id = self
            .store
            .insert_project(&code, &input)
            .await
            .map_err(map_store_error)?;

        let row = self
            .store
            .find_project(id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| CoreError::Internal(format!("project {id} vanished after insert")))?;
        let view = ProjectView::from_row(row, Projection::Internal);

        tracing::info!(
            project_id = view.id(),
            code = %view.unique_code(),
            user_id = caller.user_id,
            "Project created"
        );
        Ok(view)
    }

    /// Apply a partial update. `Ok(None)` when the project does not exist.
    ///
    /// The unique code and typology are never touched.
    pub async fn update(
        &self,
        id: DbId,
        mut input: UpdateProject,
        caller: Option<&Caller>,
    ) -> Result<Option<ProjectView>, CoreError> {
        let caller = caller.ok_or_else(|| {
            CoreError::Unauthorized("Authentication required to edit projects".to_string())
        })?;
        if input.is_empty() {
            return Err(CoreError::Validation("nothing to update".to_string()));
        }
        input.normalize();
        input.validate_fields()?;

        let Some(existing) = self.store.find_project(id).await.map_err(map_store_error)? else {
            return Ok(None);
        };

        if !caller_can_edit(Some(caller), existing.designer_id) {
            tracing::debug!(
                project_id = id,
                user_id = caller.user_id,
                role = %caller.role,
                "Project edit denied"
            );
            return Err(CoreError::Forbidden(
                "Only the project designer or a coordinator can edit this project".to_string(),
            ));
        }

        let program_id = input.program_id.resolved(existing.program_id.as_ref());
        let line_id = input
            .financing_line_id
            .resolved(existing.financing_line_id.as_ref());
        self.check_program_line(program_id, line_id).await?;

        let updated = self
            .store
            .update_project(id, &input)
            .await
            .map_err(map_store_error)?;
        if !updated {
            return Ok(None);
        }

        tracing::info!(project_id = id, user_id = caller.user_id, "Project updated");

        let row = self.store.find_project(id).await.map_err(map_store_error)?;
        Ok(row.map(|row| ProjectView::from_row(row, Projection::Internal)))
    }

    /// A program must belong to the financing line it is recorded with.
    async fn check_program_line(
        &self,
        program_id: Option<DbId>,
        line_id: Option<DbId>,
    ) -> Result<(), CoreError> {
        let (Some(program_id), Some(line_id)) = (program_id, line_id) else {
            return Ok(());
        };
        let program = self
            .store
            .find_program(program_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| CoreError::Validation("invalid reference".to_string()))?;
        if program.financing_line_id != line_id {
            return Err(CoreError::field(
                "program_id",
                "program does not belong to the selected financing line",
            ));
        }
        Ok(())
    }
}
