use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::{json, Value};

use crate::access;
use crate::database::models::ProcessCategory;
use crate::filter::WorkflowFilter;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody, QueryParams};
use crate::services::workflow_service::{CreateWorkflow, TaskChangeSummary, UpdateWorkflow, WorkflowDetail};
use crate::services::WorkflowService;
use crate::state::AppState;

/// GET /api/workflows/list - Process categories of a company or process
pub async fn list_workflows(
    State(state): State<AppState>,
    QueryParams(filter): QueryParams<WorkflowFilter>,
) -> ApiResult<Vec<ProcessCategory>> {
    Ok(ApiResponse::success(WorkflowService::new(state.pool).list(&filter).await?))
}

/// GET /api/workflows/get/:id_process_category - Category, owner and ordered tasks
pub async fn get_workflow(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<WorkflowDetail> {
    Ok(ApiResponse::success(WorkflowService::new(state.pool).get(id).await?))
}

/// POST /api/workflows/create_workflow - Category, owner and tasks in one transaction (admin only)
pub async fn create_workflow(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<CreateWorkflow>,
) -> ApiResult<Value> {
    input.validate()?;
    let caller = state.caller(&auth).await?;
    access::ensure_privileged(&caller)?;

    let (id, summary) = WorkflowService::new(state.pool.clone()).create(&input).await?;
    Ok(ApiResponse::created(json!({ "id_process_category": id, "tasks": summary }))
        .with_message("Flujo de trabajo creado exitosamente"))
}

/// PUT /api/workflows/update_workflow - Apply category fields, owner and task changes (admin only)
///
/// Task changes are tagged by `action` (`create`, `update`, `delete`) and
/// applied in order. Any failure rolls the whole request back.
pub async fn update_workflow(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<UpdateWorkflow>,
) -> ApiResult<TaskChangeSummary> {
    input.validate()?;
    let caller = state.caller(&auth).await?;
    access::ensure_privileged(&caller)?;

    let summary = WorkflowService::new(state.pool.clone()).update(&input).await?;
    Ok(ApiResponse::success(summary).with_message("Flujo de trabajo actualizado exitosamente"))
}
