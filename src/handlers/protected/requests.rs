use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::{json, Value};

use crate::access;
use crate::database::models::{GeneralRequestView, Note};
use crate::filter::RequestFilter;
use crate::integrations::notify;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody, QueryParams};
use crate::services::note_service::NewNote;
use crate::services::request_service::{CreateRequest, UpdateRequest};
use crate::services::{NoteService, NoteTarget, RequestService};
use crate::state::AppState;

async fn reload(service: &RequestService, id: i32) -> Option<GeneralRequestView> {
    match service.get(id).await {
        Ok(request) => Some(request),
        Err(e) => {
            tracing::warn!("Request {} committed but could not be reloaded for notification: {}", id, e);
            None
        }
    }
}

/// POST /api/requests/create_request - Create a general request routed by process category
pub async fn create_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<CreateRequest>,
) -> ApiResult<Value> {
    input.validate()?;
    let caller = state.caller(&auth).await?;

    let service = RequestService::new(state.pool.clone());
    let id = service.create(&caller, &input).await?;

    if let Some(request) = reload(&service, id).await {
        notify::request_created(state.mailer.as_ref(), &request).await;
    }
    Ok(ApiResponse::created(json!({ "id_general_request": id })).with_message("Solicitud creada exitosamente"))
}

/// PUT /api/requests/update_request - Status, assignment and note in one transaction
///
/// Allowed for admins, super users and the request's effective assignee.
pub async fn update_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<UpdateRequest>,
) -> ApiResult<()> {
    input.validate()?;
    let id = input.id_general_request.unwrap_or_default();

    let caller = state.caller(&auth).await?;
    access::ensure_request_mutation(&state.pool, &caller, id).await?;

    let service = RequestService::new(state.pool.clone());
    service.update(&caller, &input).await?;

    if let Some(request) = reload(&service, id).await {
        notify::request_updated(state.mailer.as_ref(), &request).await;
    }
    Ok(ApiResponse::message("Solicitud actualizada exitosamente"))
}

/// GET /api/requests/list - Filtered request list
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    QueryParams(filter): QueryParams<RequestFilter>,
) -> ApiResult<Vec<GeneralRequestView>> {
    let caller = state.caller(&auth).await?;
    let requests = RequestService::new(state.pool.clone()).list(&caller, &filter).await?;
    Ok(ApiResponse::success(requests))
}

/// GET /api/requests/get/:id - Request detail
pub async fn get_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> ApiResult<GeneralRequestView> {
    let caller = state.caller(&auth).await?;
    access::ensure_request_participant(&state.pool, &caller, id).await?;
    Ok(ApiResponse::success(RequestService::new(state.pool.clone()).get(id).await?))
}

/// GET /api/requests/notes/:id
pub async fn list_notes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
) -> ApiResult<Vec<Note>> {
    let caller = state.caller(&auth).await?;
    access::ensure_request_participant(&state.pool, &caller, id).await?;
    let notes = NoteService::new(state.pool.clone()).list(NoteTarget::Request(id)).await?;
    Ok(ApiResponse::success(notes))
}

/// POST /api/requests/notes/:id
pub async fn add_note(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i32>,
    JsonBody(input): JsonBody<NewNote>,
) -> ApiResult<Note> {
    input.validate()?;
    let caller = state.caller(&auth).await?;
    access::ensure_request_participant(&state.pool, &caller, id).await?;
    let note = NoteService::new(state.pool.clone())
        .append(NoteTarget::Request(id), caller.user_id, &input)
        .await?;
    Ok(ApiResponse::created(note).with_message("Nota agregada exitosamente"))
}
