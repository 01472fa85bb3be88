use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::{json, Value};

use crate::access;
use crate::database::models::{CaseView, Note};
use crate::integrations::notify;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody, QueryParams};
use crate::filter::TicketFilter;
use crate::services::note_service::NewNote;
use crate::services::ticket_service::{AssignTicket, CreateTicket, UpdateTicket};
use crate::services::{NoteService, NoteTarget, TicketService};
use crate::state::AppState;

/// Reload the committed case for its notification; a failed reload only skips the email
async fn reload(service: &TicketService, id_case: i32) -> Option<CaseView> {
    match service.get(id_case).await {
        Ok(case) => Some(case),
        Err(e) => {
            tracing::warn!("Case {} committed but could not be reloaded for notification: {}", id_case, e);
            None
        }
    }
}

/// POST /api/tickets/create_ticket - Create a case with its classification
pub async fn create_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<CreateTicket>,
) -> ApiResult<Value> {
    input.validate()?;
    let caller = state.caller(&auth).await?;

    let service = TicketService::new(state.pool.clone());
    let id_case = service.create(&caller, &input).await?;

    if let Some(case) = reload(&service, id_case).await {
        notify::case_created(state.mailer.as_ref(), &case).await;
    }
    Ok(ApiResponse::created(json!({ "id_case": id_case })).with_message("Caso creado exitosamente"))
}

/// PUT /api/tickets/update_ticket - Update a case and its classification in one transaction
///
/// Allowed for admins, super users and the case's technical account.
pub async fn update_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<UpdateTicket>,
) -> ApiResult<()> {
    input.validate()?;
    let id_case = input.id_case.unwrap_or_default();

    let caller = state.caller(&auth).await?;
    access::ensure_case_mutation(&state.pool, &caller, id_case).await?;

    let service = TicketService::new(state.pool.clone());
    service.update(&input).await?;

    if let Some(case) = reload(&service, id_case).await {
        notify::case_updated(state.mailer.as_ref(), &case).await;
    }
    Ok(ApiResponse::message("Caso actualizado exitosamente"))
}

/// PUT /api/tickets/assign_ticket - Hand a case to a technical account (admin only)
pub async fn assign_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<AssignTicket>,
) -> ApiResult<()> {
    input.validate()?;
    let caller = state.caller(&auth).await?;
    access::ensure_privileged(&caller)?;

    let service = TicketService::new(state.pool.clone());
    service.assign(&caller, &input).await?;

    if let Some(case) = reload(&service, input.id_case.unwrap_or_default()).await {
        notify::case_assigned(state.mailer.as_ref(), &case).await;
    }
    Ok(ApiResponse::message("Caso asignado exitosamente"))
}

/// GET /api/tickets/list - Filtered case list
pub async fn list_tickets(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    QueryParams(filter): QueryParams<TicketFilter>,
) -> ApiResult<Vec<CaseView>> {
    let caller = state.caller(&auth).await?;
    let cases = TicketService::new(state.pool.clone()).list(&caller, &filter).await?;
    Ok(ApiResponse::success(cases))
}

/// GET /api/tickets/get/:id_case - Case detail
pub async fn get_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id_case): Path<i32>,
) -> ApiResult<CaseView> {
    let caller = state.caller(&auth).await?;
    access::ensure_case_participant(&state.pool, &caller, id_case).await?;
    Ok(ApiResponse::success(TicketService::new(state.pool.clone()).get(id_case).await?))
}

/// GET /api/tickets/notes/:id_case - Notes in chronological order
pub async fn list_notes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id_case): Path<i32>,
) -> ApiResult<Vec<Note>> {
    let caller = state.caller(&auth).await?;
    access::ensure_case_participant(&state.pool, &caller, id_case).await?;
    let notes = NoteService::new(state.pool.clone()).list(NoteTarget::Case(id_case)).await?;
    Ok(ApiResponse::success(notes))
}

/// POST /api/tickets/notes/:id_case - Append a note
pub async fn add_note(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id_case): Path<i32>,
    JsonBody(input): JsonBody<NewNote>,
) -> ApiResult<Note> {
    input.validate()?;
    let caller = state.caller(&auth).await?;
    access::ensure_case_participant(&state.pool, &caller, id_case).await?;
    let note = NoteService::new(state.pool.clone())
        .append(NoteTarget::Case(id_case), caller.user_id, &input)
        .await?;
    Ok(ApiResponse::created(note).with_message("Nota agregada exitosamente"))
}
