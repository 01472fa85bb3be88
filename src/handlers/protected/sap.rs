use axum::{
    extract::{Path, State},
    Extension,
};
use serde_json::Value;

use crate::integrations::PurchaseRequestInput;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::state::AppState;

/// POST /api/sap/purchase_requests - Create a purchase request in the company's SAP database
pub async fn create_purchase_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<PurchaseRequestInput>,
) -> ApiResult<Value> {
    input.validate()?;
    let caller = state.caller(&auth).await?;

    let created = state.sap.create_purchase_request(&input, &caller.email).await?;
    tracing::info!(
        "User {} created SAP purchase request in {:?}",
        caller.user_id,
        input.company
    );
    Ok(ApiResponse::created(created).with_message("Solicitud de compra creada en SAP"))
}

/// GET /api/sap/purchase_requests/:company/:doc_entry
pub async fn get_purchase_request(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((company, doc_entry)): Path<(String, i64)>,
) -> ApiResult<Value> {
    state.caller(&auth).await?;
    let document = state.sap.get_purchase_request(&company, doc_entry).await?;
    Ok(ApiResponse::success(document))
}
