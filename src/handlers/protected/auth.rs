use axum::{extract::State, Extension};
use serde::Serialize;

use crate::database::models::{Company, Role};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::UserService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub id_user: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub companies: Vec<Company>,
}

/// GET /api/auth/whoami - Caller identity, current role and companies
pub async fn whoami(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<WhoAmI> {
    let caller = state.caller(&auth).await?;
    let companies = UserService::new(state.pool.clone()).companies_of(caller.user_id).await?;

    Ok(ApiResponse::success(WhoAmI {
        id_user: caller.user_id,
        name: caller.name,
        email: caller.email,
        role: caller.role,
        companies,
    }))
}
