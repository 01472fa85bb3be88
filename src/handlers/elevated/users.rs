use axum::{
    extract::{Path, State},
    Extension,
};

use crate::access::{self, Caller};
use crate::database::models::{AuditEntry, SubprocessGrant, User};
use crate::error::ApiError;
use crate::filter::AuditFilter;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody, QueryParams};
use crate::services::user_service::{CompanyMembership, RoleChange, SubprocessAccess, UserQuery};
use crate::services::{AuditService, UserService};
use crate::state::AppState;

async fn admin(state: &AppState, auth: &AuthUser) -> Result<Caller, ApiError> {
    let caller = state.caller(auth).await?;
    access::ensure_privileged(&caller)?;
    Ok(caller)
}

/// GET /api/users/list?id_company=&active=&search=
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    QueryParams(query): QueryParams<UserQuery>,
) -> ApiResult<Vec<User>> {
    admin(&state, &auth).await?;
    Ok(ApiResponse::success(UserService::new(state.pool.clone()).list(&query).await?))
}

/// GET /api/users/subprocesses/:id_user - Users may read their own grants
pub async fn list_subprocesses(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id_user): Path<i32>,
) -> ApiResult<Vec<SubprocessGrant>> {
    let caller = state.caller(&auth).await?;
    if caller.user_id != id_user {
        access::ensure_privileged(&caller)?;
    }
    Ok(ApiResponse::success(UserService::new(state.pool.clone()).subprocesses(id_user).await?))
}

/// POST /api/users/subprocesses - Grant a subprocess within a company
pub async fn grant_subprocess(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<SubprocessAccess>,
) -> ApiResult<()> {
    input.validate()?;
    let caller = admin(&state, &auth).await?;
    UserService::new(state.pool.clone()).grant_subprocess(&caller, &input).await?;
    Ok(ApiResponse::message("Subproceso asignado exitosamente"))
}

/// DELETE /api/users/subprocesses
pub async fn revoke_subprocess(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<SubprocessAccess>,
) -> ApiResult<()> {
    input.validate()?;
    let caller = admin(&state, &auth).await?;
    UserService::new(state.pool.clone()).revoke_subprocess(&caller, &input).await?;
    Ok(ApiResponse::message("Subproceso revocado exitosamente"))
}

/// POST /api/users/companies
pub async fn add_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<CompanyMembership>,
) -> ApiResult<()> {
    input.validate()?;
    let caller = admin(&state, &auth).await?;
    UserService::new(state.pool.clone()).add_company(&caller, &input).await?;
    Ok(ApiResponse::message("Compañía asignada exitosamente"))
}

/// DELETE /api/users/companies - Also drops the user's subprocess grants in that company
pub async fn remove_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<CompanyMembership>,
) -> ApiResult<()> {
    input.validate()?;
    let caller = admin(&state, &auth).await?;
    UserService::new(state.pool.clone()).remove_company(&caller, &input).await?;
    Ok(ApiResponse::message("Compañía removida exitosamente"))
}

/// PUT /api/users/role
pub async fn set_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<RoleChange>,
) -> ApiResult<()> {
    input.validate()?;
    let caller = admin(&state, &auth).await?;
    UserService::new(state.pool.clone()).set_role(&caller, &input).await?;
    Ok(ApiResponse::message("Rol actualizado exitosamente"))
}

/// GET /api/users/audit_log
pub async fn audit_log(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    QueryParams(filter): QueryParams<AuditFilter>,
) -> ApiResult<Vec<AuditEntry>> {
    admin(&state, &auth).await?;
    Ok(ApiResponse::success(AuditService::new(state.pool.clone()).list(&filter).await?))
}
