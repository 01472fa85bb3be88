//! Permission gate for case and general request mutations.
//!
//! A caller may mutate when their role is privileged, or when they are the
//! entity's current assignee matched by name or email (trimmed,
//! case-insensitive). Nothing is cached; every mutating request re-checks.

use sqlx::PgPool;

use crate::database::models::Role;
use crate::middleware::AuthUser;
use crate::services::ServiceError;

/// The authenticated user with their role as currently stored
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Caller {
    pub fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }
}

/// Someone an entity is assigned to, as loaded from the assignment chain
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct Assignee {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(sqlx::FromRow)]
struct CallerRow {
    id_user: i32,
    name: String,
    email: String,
    #[sqlx(try_from = "String")]
    role: Role,
    active: bool,
}

/// Resolve the caller's current role. Unknown or inactive users are rejected.
pub async fn resolve_caller(pool: &PgPool, auth: &AuthUser) -> Result<Caller, ServiceError> {
    let row = sqlx::query_as::<_, CallerRow>(
        "SELECT id_user, name, email, role, active FROM users WHERE id_user = $1",
    )
    .bind(auth.user_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) if row.active => Ok(Caller {
            user_id: row.id_user,
            name: row.name,
            email: row.email,
            role: row.role,
        }),
        Some(_) => {
            tracing::warn!("Inactive user {} attempted access", auth.user_id);
            Err(ServiceError::Forbidden("Usuario inactivo".to_string()))
        }
        None => {
            tracing::warn!("Unknown user {} presented a valid token", auth.user_id);
            Err(ServiceError::Forbidden("Usuario no registrado".to_string()))
        }
    }
}

fn same_identity(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    !a.is_empty() && a.to_lowercase() == b.to_lowercase()
}

/// Name or email match, trimmed and case-insensitive
pub fn identity_matches(caller: &Caller, assignee: &Assignee) -> bool {
    let by_name = assignee
        .name
        .as_deref()
        .map(|name| same_identity(&caller.name, name))
        .unwrap_or(false);
    let by_email = assignee
        .email
        .as_deref()
        .map(|email| same_identity(&caller.email, email))
        .unwrap_or(false);
    by_name || by_email
}

pub fn ensure_privileged(caller: &Caller) -> Result<(), ServiceError> {
    if caller.is_privileged() {
        return Ok(());
    }
    tracing::warn!("User {} denied: administrator role required", caller.user_id);
    Err(ServiceError::Forbidden(
        "Se requiere rol de administrador para esta operación".to_string(),
    ))
}

/// Requester plus the assignee reached through the entity's assignment chain
#[derive(Debug, sqlx::FromRow)]
struct Parties {
    id_requester: i32,
    name: Option<String>,
    email: Option<String>,
}

impl Parties {
    fn assignee(&self) -> Assignee {
        Assignee {
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Case → technical account
async fn case_parties(pool: &PgPool, id_case: i32) -> Result<Parties, ServiceError> {
    sqlx::query_as::<_, Parties>(
        r#"
        SELECT c.id_requester, ta.name, ta.email
        FROM cases c
        LEFT JOIN users ta ON ta.id_user = c.id_technical_account
        WHERE c.id_case = $1
        "#,
    )
    .bind(id_case)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ServiceError::NotFound(format!("Caso {} no encontrado", id_case)))
}

/// General request → explicit assignee, else company/process/category owner
async fn request_parties(pool: &PgPool, id_general_request: i32) -> Result<Parties, ServiceError> {
    sqlx::query_as::<_, Parties>(
        r#"
        SELECT gr.id_requester, u.name, u.email
        FROM general_requests gr
        JOIN companies co ON co.id_company = gr.id_company
        JOIN process_categories pc ON pc.id_process_category = gr.id_process_category
        JOIN processes pr ON pr.id_process = pc.id_process AND pr.id_company = co.id_company
        LEFT JOIN process_category_user pcu ON pcu.id_process_category = pc.id_process_category
        LEFT JOIN users u ON u.id_user = COALESCE(gr.id_assigned_user, pcu.id_user)
        WHERE gr.id_general_request = $1
        "#,
    )
    .bind(id_general_request)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ServiceError::NotFound(format!("Solicitud {} no encontrada", id_general_request)))
}

pub async fn can_mutate_case(pool: &PgPool, caller: &Caller, id_case: i32) -> Result<bool, ServiceError> {
    if caller.is_privileged() {
        return Ok(true);
    }
    let parties = case_parties(pool, id_case).await?;
    Ok(identity_matches(caller, &parties.assignee()))
}

pub async fn can_mutate_request(pool: &PgPool, caller: &Caller, id_general_request: i32) -> Result<bool, ServiceError> {
    if caller.is_privileged() {
        return Ok(true);
    }
    let parties = request_parties(pool, id_general_request).await?;
    Ok(identity_matches(caller, &parties.assignee()))
}

pub async fn ensure_case_mutation(pool: &PgPool, caller: &Caller, id_case: i32) -> Result<(), ServiceError> {
    if can_mutate_case(pool, caller, id_case).await? {
        return Ok(());
    }
    tracing::warn!("User {} denied mutation of case {}", caller.user_id, id_case);
    Err(ServiceError::Forbidden(
        "No tiene permisos para modificar este caso".to_string(),
    ))
}

pub async fn ensure_request_mutation(pool: &PgPool, caller: &Caller, id_general_request: i32) -> Result<(), ServiceError> {
    if can_mutate_request(pool, caller, id_general_request).await? {
        return Ok(());
    }
    tracing::warn!("User {} denied mutation of request {}", caller.user_id, id_general_request);
    Err(ServiceError::Forbidden(
        "No tiene permisos para modificar esta solicitud".to_string(),
    ))
}

/// Reading and commenting is also open to the requester
pub async fn ensure_case_participant(pool: &PgPool, caller: &Caller, id_case: i32) -> Result<(), ServiceError> {
    if caller.is_privileged() {
        return Ok(());
    }
    let parties = case_parties(pool, id_case).await?;
    if parties.id_requester == caller.user_id || identity_matches(caller, &parties.assignee()) {
        return Ok(());
    }
    Err(ServiceError::Forbidden("No tiene acceso a este caso".to_string()))
}

pub async fn ensure_request_participant(pool: &PgPool, caller: &Caller, id_general_request: i32) -> Result<(), ServiceError> {
    if caller.is_privileged() {
        return Ok(());
    }
    let parties = request_parties(pool, id_general_request).await?;
    if parties.id_requester == caller.user_id || identity_matches(caller, &parties.assignee()) {
        return Ok(());
    }
    Err(ServiceError::Forbidden("No tiene acceso a esta solicitud".to_string()))
}
