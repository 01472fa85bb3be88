use serde::Deserialize;
use sqlx::PgPool;

use super::transaction::{self, Tx};
use super::{non_blank, required, ServiceError};
use crate::access::Caller;
use crate::database::models::{GeneralRequestView, REQUEST_SELECT, STATUS_OPEN};
use crate::database::QueryBuilder;
use crate::error::ApiError;
use crate::filter::request_filter::EFFECTIVE_ASSIGNEE;
use crate::filter::{Filter, RequestFilter};
use crate::validation::FieldErrors;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRequest {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub id_company: Option<i32>,
    pub id_process_category: Option<i32>,
    pub note: Option<String>,
}

impl CreateRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::new()
            .require_text("subject", self.subject.as_deref())
            .require_id("id_company", self.id_company)
            .require_id("id_process_category", self.id_process_category)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRequest {
    pub id_general_request: Option<i32>,
    /// New `id_status`
    pub status: Option<i32>,
    pub id_assigned_user: Option<i32>,
    /// Appended as a note in the same transaction
    pub note: Option<String>,
}

impl UpdateRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors
            .require_id("id_general_request", self.id_general_request)
            .check_optional_id("status", self.status)
            .check_optional_id("id_assigned_user", self.id_assigned_user);
        if self.status.is_none() && self.id_assigned_user.is_none() && non_blank(self.note.as_deref()).is_none() {
            errors.add("status", "Debe indicar estado, usuario asignado o nota");
        }
        errors.finish()
    }
}

pub struct RequestService {
    pool: PgPool,
}

impl RequestService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, requester: &Caller, input: &CreateRequest) -> Result<i32, ServiceError> {
        const MESSAGE: &str = "Error al crear la solicitud";
        let mut tx = transaction::begin(&self.pool, MESSAGE).await?;
        let result = insert_request(&mut tx, requester.user_id, input).await;
        let id = transaction::finish(tx, result, MESSAGE).await?;
        tracing::info!("General request {} created by user {}", id, requester.user_id);
        Ok(id)
    }

    pub async fn update(&self, actor: &Caller, input: &UpdateRequest) -> Result<(), ServiceError> {
        const MESSAGE: &str = "Error al actualizar la solicitud";
        let mut tx = transaction::begin(&self.pool, MESSAGE).await?;
        let result = apply_update(&mut tx, actor.user_id, input).await;
        transaction::finish(tx, result, MESSAGE).await?;
        tracing::info!("General request {:?} updated by user {}", input.id_general_request, actor.user_id);
        Ok(())
    }

    pub async fn get(&self, id_general_request: i32) -> Result<GeneralRequestView, ServiceError> {
        let query = format!("{} WHERE gr.id_general_request = $1", REQUEST_SELECT);
        sqlx::query_as::<_, GeneralRequestView>(&query)
            .bind(id_general_request)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Solicitud {} no encontrada", id_general_request)))
    }

    /// Non-privileged callers see what they requested or what routes to them
    pub async fn list(&self, caller: &Caller, filter: &RequestFilter) -> Result<Vec<GeneralRequestView>, ServiceError> {
        let mut built = Filter::from_query(filter)?;
        if !caller.is_privileged() {
            built.restrict(|w| {
                w.any_eq(&["gr.id_requester", EFFECTIVE_ASSIGNEE], caller.user_id);
            });
        }
        Ok(QueryBuilder::<GeneralRequestView>::new(built).select_all(&self.pool).await?)
    }
}

async fn insert_request(tx: &mut Tx, id_requester: i32, input: &CreateRequest) -> Result<i32, ServiceError> {
    let id_company = required(input.id_company, "id_company")?;
    let id_process_category = required(input.id_process_category, "id_process_category")?;

    // The category must be an active one of the company's own processes
    let routable: Option<i32> = sqlx::query_scalar(
        r#"
        SELECT pc.id_process_category
        FROM process_categories pc
        JOIN processes pr ON pr.id_process = pc.id_process
        WHERE pc.id_process_category = $1 AND pr.id_company = $2 AND pc.active
        "#,
    )
    .bind(id_process_category)
    .bind(id_company)
    .fetch_optional(&mut **tx)
    .await?;
    if routable.is_none() {
        return Err(ServiceError::Invalid(
            "La categoría de proceso no pertenece a la compañía".to_string(),
        ));
    }

    let id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO general_requests
            (subject, description, id_company, id_process_category, id_requester, id_status)
        VALUES ($1, COALESCE($2, ''), $3, $4, $5, $6)
        RETURNING id_general_request
        "#,
    )
    .bind(required(non_blank(input.subject.as_deref()), "subject")?)
    .bind(input.description.as_deref())
    .bind(id_company)
    .bind(id_process_category)
    .bind(id_requester)
    .bind(STATUS_OPEN)
    .fetch_one(&mut **tx)
    .await?;

    if let Some(note) = non_blank(input.note.as_deref()) {
        insert_note(tx, id, id_requester, note).await?;
    }

    Ok(id)
}

async fn apply_update(tx: &mut Tx, id_actor: i32, input: &UpdateRequest) -> Result<(), ServiceError> {
    let id = required(input.id_general_request, "id_general_request")?;

    let updated = sqlx::query(
        r#"
        UPDATE general_requests SET
            id_status = COALESCE($2, id_status),
            id_assigned_user = COALESCE($3, id_assigned_user),
            end_date = CASE
                WHEN $2::INTEGER IS NULL THEN end_date
                WHEN (SELECT is_final FROM status WHERE id_status = $2) THEN COALESCE(end_date, now())
                ELSE NULL
            END
        WHERE id_general_request = $1
        "#,
    )
    .bind(id)
    .bind(input.status)
    .bind(input.id_assigned_user)
    .execute(&mut **tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(ServiceError::NotFound(format!("Solicitud {} no encontrada", id)));
    }

    if let Some(note) = non_blank(input.note.as_deref()) {
        insert_note(tx, id, id_actor, note).await?;
    }

    Ok(())
}

async fn insert_note(tx: &mut Tx, id_general_request: i32, id_user: i32, note: &str) -> Result<(), ServiceError> {
    sqlx::query("INSERT INTO general_request_notes (id_general_request, id_user, note) VALUES ($1, $2, $3)")
        .bind(id_general_request)
        .bind(id_user)
        .bind(note)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
