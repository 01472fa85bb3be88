use serde::Deserialize;
use sqlx::PgPool;

use super::transaction::{self, Tx};
use super::{non_blank, required, ServiceError};
use crate::access::Caller;
use crate::database::models::{CaseView, CASE_SELECT, STATUS_OPEN};
use crate::database::QueryBuilder;
use crate::error::ApiError;
use crate::filter::{Filter, TicketFilter};
use crate::validation::FieldErrors;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTicket {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub case_type: Option<String>,
    pub id_company: Option<i32>,
    pub id_department: Option<i32>,
    pub id_place: Option<i32>,
    pub id_category: Option<i32>,
    pub id_subcategory: Option<i32>,
    pub id_activity: Option<i32>,
    /// Optional first note, stored with the case
    pub note: Option<String>,
}

impl CreateTicket {
    pub fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::new()
            .require_text("subject", self.subject.as_deref())
            .require_id("id_company", self.id_company)
            .require_id("id_category", self.id_category)
            .check_optional_id("id_department", self.id_department)
            .check_optional_id("id_place", self.id_place)
            .check_optional_id("id_subcategory", self.id_subcategory)
            .check_optional_id("id_activity", self.id_activity)
            .finish()
    }
}

/// Case update. Absent optional fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTicket {
    pub id_case: Option<i32>,
    /// New `id_status`
    pub status: Option<i32>,
    pub priority: Option<String>,
    pub case_type: Option<String>,
    pub id_department: Option<i32>,
    pub id_place: Option<i32>,
    pub resolution: Option<String>,
    pub id_category: Option<i32>,
    pub id_subcategory: Option<i32>,
    pub id_activity: Option<i32>,
}

impl UpdateTicket {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors
            .require_id("id_case", self.id_case)
            .check_optional_id("status", self.status)
            .check_optional_id("id_department", self.id_department)
            .check_optional_id("id_place", self.id_place)
            .check_optional_id("id_category", self.id_category)
            .check_optional_id("id_subcategory", self.id_subcategory)
            .check_optional_id("id_activity", self.id_activity);
        if !self.changes_anything() {
            errors.add("status", "Debe indicar al menos un campo a actualizar");
        }
        errors.finish()
    }

    fn changes_anything(&self) -> bool {
        self.status.is_some()
            || non_blank(self.priority.as_deref()).is_some()
            || non_blank(self.case_type.as_deref()).is_some()
            || self.id_department.is_some()
            || self.id_place.is_some()
            || non_blank(self.resolution.as_deref()).is_some()
            || self.touches_classification()
    }

    fn touches_classification(&self) -> bool {
        self.id_category.is_some() || self.id_subcategory.is_some() || self.id_activity.is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignTicket {
    pub id_case: Option<i32>,
    pub id_technical_account: Option<i32>,
}

impl AssignTicket {
    pub fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::new()
            .require_id("id_case", self.id_case)
            .require_id("id_technical_account", self.id_technical_account)
            .finish()
    }
}

pub struct TicketService {
    pool: PgPool,
}

impl TicketService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert the case, its classification row and the optional first note
    pub async fn create(&self, requester: &Caller, input: &CreateTicket) -> Result<i32, ServiceError> {
        const MESSAGE: &str = "Error al crear el caso";
        let mut tx = transaction::begin(&self.pool, MESSAGE).await?;
        let result = insert_case(&mut tx, requester.user_id, input).await;
        let id_case = transaction::finish(tx, result, MESSAGE).await?;
        tracing::info!("Case {} created by user {}", id_case, requester.user_id);
        Ok(id_case)
    }

    pub async fn update(&self, input: &UpdateTicket) -> Result<(), ServiceError> {
        const MESSAGE: &str = "Error al actualizar el caso";
        let mut tx = transaction::begin(&self.pool, MESSAGE).await?;
        let result = apply_update(&mut tx, input).await;
        transaction::finish(tx, result, MESSAGE).await?;
        tracing::info!("Case {:?} updated", input.id_case);
        Ok(())
    }

    /// Set the technical account and record the hand-over as a note
    pub async fn assign(&self, actor: &Caller, input: &AssignTicket) -> Result<(), ServiceError> {
        const MESSAGE: &str = "Error al asignar el caso";
        let mut tx = transaction::begin(&self.pool, MESSAGE).await?;
        let result = apply_assignment(&mut tx, actor.user_id, input).await;
        transaction::finish(tx, result, MESSAGE).await?;
        tracing::info!(
            "Case {:?} assigned to user {:?} by {}",
            input.id_case,
            input.id_technical_account,
            actor.user_id
        );
        Ok(())
    }

    pub async fn get(&self, id_case: i32) -> Result<CaseView, ServiceError> {
        let query = format!("{} WHERE c.id_case = $1", CASE_SELECT);
        sqlx::query_as::<_, CaseView>(&query)
            .bind(id_case)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Caso {} no encontrado", id_case)))
    }

    /// Non-privileged callers only see cases they requested or are assigned to
    pub async fn list(&self, caller: &Caller, filter: &TicketFilter) -> Result<Vec<CaseView>, ServiceError> {
        let mut built = Filter::from_query(filter)?;
        if !caller.is_privileged() {
            built.restrict(|w| {
                w.any_eq(&["c.id_requester", "c.id_technical_account"], caller.user_id);
            });
        }
        Ok(QueryBuilder::<CaseView>::new(built).select_all(&self.pool).await?)
    }
}

async fn insert_case(tx: &mut Tx, id_requester: i32, input: &CreateTicket) -> Result<i32, ServiceError> {
    let id_case: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO cases
            (subject, description, priority, case_type, id_status,
             id_department, id_requester, id_place, id_company)
        VALUES ($1, COALESCE($2, ''), COALESCE($3, 'Media'), COALESCE($4, 'Requerimiento'), $5,
                $6, $7, $8, $9)
        RETURNING id_case
        "#,
    )
    .bind(required(non_blank(input.subject.as_deref()), "subject")?)
    .bind(input.description.as_deref())
    .bind(non_blank(input.priority.as_deref()))
    .bind(non_blank(input.case_type.as_deref()))
    .bind(STATUS_OPEN)
    .bind(input.id_department)
    .bind(id_requester)
    .bind(input.id_place)
    .bind(required(input.id_company, "id_company")?)
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query(
        "INSERT INTO category_case (id_case, id_category, id_subcategory, id_activity) VALUES ($1, $2, $3, $4)",
    )
    .bind(id_case)
    .bind(input.id_category)
    .bind(input.id_subcategory)
    .bind(input.id_activity)
    .execute(&mut **tx)
    .await?;

    if let Some(note) = non_blank(input.note.as_deref()) {
        sqlx::query("INSERT INTO case_notes (id_case, id_user, note) VALUES ($1, $2, $3)")
            .bind(id_case)
            .bind(id_requester)
            .bind(note)
            .execute(&mut **tx)
            .await?;
    }

    Ok(id_case)
}

async fn apply_update(tx: &mut Tx, input: &UpdateTicket) -> Result<(), ServiceError> {
    let id_case = required(input.id_case, "id_case")?;

    // end_date follows the status: stamped on entering a final status, cleared on reopen,
    // untouched when no status is given
    let updated = sqlx::query(
        r#"
        UPDATE cases SET
            id_status = COALESCE($2, id_status),
            priority = COALESCE($3, priority),
            case_type = COALESCE($4, case_type),
            id_department = COALESCE($5, id_department),
            id_place = COALESCE($6, id_place),
            resolution = COALESCE($7, resolution),
            end_date = CASE
                WHEN $2::INTEGER IS NULL THEN end_date
                WHEN (SELECT is_final FROM status WHERE id_status = $2) THEN COALESCE(end_date, now())
                ELSE NULL
            END
        WHERE id_case = $1
        "#,
    )
    .bind(id_case)
    .bind(input.status)
    .bind(non_blank(input.priority.as_deref()))
    .bind(non_blank(input.case_type.as_deref()))
    .bind(input.id_department)
    .bind(input.id_place)
    .bind(non_blank(input.resolution.as_deref()))
    .execute(&mut **tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(ServiceError::NotFound(format!("Caso {} no encontrado", id_case)));
    }

    if input.touches_classification() {
        sqlx::query(
            r#"
            INSERT INTO category_case (id_case, id_category, id_subcategory, id_activity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id_case) DO UPDATE SET
                id_category = COALESCE(EXCLUDED.id_category, category_case.id_category),
                id_subcategory = COALESCE(EXCLUDED.id_subcategory, category_case.id_subcategory),
                id_activity = COALESCE(EXCLUDED.id_activity, category_case.id_activity)
            "#,
        )
        .bind(id_case)
        .bind(input.id_category)
        .bind(input.id_subcategory)
        .bind(input.id_activity)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

async fn apply_assignment(tx: &mut Tx, id_actor: i32, input: &AssignTicket) -> Result<(), ServiceError> {
    let id_case = required(input.id_case, "id_case")?;
    let id_technical_account = required(input.id_technical_account, "id_technical_account")?;

    let name: Option<String> = sqlx::query_scalar("SELECT name FROM users WHERE id_user = $1 AND active")
        .bind(id_technical_account)
        .fetch_optional(&mut **tx)
        .await?;
    let name = name.ok_or_else(|| ServiceError::NotFound(format!("Usuario {} no encontrado", id_technical_account)))?;

    let updated = sqlx::query("UPDATE cases SET id_technical_account = $2 WHERE id_case = $1")
        .bind(id_case)
        .bind(id_technical_account)
        .execute(&mut **tx)
        .await?;
    if updated.rows_affected() == 0 {
        return Err(ServiceError::NotFound(format!("Caso {} no encontrado", id_case)));
    }

    sqlx::query("INSERT INTO case_notes (id_case, id_user, note) VALUES ($1, $2, $3)")
        .bind(id_case)
        .bind(id_actor)
        .bind(format!("Caso asignado a {}", name))
        .execute(&mut **tx)
        .await?;

    Ok(())
}
