//! Workflow definitions: a process category, its owner and its ordered tasks.
//!
//! Creation and updates run as one transaction. Task changes arrive as a
//! tagged list and are applied in order; a failure anywhere rolls back the
//! category, owner and every task write together.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::transaction::{self, Tx};
use super::{non_blank, required, ServiceError};
use crate::database::models::{ProcessCategory, Task, WorkflowAssignee, PROCESS_CATEGORY_SELECT, TASK_SELECT};
use crate::database::QueryBuilder;
use crate::error::ApiError;
use crate::filter::{Filter, WorkflowFilter};
use crate::validation::FieldErrors;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
    pub cost: Option<Decimal>,
    pub cost_center: Option<String>,
    pub position: Option<i32>,
    pub id_user: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskUpdate {
    pub id_task: i32,
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
    pub cost: Option<Decimal>,
    pub cost_center: Option<String>,
    pub position: Option<i32>,
    /// Replaces the current assignment when present
    pub id_user: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum TaskChange {
    Create(NewTask),
    Update(TaskUpdate),
    Delete { id_task: i32 },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateWorkflow {
    pub id_process: Option<i32>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
    pub id_user: Option<i32>,
    #[serde(default)]
    pub tasks: Vec<NewTask>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWorkflow {
    pub id_process_category: Option<i32>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
    /// Replaces the owner when present
    pub id_user: Option<i32>,
    #[serde(default)]
    pub tasks: Vec<TaskChange>,
}

fn check_cost(errors: &mut FieldErrors, index: usize, cost: Option<Decimal>) {
    if matches!(cost, Some(c) if c.is_sign_negative()) {
        errors.add(&format!("tasks[{}].cost", index), "El costo no puede ser negativo");
    }
}

impl CreateWorkflow {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors
            .require_id("id_process", self.id_process)
            .require_text("name", self.name.as_deref())
            .check_optional_id("id_user", self.id_user);
        for (index, task) in self.tasks.iter().enumerate() {
            check_cost(&mut errors, index, task.cost);
        }
        errors.finish()
    }
}

impl UpdateWorkflow {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors
            .require_id("id_process_category", self.id_process_category)
            .check_optional_id("id_user", self.id_user);
        if matches!(self.name.as_deref(), Some(name) if name.trim().is_empty()) {
            errors.add("name", "El nombre no puede estar vacío");
        }
        for (index, change) in self.tasks.iter().enumerate() {
            match change {
                TaskChange::Create(task) => check_cost(&mut errors, index, task.cost),
                TaskChange::Update(task) => {
                    errors.require_id(&format!("tasks[{}].id_task", index), Some(task.id_task));
                    check_cost(&mut errors, index, task.cost);
                }
                TaskChange::Delete { id_task } => {
                    errors.require_id(&format!("tasks[{}].id_task", index), Some(*id_task));
                }
            }
        }
        errors.finish()
    }
}

/// What a task change list did once committed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskChangeSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Creates dropped for having a blank name
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowDetail {
    #[serde(flatten)]
    pub category: ProcessCategory,
    pub assignee: Option<WorkflowAssignee>,
    pub tasks: Vec<Task>,
}

pub struct WorkflowService {
    pool: PgPool,
}

impl WorkflowService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: &WorkflowFilter) -> Result<Vec<ProcessCategory>, ServiceError> {
        let built = Filter::from_query(filter)?;
        Ok(QueryBuilder::<ProcessCategory>::new(built).select_all(&self.pool).await?)
    }

    pub async fn get(&self, id_process_category: i32) -> Result<WorkflowDetail, ServiceError> {
        let query = format!("{} WHERE pc.id_process_category = $1", PROCESS_CATEGORY_SELECT);
        let category = sqlx::query_as::<_, ProcessCategory>(&query)
            .bind(id_process_category)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Flujo {} no encontrado", id_process_category)))?;

        let assignee = sqlx::query_as::<_, WorkflowAssignee>(
            r#"
            SELECT u.id_user, u.name, u.email
            FROM process_category_user pcu
            JOIN users u ON u.id_user = pcu.id_user
            WHERE pcu.id_process_category = $1
            "#,
        )
        .bind(id_process_category)
        .fetch_optional(&self.pool)
        .await?;

        let query = format!("{} WHERE t.id_process_category = $1 ORDER BY t.position, t.id_task", TASK_SELECT);
        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(id_process_category)
            .fetch_all(&self.pool)
            .await?;

        Ok(WorkflowDetail { category, assignee, tasks })
    }

    pub async fn create(&self, input: &CreateWorkflow) -> Result<(i32, TaskChangeSummary), ServiceError> {
        const MESSAGE: &str = "Error al crear el flujo de trabajo";
        let mut tx = transaction::begin(&self.pool, MESSAGE).await?;
        let result = insert_workflow(&mut tx, input).await;
        let (id, summary) = transaction::finish(tx, result, MESSAGE).await?;
        tracing::info!("Workflow {} created with {:?}", id, summary);
        Ok((id, summary))
    }

    pub async fn update(&self, input: &UpdateWorkflow) -> Result<TaskChangeSummary, ServiceError> {
        const MESSAGE: &str = "Error al actualizar el flujo de trabajo";
        let mut tx = transaction::begin(&self.pool, MESSAGE).await?;
        let result = apply_update(&mut tx, input).await;
        let summary = transaction::finish(tx, result, MESSAGE).await?;
        tracing::info!("Workflow {:?} updated with {:?}", input.id_process_category, summary);
        Ok(summary)
    }
}

async fn insert_workflow(tx: &mut Tx, input: &CreateWorkflow) -> Result<(i32, TaskChangeSummary), ServiceError> {
    let id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO process_categories (id_process, name, description, active)
        VALUES ($1, $2, $3, COALESCE($4, TRUE))
        RETURNING id_process_category
        "#,
    )
    .bind(required(input.id_process, "id_process")?)
    .bind(required(non_blank(input.name.as_deref()), "name")?)
    .bind(input.description.as_deref())
    .bind(input.active)
    .fetch_one(&mut **tx)
    .await?;

    if let Some(id_user) = input.id_user {
        replace_owner(tx, id, id_user).await?;
    }

    let mut summary = TaskChangeSummary::default();
    for task in &input.tasks {
        create_task(tx, id, task, &mut summary).await?;
    }
    Ok((id, summary))
}

async fn apply_update(tx: &mut Tx, input: &UpdateWorkflow) -> Result<TaskChangeSummary, ServiceError> {
    let id = required(input.id_process_category, "id_process_category")?;

    let updated = sqlx::query(
        r#"
        UPDATE process_categories SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            active = COALESCE($4, active)
        WHERE id_process_category = $1
        "#,
    )
    .bind(id)
    .bind(non_blank(input.name.as_deref()))
    .bind(input.description.as_deref())
    .bind(input.active)
    .execute(&mut **tx)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(ServiceError::NotFound(format!("Flujo {} no encontrado", id)));
    }

    if let Some(id_user) = input.id_user {
        replace_owner(tx, id, id_user).await?;
    }

    let mut summary = TaskChangeSummary::default();
    for change in &input.tasks {
        match change {
            TaskChange::Create(task) => create_task(tx, id, task, &mut summary).await?,
            TaskChange::Update(task) => {
                update_task(tx, id, task).await?;
                summary.updated += 1;
            }
            TaskChange::Delete { id_task } => {
                delete_task(tx, id, *id_task).await?;
                summary.deleted += 1;
            }
        }
    }
    Ok(summary)
}

async fn replace_owner(tx: &mut Tx, id_process_category: i32, id_user: i32) -> Result<(), ServiceError> {
    sqlx::query("DELETE FROM process_category_user WHERE id_process_category = $1")
        .bind(id_process_category)
        .execute(&mut **tx)
        .await?;
    sqlx::query("INSERT INTO process_category_user (id_process_category, id_user) VALUES ($1, $2)")
        .bind(id_process_category)
        .bind(id_user)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn replace_task_user(tx: &mut Tx, id_task: i32, id_user: i32) -> Result<(), ServiceError> {
    sqlx::query("DELETE FROM process_category_task_user WHERE id_task = $1")
        .bind(id_task)
        .execute(&mut **tx)
        .await?;
    sqlx::query("INSERT INTO process_category_task_user (id_task, id_user) VALUES ($1, $2)")
        .bind(id_task)
        .bind(id_user)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn create_task(
    tx: &mut Tx,
    id_process_category: i32,
    task: &NewTask,
    summary: &mut TaskChangeSummary,
) -> Result<(), ServiceError> {
    let Some(name) = non_blank(task.name.as_deref()) else {
        summary.skipped += 1;
        return Ok(());
    };

    // Without an explicit position the task goes last. Concurrent creates may share a
    // position; ordering then falls back to id_task.
    let id_task: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO process_category_tasks
            (id_process_category, name, description, active, cost, cost_center, position)
        VALUES (
            $1, $2, $3, COALESCE($4, TRUE), COALESCE($5, 0), $6,
            COALESCE($7, (SELECT COALESCE(MAX(position), 0) + 1
                          FROM process_category_tasks WHERE id_process_category = $1))
        )
        RETURNING id_task
        "#,
    )
    .bind(id_process_category)
    .bind(name)
    .bind(task.description.as_deref())
    .bind(task.active)
    .bind(task.cost)
    .bind(task.cost_center.as_deref())
    .bind(task.position)
    .fetch_one(&mut **tx)
    .await?;

    if let Some(id_user) = task.id_user {
        replace_task_user(tx, id_task, id_user).await?;
    }
    summary.created += 1;
    Ok(())
}

async fn update_task(tx: &mut Tx, id_process_category: i32, task: &TaskUpdate) -> Result<(), ServiceError> {
    let updated = sqlx::query(
        r#"
        UPDATE process_category_tasks SET
            name = COALESCE($3, name),
            description = COALESCE($4, description),
            active = COALESCE($5, active),
            cost = COALESCE($6, cost),
            cost_center = COALESCE($7, cost_center),
            position = COALESCE($8, position)
        WHERE id_task = $1 AND id_process_category = $2
        "#,
    )
    .bind(task.id_task)
    .bind(id_process_category)
    .bind(non_blank(task.name.as_deref()))
    .bind(task.description.as_deref())
    .bind(task.active)
    .bind(task.cost)
    .bind(task.cost_center.as_deref())
    .bind(task.position)
    .execute(&mut **tx)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(task_not_found(task.id_task, id_process_category));
    }

    if let Some(id_user) = task.id_user {
        replace_task_user(tx, task.id_task, id_user).await?;
    }
    Ok(())
}

async fn delete_task(tx: &mut Tx, id_process_category: i32, id_task: i32) -> Result<(), ServiceError> {
    let owned: Option<i32> = sqlx::query_scalar(
        "SELECT id_task FROM process_category_tasks WHERE id_task = $1 AND id_process_category = $2",
    )
    .bind(id_task)
    .bind(id_process_category)
    .fetch_optional(&mut **tx)
    .await?;
    if owned.is_none() {
        return Err(task_not_found(id_task, id_process_category));
    }

    // Assignment row first; it references the task
    sqlx::query("DELETE FROM process_category_task_user WHERE id_task = $1")
        .bind(id_task)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM process_category_tasks WHERE id_task = $1")
        .bind(id_task)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

fn task_not_found(id_task: i32, id_process_category: i32) -> ServiceError {
    ServiceError::NotFound(format!(
        "La tarea {} no pertenece al flujo {}",
        id_task, id_process_category
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_mixed_task_changes() {
        let input: UpdateWorkflow = serde_json::from_value(json!({
            "id_process_category": 9,
            "tasks": [
                { "action": "create", "name": "Aprobar", "cost": "150.50", "id_user": 3 },
                { "action": "update", "id_task": 11, "cost": 20 },
                { "action": "delete", "id_task": 12 }
            ]
        }))
        .unwrap();

        assert_eq!(input.tasks.len(), 3);
        match &input.tasks[0] {
            TaskChange::Create(task) => {
                assert_eq!(task.name.as_deref(), Some("Aprobar"));
                assert_eq!(task.cost, Some(Decimal::new(15050, 2)));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(&input.tasks[1], TaskChange::Update(t) if t.id_task == 11 && t.id_user.is_none()));
        assert!(matches!(input.tasks[2], TaskChange::Delete { id_task: 12 }));
        assert!(input.validate().is_ok());
    }

    #[test]
    fn unknown_action_is_rejected() {
        let parsed = serde_json::from_value::<TaskChange>(json!({ "action": "archive", "id_task": 1 }));
        assert!(parsed.is_err());
    }

    #[test]
    fn delete_requires_task_id() {
        let parsed = serde_json::from_value::<TaskChange>(json!({ "action": "delete" }));
        assert!(parsed.is_err());
    }

    #[test]
    fn negative_cost_is_a_field_error() {
        let input = UpdateWorkflow {
            id_process_category: Some(1),
            tasks: vec![TaskChange::Create(NewTask {
                name: Some("Pago".into()),
                cost: Some(Decimal::new(-5, 0)),
                ..Default::default()
            })],
            ..Default::default()
        };
        let body = input.validate().unwrap_err().to_json();
        assert!(body["field_errors"].get("tasks[0].cost").is_some());
    }

    #[test]
    fn create_requires_process_and_name() {
        let input = CreateWorkflow { name: Some(" ".into()), ..Default::default() };
        let body = input.validate().unwrap_err().to_json();
        assert!(body["field_errors"].get("id_process").is_some());
        assert!(body["field_errors"].get("name").is_some());
    }

    #[test]
    fn blank_create_is_valid_input() {
        let input = UpdateWorkflow {
            id_process_category: Some(1),
            tasks: vec![TaskChange::Create(NewTask { name: Some("".into()), ..Default::default() })],
            ..Default::default()
        };
        assert!(input.validate().is_ok());
    }
}
