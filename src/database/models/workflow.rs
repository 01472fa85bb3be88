use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProcessCategory {
    pub id_process_category: i32,
    pub id_process: i32,
    pub process_name: String,
    pub id_company: i32,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
}

/// Owner of a process category
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkflowAssignee {
    pub id_user: i32,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id_task: i32,
    pub id_process_category: i32,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub cost: Decimal,
    pub cost_center: Option<String>,
    pub position: i32,
    pub id_user: Option<i32>,
    pub user_name: Option<String>,
}

pub const PROCESS_CATEGORY_SELECT: &str = r#"
    SELECT
        pc.id_process_category, pc.id_process, pr.name AS process_name, pr.id_company,
        pc.name, pc.description, pc.active
    FROM process_categories pc
    JOIN processes pr ON pr.id_process = pc.id_process
"#;

pub const TASK_SELECT: &str = r#"
    SELECT
        t.id_task, t.id_process_category, t.name, t.description, t.active,
        t.cost, t.cost_center, t.position, tu.id_user, u.name AS user_name
    FROM process_category_tasks t
    LEFT JOIN process_category_task_user tu ON tu.id_task = t.id_task
    LEFT JOIN users u ON u.id_user = tu.id_user
"#;
