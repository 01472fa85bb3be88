use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditEntry {
    pub id_audit: i64,
    pub id_actor: i32,
    pub actor_name: String,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<i32>,
    pub details: Json<Value>,
    pub created_at: DateTime<Utc>,
}

pub const AUDIT_SELECT: &str = r#"
    SELECT
        a.id_audit, a.id_actor, u.name AS actor_name, a.action, a.entity,
        a.entity_id, a.details, a.created_at
    FROM audit_log a
    JOIN users u ON u.id_user = a.id_actor
"#;
