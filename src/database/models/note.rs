use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Append-only comment on a case or general request
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id_note: i32,
    pub id_user: i32,
    pub author_name: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
}
