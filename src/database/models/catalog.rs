use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Status {
    pub id_status: i32,
    pub name: String,
    pub is_final: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Department {
    pub id_department: i32,
    pub id_company: Option<i32>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Place {
    pub id_place: i32,
    pub id_company: Option<i32>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id_category: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subcategory {
    pub id_subcategory: i32,
    pub id_category: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id_activity: i32,
    pub id_subcategory: i32,
    pub name: String,
}

/// Seeded `Abierto` status every new case and request starts in
pub const STATUS_OPEN: i32 = 1;
