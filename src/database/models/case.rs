use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A help-desk case joined with its status, people, place and classification
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CaseView {
    pub id_case: i32,
    pub subject: String,
    pub description: String,
    pub priority: String,
    pub case_type: String,
    pub id_status: i32,
    pub status_name: String,
    pub is_final: bool,
    pub id_department: Option<i32>,
    pub department_name: Option<String>,
    pub id_requester: i32,
    pub requester_name: String,
    pub requester_email: String,
    pub id_technical_account: Option<i32>,
    pub technical_account_name: Option<String>,
    pub technical_account_email: Option<String>,
    pub id_place: Option<i32>,
    pub place_name: Option<String>,
    pub id_company: i32,
    pub resolution: Option<String>,
    pub id_category: Option<i32>,
    pub category_name: Option<String>,
    pub id_subcategory: Option<i32>,
    pub subcategory_name: Option<String>,
    pub id_activity: Option<i32>,
    pub activity_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

pub const CASE_SELECT: &str = r#"
    SELECT
        c.id_case, c.subject, c.description, c.priority, c.case_type,
        c.id_status, s.name AS status_name, s.is_final,
        c.id_department, d.name AS department_name,
        c.id_requester, rq.name AS requester_name, rq.email AS requester_email,
        c.id_technical_account, ta.name AS technical_account_name, ta.email AS technical_account_email,
        c.id_place, p.name AS place_name,
        c.id_company, c.resolution,
        cc.id_category, cat.name AS category_name,
        cc.id_subcategory, sub.name AS subcategory_name,
        cc.id_activity, act.name AS activity_name,
        c.created_at, c.end_date
    FROM cases c
    JOIN status s ON s.id_status = c.id_status
    JOIN users rq ON rq.id_user = c.id_requester
    LEFT JOIN users ta ON ta.id_user = c.id_technical_account
    LEFT JOIN departments d ON d.id_department = c.id_department
    LEFT JOIN places p ON p.id_place = c.id_place
    LEFT JOIN category_case cc ON cc.id_case = c.id_case
    LEFT JOIN categories cat ON cat.id_category = cc.id_category
    LEFT JOIN subcategories sub ON sub.id_subcategory = cc.id_subcategory
    LEFT JOIN activities act ON act.id_activity = cc.id_activity
"#;
