use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A general request joined with its routing (process → category) and people
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GeneralRequestView {
    pub id_general_request: i32,
    pub subject: String,
    pub description: String,
    pub id_company: i32,
    pub company_name: String,
    pub id_process: i32,
    pub process_name: String,
    pub id_process_category: i32,
    pub process_category_name: String,
    pub id_requester: i32,
    pub requester_name: String,
    pub requester_email: String,
    pub id_assigned_user: Option<i32>,
    pub assigned_user_name: Option<String>,
    pub assigned_user_email: Option<String>,
    pub id_status: i32,
    pub status_name: String,
    pub is_final: bool,
    pub created_at: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

// The effective assignee falls back to the process category owner.
pub const REQUEST_SELECT: &str = r#"
    SELECT
        gr.id_general_request, gr.subject, gr.description,
        gr.id_company, co.name AS company_name,
        pr.id_process, pr.name AS process_name,
        gr.id_process_category, pc.name AS process_category_name,
        gr.id_requester, rq.name AS requester_name, rq.email AS requester_email,
        COALESCE(gr.id_assigned_user, pcu.id_user) AS id_assigned_user,
        au.name AS assigned_user_name, au.email AS assigned_user_email,
        gr.id_status, s.name AS status_name, s.is_final,
        gr.created_at, gr.end_date
    FROM general_requests gr
    JOIN companies co ON co.id_company = gr.id_company
    JOIN process_categories pc ON pc.id_process_category = gr.id_process_category
    JOIN processes pr ON pr.id_process = pc.id_process
    JOIN users rq ON rq.id_user = gr.id_requester
    JOIN status s ON s.id_status = gr.id_status
    LEFT JOIN process_category_user pcu ON pcu.id_process_category = pc.id_process_category
    LEFT JOIN users au ON au.id_user = COALESCE(gr.id_assigned_user, pcu.id_user)
"#;
