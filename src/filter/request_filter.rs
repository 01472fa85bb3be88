use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::filter::ListQuery;
use super::filter_where::FilterWhere;
use super::types::Page;
use crate::database::models::REQUEST_SELECT;

/// Effective assignee: explicit user, else the process category owner
pub const EFFECTIVE_ASSIGNEE: &str = "COALESCE(gr.id_assigned_user, pcu.id_user)";

/// Query-string filter for `GET /api/requests/list`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestFilter {
    pub id_company: Option<i32>,
    pub id_process: Option<i32>,
    pub id_process_category: Option<i32>,
    pub id_status: Option<i32>,
    pub id_requester: Option<i32>,
    pub id_assigned_user: Option<i32>,
    pub search: Option<String>,
    pub open_only: Option<bool>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const SORTABLE: &[(&str, &str)] = &[
    ("id_general_request", "gr.id_general_request"),
    ("created_at", "gr.created_at"),
    ("end_date", "gr.end_date"),
    ("subject", "gr.subject"),
    ("status", "s.name"),
    ("process", "pr.name"),
];

impl ListQuery for RequestFilter {
    fn base_select(&self) -> &'static str {
        REQUEST_SELECT
    }

    fn sortable(&self) -> &'static [(&'static str, &'static str)] {
        SORTABLE
    }

    fn default_order(&self) -> &'static str {
        "created_at desc"
    }

    fn apply(&self, w: &mut FilterWhere) {
        w.eq_opt("gr.id_company", self.id_company)
            .eq_opt("pr.id_process", self.id_process)
            .eq_opt("gr.id_process_category", self.id_process_category)
            .eq_opt("gr.id_status", self.id_status)
            .eq_opt("gr.id_requester", self.id_requester)
            .eq_opt(EFFECTIVE_ASSIGNEE, self.id_assigned_user)
            .contains_opt("gr.subject", self.search.as_deref())
            .range_opt("gr.created_at", self.created_from, self.created_to);

        if self.open_only == Some(true) {
            w.eq_opt("s.is_final", Some(false));
        }
    }

    fn page(&self) -> Page {
        Page {
            order: self.order.clone(),
            limit: self.limit,
            offset: self.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Filter;

    #[test]
    fn assignee_filter_uses_effective_assignee() {
        let filter = RequestFilter { id_assigned_user: Some(3), order: Some("process asc".into()), ..Default::default() };
        let sql = Filter::from_query(&filter).unwrap().to_sql();
        assert!(sql.query.contains("COALESCE(gr.id_assigned_user, pcu.id_user) = $1"));
        assert!(sql.query.contains("ORDER BY pr.name ASC"));
    }
}
