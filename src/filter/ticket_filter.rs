use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::filter::ListQuery;
use super::filter_where::FilterWhere;
use super::types::Page;
use crate::database::models::CASE_SELECT;

/// Query-string filter for `GET /api/tickets/list`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketFilter {
    pub id_company: Option<i32>,
    pub id_status: Option<i32>,
    pub priority: Option<String>,
    pub case_type: Option<String>,
    pub id_department: Option<i32>,
    pub id_requester: Option<i32>,
    pub id_technical_account: Option<i32>,
    pub id_category: Option<i32>,
    pub id_subcategory: Option<i32>,
    pub search: Option<String>,
    pub open_only: Option<bool>,
    /// `true` for cases without a technical account, `false` for assigned ones
    pub unassigned: Option<bool>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const SORTABLE: &[(&str, &str)] = &[
    ("id_case", "c.id_case"),
    ("created_at", "c.created_at"),
    ("end_date", "c.end_date"),
    ("priority", "c.priority"),
    ("subject", "c.subject"),
    ("status", "s.name"),
];

impl ListQuery for TicketFilter {
    fn base_select(&self) -> &'static str {
        CASE_SELECT
    }

    fn sortable(&self) -> &'static [(&'static str, &'static str)] {
        SORTABLE
    }

    fn default_order(&self) -> &'static str {
        "created_at desc"
    }

    fn apply(&self, w: &mut FilterWhere) {
        w.eq_opt("c.id_company", self.id_company)
            .eq_opt("c.id_status", self.id_status)
            .eq_opt("c.priority", self.priority.clone())
            .eq_opt("c.case_type", self.case_type.clone())
            .eq_opt("c.id_department", self.id_department)
            .eq_opt("c.id_requester", self.id_requester)
            .eq_opt("c.id_technical_account", self.id_technical_account)
            .eq_opt("cc.id_category", self.id_category)
            .eq_opt("cc.id_subcategory", self.id_subcategory)
            .contains_opt("c.subject", self.search.as_deref())
            .range_opt("c.created_at", self.created_from, self.created_to);

        if self.open_only == Some(true) {
            w.eq_opt("s.is_final", Some(false));
        }
        if let Some(unassigned) = self.unassigned {
            w.is_null("c.id_technical_account", unassigned);
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
