use serde::Deserialize;

use super::filter::ListQuery;
use super::filter_where::FilterWhere;
use super::types::Page;
use crate::database::models::PROCESS_CATEGORY_SELECT;

/// Query-string filter for `GET /api/workflows/list`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowFilter {
    pub id_company: Option<i32>,
    pub id_process: Option<i32>,
    pub active: Option<bool>,
    pub search: Option<String>,
    pub order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const SORTABLE: &[(&str, &str)] = &[
    ("id_process_category", "pc.id_process_category"),
    ("name", "pc.name"),
    ("process", "pr.name"),
];

impl ListQuery for WorkflowFilter {
    fn base_select(&self) -> &'static str {
        PROCESS_CATEGORY_SELECT
    }

    fn sortable(&self) -> &'static [(&'static str, &'static str)] {
        SORTABLE
    }

    fn default_order(&self) -> &'static str {
        "process asc, name asc"
    }

    fn apply(&self, w: &mut FilterWhere) {
        w.eq_opt("pr.id_company", self.id_company)
            .eq_opt("pc.id_process", self.id_process)
            .eq_opt("pc.active", self.active)
            .contains_opt("pc.name", self.search.as_deref());
    }

    fn page(&self) -> Page {
        Page {
            order: self.order.clone(),
            limit: self.limit,
            offset: self.offset,
        }
    }
}
