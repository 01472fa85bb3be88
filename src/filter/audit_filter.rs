use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::filter::ListQuery;
use super::filter_where::FilterWhere;
use super::types::Page;
use crate::database::models::AUDIT_SELECT;

/// Query-string filter for `GET /api/users/audit_log`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditFilter {
    pub id_actor: Option<i32>,
    pub entity: Option<String>,
    pub entity_id: Option<i32>,
    pub action: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const SORTABLE: &[(&str, &str)] = &[("id_audit", "a.id_audit"), ("created_at", "a.created_at")];

impl ListQuery for AuditFilter {
    fn base_select(&self) -> &'static str {
        AUDIT_SELECT
    }

    fn sortable(&self) -> &'static [(&'static str, &'static str)] {
        SORTABLE
    }

    fn default_order(&self) -> &'static str {
        "id_audit desc"
    }

    fn apply(&self, w: &mut FilterWhere) {
        w.eq_opt("a.id_actor", self.id_actor)
            .eq_opt("a.entity", self.entity.clone())
            .eq_opt("a.entity_id", self.entity_id)
            .eq_opt("a.action", self.action.clone())
            .range_opt("a.created_at", self.created_from, self.created_to);
    }

    fn page(&self) -> Page {
        Page {
            order: self.order.clone(),
            limit: self.limit,
            offset: self.offset,
        }
    }
}
