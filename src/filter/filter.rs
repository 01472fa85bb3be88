use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterOrderInfo, Page, SqlResult};

/// Implemented by the typed list filters; pushes their predicates.
pub trait ListQuery {
    /// Base `SELECT ... FROM ... JOIN ...` without WHERE
    fn base_select(&self) -> &'static str;

    /// Public sort names and the columns they map to
    fn sortable(&self) -> &'static [(&'static str, &'static str)];

    fn default_order(&self) -> &'static str;

    fn apply(&self, filter_where: &mut FilterWhere);

    fn page(&self) -> Page;
}

pub struct Filter {
    base_select: &'static str,
    filter_where: FilterWhere,
    order_data: Vec<FilterOrderInfo>,
    limit: i64,
    offset: i64,
}

impl Filter {
    pub fn from_query(query: &impl ListQuery) -> Result<Self, FilterError> {
        let mut filter_where = FilterWhere::new();
        query.apply(&mut filter_where);

        let page = query.page();
        let order = page.order.as_deref().unwrap_or(query.default_order());
        let order_data = FilterOrder::validate_and_parse(order, query.sortable())?;

        let mut filter = Self {
            base_select: query.base_select(),
            filter_where,
            order_data,
            limit: 0,
            offset: 0,
        };
        filter.limit(page.limit, page.offset)?;
        Ok(filter)
    }

    /// Extra predicate beyond what the typed filter carries (e.g. visibility)
    pub fn restrict(&mut self, f: impl FnOnce(&mut FilterWhere)) -> &mut Self {
        f(&mut self.filter_where);
        self
    }

    fn limit(&mut self, limit: Option<i64>, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        let filter_config = &crate::config::CONFIG.filter;
        let limit = limit.unwrap_or(filter_config.default_limit);
        if limit < 0 {
            return Err(FilterError::InvalidLimit("El límite debe ser no negativo".to_string()));
        }
        let offset = offset.unwrap_or(0);
        if offset < 0 {
            return Err(FilterError::InvalidOffset("El desplazamiento debe ser no negativo".to_string()));
        }

        let max_limit = filter_config.max_limit.unwrap_or(i64::MAX);
        self.limit = if limit > max_limit {
            if filter_config.debug_logging {
                tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max_limit);
            }
            max_limit
        } else {
            limit
        };
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(self) -> SqlResult {
        let order_clause = FilterOrder::generate(&self.order_data);
        let (where_clause, params) = self.filter_where.generate();

        let query = [
            self.base_select.to_string(),
            format!("WHERE {}", where_clause),
            order_clause,
            format!("LIMIT {} OFFSET {}", self.limit, self.offset),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params }
    }
}
