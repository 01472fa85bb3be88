use super::types::{FilterOp, FilterValue, FilterWhereInfo};

/// Accumulates predicates and their positional parameters.
/// Columns are `&'static str` so only code-defined identifiers reach the SQL text.
#[derive(Debug, Default)]
pub struct FilterWhere {
    param_values: Vec<FilterValue>,
    param_index: usize,
    conditions: Vec<String>,
}

impl FilterWhere {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, info: FilterWhereInfo) -> &mut Self {
        let sql = self.build_sql_condition(info);
        self.conditions.push(sql);
        self
    }

    /// Add `column = value` when the value is present
    pub fn eq_opt<V: Into<FilterValue>>(&mut self, column: &'static str, value: Option<V>) -> &mut Self {
        if let Some(v) = value {
            self.push(FilterWhereInfo { column, operator: FilterOp::Eq, data: v.into() });
        }
        self
    }

    /// Case-insensitive substring match; blank input is ignored
    pub fn contains_opt(&mut self, column: &'static str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            let pattern = format!("%{}%", escape_like(v));
            self.push(FilterWhereInfo { column, operator: FilterOp::ILike, data: pattern.into() });
        }
        self
    }

    pub fn range_opt<V: Into<FilterValue>>(
        &mut self,
        column: &'static str,
        from: Option<V>,
        to: Option<V>,
    ) -> &mut Self {
        if let Some(v) = from {
            self.push(FilterWhereInfo { column, operator: FilterOp::Gte, data: v.into() });
        }
        if let Some(v) = to {
            self.push(FilterWhereInfo { column, operator: FilterOp::Lte, data: v.into() });
        }
        self
    }

    pub fn is_null(&mut self, column: &'static str, null: bool) -> &mut Self {
        let operator = if null { FilterOp::IsNull } else { FilterOp::IsNotNull };
        self.push(FilterWhereInfo { column, operator, data: FilterValue::None })
    }

    /// `(a = $n OR b = $n ...)` sharing one parameter
    pub fn any_eq<V: Into<FilterValue>>(&mut self, columns: &[&'static str], value: V) -> &mut Self {
        if columns.is_empty() {
            return self;
        }
        let placeholder = self.param(value.into());
        let parts: Vec<String> = columns
            .iter()
            .map(|c| format!("{} = {}", c, placeholder))
            .collect();
        self.conditions.push(format!("({})", parts.join(" OR ")));
        self
    }

    pub fn generate(self) -> (String, Vec<FilterValue>) {
        let where_clause = if self.conditions.is_empty() {
            "1=1".to_string()
        } else {
            self.conditions.join(" AND ")
        };
        (where_clause, self.param_values)
    }

    fn build_sql_condition(&mut self, condition: FilterWhereInfo) -> String {
        let column = condition.column;
        match condition.operator {
            FilterOp::Eq => match condition.data {
                FilterValue::None => format!("{} IS NULL", column),
                data => format!("{} = {}", column, self.param(data)),
            },
            FilterOp::ILike => format!("{} ILIKE {}", column, self.param(condition.data)),
            FilterOp::Gte => format!("{} >= {}", column, self.param(condition.data)),
            FilterOp::Lte => format!("{} <= {}", column, self.param(condition.data)),
            FilterOp::IsNull => format!("{} IS NULL", column),
            FilterOp::IsNotNull => format!("{} IS NOT NULL", column),
        }
    }

    fn param(&mut self, value: FilterValue) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_matches_everything() {
        let (sql, params) = FilterWhere::new().generate();
        assert_eq!(sql, "1=1");
        assert!(params.is_empty());
    }

    #[test]
    fn optional_predicates_are_numbered_in_order() {
        let mut w = FilterWhere::new();
        w.eq_opt("c.id_status", Some(2))
            .eq_opt::<i32>("c.id_department", None)
            .contains_opt("c.subject", Some(" impresora "));
        let (sql, params) = w.generate();
        assert_eq!(sql, "c.id_status = $1 AND c.subject ILIKE $2");
        assert_eq!(params, vec![FilterValue::Int(2), FilterValue::Text("%impresora%".to_string())]);
    }

    #[test]
    fn any_eq_shares_one_parameter() {
        let mut w = FilterWhere::new();
        w.eq_opt("c.id_company", Some(3))
            .any_eq(&["c.id_requester", "c.id_technical_account"], 9);
        let (sql, params) = w.generate();
        assert_eq!(sql, "c.id_company = $1 AND (c.id_requester = $2 OR c.id_technical_account = $2)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn like_wildcards_are_escaped() {
        let mut w = FilterWhere::new();
        w.contains_opt("c.subject", Some("100%_x"));
        let (_, params) = w.generate();
        assert_eq!(params, vec![FilterValue::Text("%100\\%\\_x%".to_string())]);
    }
}
