use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Parse `"created_at desc, priority"` against a whitelist of
    /// `(public name, SQL column)` pairs.
    pub fn validate_and_parse(
        order: &str,
        allowed: &[(&str, &'static str)],
    ) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let mut out = Vec::new();
        for part in order.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut it = trimmed.split_whitespace();
            let Some(name) = it.next() else { continue };

            let column = allowed
                .iter()
                .find(|(public, _)| public.eq_ignore_ascii_case(name))
                .map(|(_, column)| *column)
                .ok_or_else(|| FilterError::InvalidColumn(name.to_string()))?;

            let sort = match it.next() {
                None => SortDirection::Asc,
                Some(dir) if dir.eq_ignore_ascii_case("asc") => SortDirection::Asc,
                Some(dir) if dir.eq_ignore_ascii_case("desc") => SortDirection::Desc,
                Some(dir) => return Err(FilterError::InvalidDirection(dir.to_string())),
            };
            out.push(FilterOrderInfo { column, sort });
        }
        Ok(out)
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("{} {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &[(&str, &str)] = &[("created_at", "c.created_at"), ("priority", "c.priority")];

    #[test]
    fn parses_multiple_columns() {
        let infos = FilterOrder::validate_and_parse("created_at desc, priority", ALLOWED).unwrap();
        assert_eq!(FilterOrder::generate(&infos), "ORDER BY c.created_at DESC, c.priority ASC");
    }

    #[test]
    fn rejects_unknown_column() {
        let err = FilterOrder::validate_and_parse("password desc", ALLOWED).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn(c) if c == "password"));
    }

    #[test]
    fn rejects_bad_direction() {
        assert!(FilterOrder::validate_and_parse("priority sideways", ALLOWED).is_err());
    }
}
