use sqlx::{self, postgres::PgArguments, postgres::PgRow, FromRow, PgPool};

use crate::database::manager::DatabaseError;
use crate::filter::{Filter, FilterValue, SqlResult};

/// Runs a typed list filter and maps rows into `T`
pub struct QueryBuilder<T> {
    sql: SqlResult,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(filter: Filter) -> Self {
        Self {
            sql: filter.to_sql(),
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_all(self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        if crate::config::CONFIG.database.enable_query_logging {
            tracing::debug!(query = %self.sql.query, params = self.sql.params.len(), "list query");
        }
        let mut q = sqlx::query_as::<_, T>(&self.sql.query);
        for p in self.sql.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let rows = q.fetch_all(pool).await?;
        Ok(rows)
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q FilterValue,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        FilterValue::Int(i) => q.bind(*i),
        FilterValue::Text(s) => q.bind(s.as_str()),
        FilterValue::Bool(b) => q.bind(*b),
        FilterValue::Timestamp(t) => q.bind(*t),
        FilterValue::None => q.bind(None::<i32>),
    }
}
