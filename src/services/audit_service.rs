use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;

use super::transaction::Tx;
use super::ServiceError;
use crate::database::models::AuditEntry;
use crate::database::QueryBuilder;
use crate::filter::{AuditFilter, Filter};

/// One audit row, written inside the caller's transaction
#[derive(Debug, Clone)]
pub struct AuditRecord<'a> {
    pub id_actor: i32,
    pub action: &'a str,
    pub entity: &'a str,
    pub entity_id: Option<i32>,
    pub details: Value,
}

/// The audit log is append-only: rows are inserted with the change they
/// describe and never updated or deleted.
pub struct AuditService {
    pool: PgPool,
}

impl AuditService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(tx: &mut Tx, record: AuditRecord<'_>) -> Result<i64, ServiceError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO audit_log (id_actor, action, entity, entity_id, details)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id_audit
            "#,
        )
        .bind(record.id_actor)
        .bind(record.action)
        .bind(record.entity)
        .bind(record.entity_id)
        .bind(Json(&record.details))
        .fetch_one(&mut **tx)
        .await?;
        tracing::debug!("Audit {} {} {:?} by {}", record.action, record.entity, record.entity_id, record.id_actor);
        Ok(id)
    }

    pub async fn list(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, ServiceError> {
        let built = Filter::from_query(filter)?;
        Ok(QueryBuilder::<AuditEntry>::new(built).select_all(&self.pool).await?)
    }
}
