//! Begin/commit/rollback for multi-table writes.
//!
//! Services open a transaction with [`begin`], run their statements against
//! `&mut *tx`, and hand the outcome to [`finish`], which commits on success and
//! rolls back explicitly on any error.

use sqlx::{PgPool, Postgres, Transaction};

use super::ServiceError;

pub type Tx = Transaction<'static, Postgres>;

pub async fn begin(pool: &PgPool, message: &str) -> Result<Tx, ServiceError> {
    pool.begin()
        .await
        .map_err(|e| ServiceError::from(e).within(message))
}

pub async fn finish<T>(tx: Tx, result: Result<T, ServiceError>, message: &str) -> Result<T, ServiceError> {
    match result {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| ServiceError::from(e).within(message))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Rollback failed after '{}': {}", message, rollback_err);
            }
            match &err {
                ServiceError::Sqlx(_) | ServiceError::Database(_) => {
                    tracing::error!("{}: {}", message, err);
                }
                _ => tracing::debug!("{}: {}", message, err),
            }
            Err(err.within(message))
        }
    }
}
