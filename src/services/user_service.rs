//! User administration. Every mutation writes its audit row in the same
//! transaction as the change itself.

use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use super::audit_service::{AuditRecord, AuditService};
use super::transaction::{self, Tx};
use super::{non_blank, required, ServiceError};
use crate::access::Caller;
use crate::database::models::{Company, Role, SubprocessGrant, User};
use crate::error::ApiError;
use crate::validation::FieldErrors;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    pub id_company: Option<i32>,
    pub active: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubprocessAccess {
    pub id_user: Option<i32>,
    pub id_subprocess: Option<i32>,
    pub id_company: Option<i32>,
}

impl SubprocessAccess {
    pub fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::new()
            .require_id("id_user", self.id_user)
            .require_id("id_subprocess", self.id_subprocess)
            .require_id("id_company", self.id_company)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyMembership {
    pub id_user: Option<i32>,
    pub id_company: Option<i32>,
}

impl CompanyMembership {
    pub fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::new()
            .require_id("id_user", self.id_user)
            .require_id("id_company", self.id_company)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleChange {
    pub id_user: Option<i32>,
    pub role: Option<Role>,
}

impl RoleChange {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.require_id("id_user", self.id_user);
        if self.role.is_none() {
            errors.add("role", "Campo requerido");
        }
        errors.finish()
    }
}

const USER_COLUMNS: &str = "u.id_user, u.name, u.email, u.role, u.active, u.created_at";

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: &UserQuery) -> Result<Vec<User>, ServiceError> {
        let sql = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users u
            WHERE ($1::INTEGER IS NULL OR EXISTS (
                    SELECT 1 FROM company_user cu WHERE cu.id_user = u.id_user AND cu.id_company = $1))
              AND ($2::BOOLEAN IS NULL OR u.active = $2)
              AND ($3::TEXT IS NULL OR u.name ILIKE '%' || $3 || '%' OR u.email ILIKE '%' || $3 || '%')
            ORDER BY u.name
            "#
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(query.id_company)
            .bind(query.active)
            .bind(non_blank(query.search.as_deref()))
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn companies_of(&self, id_user: i32) -> Result<Vec<Company>, ServiceError> {
        Ok(sqlx::query_as::<_, Company>(
            r#"
            SELECT co.id_company, co.name, co.sap_company_db
            FROM company_user cu
            JOIN companies co ON co.id_company = cu.id_company
            WHERE cu.id_user = $1
            ORDER BY co.name
            "#,
        )
        .bind(id_user)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn subprocesses(&self, id_user: i32) -> Result<Vec<SubprocessGrant>, ServiceError> {
        Ok(sqlx::query_as::<_, SubprocessGrant>(
            r#"
            SELECT suc.id_subprocess_user_company, sp.id_subprocess, sp.name AS subprocess_name, sp.path,
                   pr.id_process, pr.name AS process_name, co.id_company, co.name AS company_name
            FROM subprocess_user_company suc
            JOIN subprocesses sp ON sp.id_subprocess = suc.id_subprocess
            JOIN processes pr ON pr.id_process = sp.id_process
            JOIN companies co ON co.id_company = suc.id_company
            WHERE suc.id_user = $1
            ORDER BY co.name, pr.name, sp.name
            "#,
        )
        .bind(id_user)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn grant_subprocess(&self, actor: &Caller, input: &SubprocessAccess) -> Result<(), ServiceError> {
        const MESSAGE: &str = "Error al otorgar el subproceso";
        let mut tx = transaction::begin(&self.pool, MESSAGE).await?;
        let result = apply_grant(&mut tx, actor.user_id, input).await;
        transaction::finish(tx, result, MESSAGE).await
    }

    pub async fn revoke_subprocess(&self, actor: &Caller, input: &SubprocessAccess) -> Result<(), ServiceError> {
        const MESSAGE: &str = "Error al revocar el subproceso";
        let mut tx = transaction::begin(&self.pool, MESSAGE).await?;
        let result = apply_revoke(&mut tx, actor.user_id, input).await;
        transaction::finish(tx, result, MESSAGE).await
    }

    pub async fn add_company(&self, actor: &Caller, input: &CompanyMembership) -> Result<(), ServiceError> {
        const MESSAGE: &str = "Error al asignar la compañía";
        let mut tx = transaction::begin(&self.pool, MESSAGE).await?;
        let result = apply_add_company(&mut tx, actor.user_id, input).await;
        transaction::finish(tx, result, MESSAGE).await
    }

    pub async fn remove_company(&self, actor: &Caller, input: &CompanyMembership) -> Result<(), ServiceError> {
        const MESSAGE: &str = "Error al quitar la compañía";
        let mut tx = transaction::begin(&self.pool, MESSAGE).await?;
        let result = apply_remove_company(&mut tx, actor.user_id, input).await;
        transaction::finish(tx, result, MESSAGE).await
    }

    pub async fn set_role(&self, actor: &Caller, input: &RoleChange) -> Result<(), ServiceError> {
        const MESSAGE: &str = "Error al cambiar el rol";
        let id_user = required(input.id_user, "id_user")?;
        if id_user == actor.user_id {
            return Err(ServiceError::Invalid("No puede cambiar su propio rol".to_string()));
        }
        let mut tx = transaction::begin(&self.pool, MESSAGE).await?;
        let result = apply_role(&mut tx, actor.user_id, id_user, input).await;
        transaction::finish(tx, result, MESSAGE).await
    }
}

async fn apply_grant(tx: &mut Tx, id_actor: i32, input: &SubprocessAccess) -> Result<(), ServiceError> {
    let id_user = required(input.id_user, "id_user")?;
    let id_subprocess = required(input.id_subprocess, "id_subprocess")?;
    let id_company = required(input.id_company, "id_company")?;

    let in_company: Option<i32> = sqlx::query_scalar(
        r#"
        SELECT sp.id_subprocess
        FROM subprocesses sp
        JOIN processes pr ON pr.id_process = sp.id_process
        WHERE sp.id_subprocess = $1 AND pr.id_company = $2
        "#,
    )
    .bind(id_subprocess)
    .bind(id_company)
    .fetch_optional(&mut **tx)
    .await?;
    if in_company.is_none() {
        return Err(ServiceError::Invalid("El subproceso no pertenece a la compañía".to_string()));
    }

    let inserted: Option<i32> = sqlx::query_scalar(
        r#"
        INSERT INTO subprocess_user_company (id_subprocess, id_user, id_company)
        VALUES ($1, $2, $3)
        ON CONFLICT (id_subprocess, id_user, id_company) DO NOTHING
        RETURNING id_subprocess_user_company
        "#,
    )
    .bind(id_subprocess)
    .bind(id_user)
    .bind(id_company)
    .fetch_optional(&mut **tx)
    .await?;

    // Re-granting is a no-op and leaves no audit trail
    if inserted.is_some() {
        AuditService::record(
            tx,
            AuditRecord {
                id_actor,
                action: "grant_subprocess",
                entity: "users",
                entity_id: Some(id_user),
                details: json!({ "id_subprocess": id_subprocess, "id_company": id_company }),
            },
        )
        .await?;
    }
    Ok(())
}

async fn apply_revoke(tx: &mut Tx, id_actor: i32, input: &SubprocessAccess) -> Result<(), ServiceError> {
    let id_user = required(input.id_user, "id_user")?;
    let id_subprocess = required(input.id_subprocess, "id_subprocess")?;
    let id_company = required(input.id_company, "id_company")?;

    let removed = sqlx::query(
        "DELETE FROM subprocess_user_company WHERE id_subprocess = $1 AND id_user = $2 AND id_company = $3",
    )
    .bind(id_subprocess)
    .bind(id_user)
    .bind(id_company)
    .execute(&mut **tx)
    .await?;
    if removed.rows_affected() == 0 {
        return Err(ServiceError::NotFound("El usuario no tiene ese subproceso asignado".to_string()));
    }

    AuditService::record(
        tx,
        AuditRecord {
            id_actor,
            action: "revoke_subprocess",
            entity: "users",
            entity_id: Some(id_user),
            details: json!({ "id_subprocess": id_subprocess, "id_company": id_company }),
        },
    )
    .await?;
    Ok(())
}

async fn apply_add_company(tx: &mut Tx, id_actor: i32, input: &CompanyMembership) -> Result<(), ServiceError> {
    let id_user = required(input.id_user, "id_user")?;
    let id_company = required(input.id_company, "id_company")?;

    let inserted: Option<i32> = sqlx::query_scalar(
        r#"
        INSERT INTO company_user (id_user, id_company) VALUES ($1, $2)
        ON CONFLICT (id_user, id_company) DO NOTHING
        RETURNING id_company_user
        "#,
    )
    .bind(id_user)
    .bind(id_company)
    .fetch_optional(&mut **tx)
    .await?;

    if inserted.is_some() {
        AuditService::record(
            tx,
            AuditRecord {
                id_actor,
                action: "add_company",
                entity: "users",
                entity_id: Some(id_user),
                details: json!({ "id_company": id_company }),
            },
        )
        .await?;
    }
    Ok(())
}

async fn apply_remove_company(tx: &mut Tx, id_actor: i32, input: &CompanyMembership) -> Result<(), ServiceError> {
    let id_user = required(input.id_user, "id_user")?;
    let id_company = required(input.id_company, "id_company")?;

    // Subprocess grants in that company go with the membership
    let grants = sqlx::query("DELETE FROM subprocess_user_company WHERE id_user = $1 AND id_company = $2")
        .bind(id_user)
        .bind(id_company)
        .execute(&mut **tx)
        .await?;

    let removed = sqlx::query("DELETE FROM company_user WHERE id_user = $1 AND id_company = $2")
        .bind(id_user)
        .bind(id_company)
        .execute(&mut **tx)
        .await?;
    if removed.rows_affected() == 0 {
        return Err(ServiceError::NotFound("El usuario no pertenece a esa compañía".to_string()));
    }

    AuditService::record(
        tx,
        AuditRecord {
            id_actor,
            action: "remove_company",
            entity: "users",
            entity_id: Some(id_user),
            details: json!({ "id_company": id_company, "revoked_subprocesses": grants.rows_affected() }),
        },
    )
    .await?;
    Ok(())
}

async fn apply_role(tx: &mut Tx, id_actor: i32, id_user: i32, input: &RoleChange) -> Result<(), ServiceError> {
    let role = required(input.role, "role")?;

    let previous: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id_user = $1 FOR UPDATE")
        .bind(id_user)
        .fetch_optional(&mut **tx)
        .await?;
    let previous = previous.ok_or_else(|| ServiceError::NotFound(format!("Usuario {} no encontrado", id_user)))?;

    sqlx::query("UPDATE users SET role = $2 WHERE id_user = $1")
        .bind(id_user)
        .bind(role.as_str())
        .execute(&mut **tx)
        .await?;

    AuditService::record(
        tx,
        AuditRecord {
            id_actor,
            action: "set_role",
            entity: "users",
            entity_id: Some(id_user),
            details: json!({ "from": previous, "to": role.as_str() }),
        },
    )
    .await?;
    tracing::info!("User {} role changed from {} to {} by {}", id_user, previous, role.as_str(), id_actor);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_change_requires_known_role() {
        let parsed = serde_json::from_value::<RoleChange>(json!({ "id_user": 2, "role": "root" }));
        assert!(parsed.is_err());

        let input: RoleChange = serde_json::from_value(json!({ "id_user": 2 })).unwrap();
        assert!(input.validate().unwrap_err().to_json()["field_errors"].get("role").is_some());
    }

    #[test]
    fn subprocess_access_requires_all_ids() {
        let input = SubprocessAccess { id_user: Some(1), ..Default::default() };
        let body = input.validate().unwrap_err().to_json();
        assert!(body["field_errors"].get("id_subprocess").is_some());
        assert!(body["field_errors"].get("id_company").is_some());
    }
}
