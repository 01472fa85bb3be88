use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    SuperUser,
    User,
}

impl Role {
    /// Admins and super users may mutate anything
    pub fn is_privileged(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperUser)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::SuperUser => "super_user",
            Role::User => "user",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Rol desconocido: {0}")]
pub struct UnknownRole(pub String);

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "admin" => Ok(Role::Admin),
            "super_user" => Ok(Role::SuperUser),
            "user" => Ok(Role::User),
            _ => Err(UnknownRole(value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id_user: i32,
    pub name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub id_company: i32,
    pub name: String,
    pub sap_company_db: Option<String>,
}

/// A subprocess the user can see within one company
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubprocessGrant {
    pub id_subprocess_user_company: i32,
    pub id_subprocess: i32,
    pub subprocess_name: String,
    pub path: String,
    pub id_process: i32,
    pub process_name: String,
    pub id_company: i32,
    pub company_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privileged_roles() {
        assert!(Role::Admin.is_privileged());
        assert!(Role::SuperUser.is_privileged());
        assert!(!Role::User.is_privileged());
    }

    #[test]
    fn role_serializes_snake_case() {
        assert_eq!(serde_json::to_value(Role::SuperUser).unwrap(), "super_user");
        let role: Role = serde_json::from_value(serde_json::json!("admin")).unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn role_parses_database_text() {
        assert_eq!(Role::try_from("user".to_string()).unwrap(), Role::User);
        assert!(Role::try_from("root".to_string()).is_err());
    }
}
