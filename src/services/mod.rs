pub mod audit_service;
pub mod catalog_service;
pub mod note_service;
pub mod request_service;
pub mod ticket_service;
pub mod transaction;
pub mod user_service;
pub mod workflow_service;

pub use audit_service::AuditService;
pub use catalog_service::CatalogService;
pub use note_service::{NoteService, NoteTarget};
pub use request_service::RequestService;
pub use ticket_service::TicketService;
pub use user_service::UserService;
pub use workflow_service::WorkflowService;

use crate::database::manager::DatabaseError;
use crate::filter::error::FilterError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Invalid(String),
    /// A unit of work failed; `message` is user-facing, `details` is the driver error
    #[error("{message}: {details}")]
    Failed { message: String, details: String },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Filter(#[from] FilterError),
}

impl ServiceError {
    /// Attach the operation's user-facing message to raw database failures.
    /// Domain errors (not found, forbidden, invalid) pass through unchanged.
    pub fn within(self, message: &str) -> Self {
        match self {
            ServiceError::Sqlx(e) => ServiceError::Failed {
                message: message.to_string(),
                details: e.to_string(),
            },
            ServiceError::Database(e) => ServiceError::Failed {
                message: message.to_string(),
                details: e.to_string(),
            },
            other => other,
        }
    }
}

/// Unwrap a field the handler has already validated as present
pub(crate) fn required<T>(value: Option<T>, field: &str) -> Result<T, ServiceError> {
    value.ok_or_else(|| ServiceError::Invalid(format!("Campo requerido: {}", field)))
}

/// Blank strings count as absent
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_wraps_driver_errors_only() {
        let wrapped = ServiceError::Sqlx(sqlx::Error::RowNotFound).within("Error al actualizar el caso");
        match wrapped {
            ServiceError::Failed { message, details } => {
                assert_eq!(message, "Error al actualizar el caso");
                assert!(!details.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }

        let kept = ServiceError::Forbidden("No autorizado".into()).within("Error al actualizar el caso");
        assert!(matches!(kept, ServiceError::Forbidden(_)));
    }

    #[test]
    fn required_reports_missing_field() {
        assert_eq!(required(Some(3), "id_case").unwrap(), 3);
        match required::<i32>(None, "id_case") {
            Err(ServiceError::Invalid(msg)) => assert!(msg.contains("id_case")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn blank_text_is_absent() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some(" nota ")), Some("nota"));
        assert_eq!(non_blank(None), None);
    }
}
