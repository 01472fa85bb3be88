//! Outbound clients: email notifications, file storage and the SAP service layer.

pub mod mailer;
pub mod notify;
pub mod sap;
pub mod storage;

use std::time::Duration;

use crate::config::IntegrationsConfig;

pub use mailer::{Attachment, EmailMessage, HttpMailer, Mailer, NoopMailer};
pub use sap::{PurchaseRequestInput, SapCompanies, SapCompany, SapGateway, ServiceLayerClient};
pub use storage::{DisabledStorage, FileStorage, HttpStorage, StoredFile, Upload};

#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    #[error("{0} no configurado")]
    NotConfigured(&'static str),
    #[error("Compañía SAP desconocida: {0}")]
    UnknownCompany(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{service} respondió {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("Respuesta inválida de {service}: {message}")]
    InvalidResponse { service: &'static str, message: String },
    #[error("No se pudo leer {path}: {message}")]
    Config { path: String, message: String },
}

/// Shared client for all outbound calls, bounded by the configured timeout
pub fn http_client(config: &IntegrationsConfig) -> Result<reqwest::Client, IntegrationError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .user_agent(concat!("servicios-compartidos-api/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Pass successful responses through; turn anything else into `Status`
pub(crate) async fn ensure_success(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, IntegrationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(IntegrationError::Status {
        service,
        status: status.as_u16(),
        body,
    })
}

/// Join a base URL and a path without doubling slashes
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
