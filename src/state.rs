use std::sync::Arc;

use sqlx::PgPool;

use crate::access::{self, Caller};
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::integrations::{self, FileStorage, IntegrationError, Mailer, SapGateway};
use crate::middleware::AuthUser;

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub mailer: Arc<dyn Mailer>,
    pub storage: Arc<dyn FileStorage>,
    pub sap: Arc<dyn SapGateway>,
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Database(#[from] crate::database::DatabaseError),
    #[error(transparent)]
    Integration(#[from] IntegrationError),
}

impl AppState {
    /// Lazy pool plus the outbound clients selected by configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, StateError> {
        let pool = DatabaseManager::connect_lazy(config)?;
        let client = integrations::http_client(&config.integrations)?;
        Ok(Self {
            pool,
            mailer: integrations::mailer::from_config(&config.integrations, &client),
            storage: integrations::storage::from_config(&config.integrations, &client),
            sap: integrations::sap::from_config(&config.integrations)?,
        })
    }

    /// Caller with their current role; inactive users are refused
    pub async fn caller(&self, auth: &AuthUser) -> Result<Caller, ApiError> {
        Ok(access::resolve_caller(&self.pool, auth).await?)
    }
}
