use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use super::{endpoint, ensure_success, IntegrationError};
use crate::config::IntegrationsConfig;

const SERVICE: &str = "almacenamiento de archivos";

/// A file as reported by the storage API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredFile {
    pub name: String,
    pub folder: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn upload(&self, folder: &str, file: Upload) -> Result<StoredFile, IntegrationError>;

    async fn list(&self, folder: &str) -> Result<Vec<StoredFile>, IntegrationError>;
}

pub struct HttpStorage {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpStorage {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl FileStorage for HttpStorage {
    async fn upload(&self, folder: &str, file: Upload) -> Result<StoredFile, IntegrationError> {
        let size = file.bytes.len();
        let mut part = Part::bytes(file.bytes).file_name(file.filename.clone());
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new().text("folder", folder.to_string()).part("file", part);

        let request = self.authorized(self.client.post(endpoint(&self.base_url, "files")));
        let response = ensure_success(SERVICE, request.multipart(form).send().await?).await?;
        let stored = response.json::<StoredFile>().await.map_err(|e| IntegrationError::InvalidResponse {
            service: SERVICE,
            message: e.to_string(),
        })?;
        tracing::info!("Uploaded {} ({} bytes) to {}", file.filename, size, folder);
        Ok(stored)
    }

    async fn list(&self, folder: &str) -> Result<Vec<StoredFile>, IntegrationError> {
        let request = self
            .authorized(self.client.get(endpoint(&self.base_url, "files")))
            .query(&[("folder", folder)]);
        let response = ensure_success(SERVICE, request.send().await?).await?;
        response.json::<Vec<StoredFile>>().await.map_err(|e| IntegrationError::InvalidResponse {
            service: SERVICE,
            message: e.to_string(),
        })
    }
}

/// Stand-in when no storage API is configured; every call reports that
pub struct DisabledStorage;

#[async_trait]
impl FileStorage for DisabledStorage {
    async fn upload(&self, _folder: &str, _file: Upload) -> Result<StoredFile, IntegrationError> {
        Err(IntegrationError::NotConfigured(SERVICE))
    }

    async fn list(&self, _folder: &str) -> Result<Vec<StoredFile>, IntegrationError> {
        Err(IntegrationError::NotConfigured(SERVICE))
    }
}

pub fn from_config(config: &IntegrationsConfig, client: &reqwest::Client) -> Arc<dyn FileStorage> {
    match &config.storage_api_url {
        Some(url) => Arc::new(HttpStorage::new(client.clone(), url.clone(), config.storage_api_key.clone())),
        None => Arc::new(DisabledStorage),
    }
}

/// Entities files can be attached to; each maps to its own folder tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageEntity {
    Cases,
    Requests,
}

impl StorageEntity {
    pub fn folder(&self, id: i32) -> String {
        let prefix = match self {
            StorageEntity::Cases => "cases",
            StorageEntity::Requests => "requests",
        };
        format!("{}/{}", prefix, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folders_are_entity_scoped() {
        assert_eq!(StorageEntity::Cases.folder(12), "cases/12");
        assert_eq!(StorageEntity::Requests.folder(3), "requests/3");
    }

    #[test]
    fn unknown_entity_is_rejected() {
        let parsed = serde_json::from_value::<StorageEntity>(serde_json::json!("users"));
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn disabled_storage_reports_not_configured() {
        let err = DisabledStorage.list("cases/1").await.unwrap_err();
        assert!(matches!(err, IntegrationError::NotConfigured(_)));
    }
}
