use axum::{
    extract::{Multipart, State},
    Extension,
};
use serde::Deserialize;

use crate::access::{self, Caller};
use crate::error::ApiError;
use crate::integrations::storage::StorageEntity;
use crate::integrations::{StoredFile, Upload};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, QueryParams};
use crate::state::AppState;
use crate::validation::FieldErrors;

#[derive(Debug, Deserialize)]
pub struct FileTarget {
    pub entity: StorageEntity,
    pub id: i32,
}

impl FileTarget {
    fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::new().require_id("id", Some(self.id)).finish()
    }

    async fn authorize(&self, state: &AppState, caller: &Caller) -> Result<(), ApiError> {
        match self.entity {
            StorageEntity::Cases => access::ensure_case_participant(&state.pool, caller, self.id).await?,
            StorageEntity::Requests => access::ensure_request_participant(&state.pool, caller, self.id).await?,
        }
        Ok(())
    }
}

async fn read_uploads(mut multipart: Multipart) -> Result<Vec<Upload>, ApiError> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Formulario inválido: {}", e)))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("No se pudo leer {}: {}", filename, e)))?;
        uploads.push(Upload {
            filename,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Ok(uploads)
}

/// POST /api/files/upload?entity=<cases|requests>&id=<n> - Forward multipart files to storage
pub async fn upload(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    QueryParams(target): QueryParams<FileTarget>,
    multipart: Multipart,
) -> ApiResult<Vec<StoredFile>> {
    target.validate()?;
    let caller = state.caller(&auth).await?;
    target.authorize(&state, &caller).await?;

    let uploads = read_uploads(multipart).await?;
    if uploads.is_empty() {
        FieldErrors::new().add("file", "Debe adjuntar al menos un archivo").finish()?;
    }

    let folder = target.entity.folder(target.id);
    let mut stored = Vec::with_capacity(uploads.len());
    for file in uploads {
        stored.push(state.storage.upload(&folder, file).await?);
    }
    Ok(ApiResponse::created(stored).with_message("Archivos cargados exitosamente"))
}

/// GET /api/files/list?entity=<cases|requests>&id=<n>
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    QueryParams(target): QueryParams<FileTarget>,
) -> ApiResult<Vec<StoredFile>> {
    target.validate()?;
    let caller = state.caller(&auth).await?;
    target.authorize(&state, &caller).await?;

    let files = state.storage.list(&target.entity.folder(target.id)).await?;
    Ok(ApiResponse::success(files))
}
