use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

/// Wrapper for API responses that adds the `{ success: true, ... }` envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub message: Option<String>,
    pub status_code: Option<StatusCode>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            message: None,
            status_code: None,
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self {
            data: Some(data),
            message: None,
            status_code: Some(StatusCode::CREATED),
        }
    }

    /// Attach a user-facing message next to the data
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// Message-only body, e.g. `{ "success": true, "message": "Caso actualizado exitosamente" }`
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            data: None,
            message: Some(message.into()),
            status_code: None,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    fn envelope(&self) -> Result<Value, serde_json::Error> {
        let mut envelope = json!({ "success": true });
        if let Some(message) = &self.message {
            envelope["message"] = json!(message);
        }
        if let Some(data) = &self.data {
            envelope["data"] = serde_json::to_value(data)?;
        }
        Ok(envelope)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        match self.envelope() {
            Ok(envelope) => (status, Json(envelope)).into_response(),
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": "Error al serializar la respuesta"
                    })),
                )
                    .into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_only_envelope() {
        let body = ApiResponse::message("Caso actualizado exitosamente").envelope().unwrap();
        assert_eq!(body, json!({ "success": true, "message": "Caso actualizado exitosamente" }));
    }

    #[test]
    fn data_envelope_with_message() {
        let body = ApiResponse::created(json!({ "id_case": 4 }))
            .with_message("Caso creado exitosamente")
            .envelope()
            .unwrap();
        assert_eq!(body["data"]["id_case"], 4);
        assert_eq!(body["message"], "Caso creado exitosamente");
    }
}
