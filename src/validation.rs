//! Required-field checks run by handlers before any database work.

use std::collections::HashMap;

use crate::error::ApiError;

const REQUIRED: &str = "Campo requerido";

/// Collects missing or malformed request fields and turns them into a single 400.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids must be present and positive
    pub fn require_id(&mut self, field: &str, value: Option<i32>) -> &mut Self {
        match value {
            Some(v) if v > 0 => {}
            Some(_) => {
                self.errors.insert(field.to_string(), "Identificador inválido".to_string());
            }
            None => {
                self.errors.insert(field.to_string(), REQUIRED.to_string());
            }
        }
        self
    }

    /// Text must be present and not blank
    pub fn require_text(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if value.map(|v| v.trim().is_empty()).unwrap_or(true) {
            self.errors.insert(field.to_string(), REQUIRED.to_string());
        }
        self
    }

    /// Optional ids, when given, must be positive
    pub fn check_optional_id(&mut self, field: &str, value: Option<i32>) -> &mut Self {
        if matches!(value, Some(v) if v <= 0) {
            self.errors.insert(field.to_string(), "Identificador inválido".to_string());
        }
        self
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.insert(field.to_string(), message.into());
        self
    }

    pub fn finish(&mut self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        Err(ApiError::validation_error(
            "Faltan campos requeridos o son inválidos",
            Some(std::mem::take(&mut self.errors)),
        ))
    }
}
