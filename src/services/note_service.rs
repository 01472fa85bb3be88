use serde::Deserialize;
use sqlx::PgPool;

use super::{non_blank, required, ServiceError};
use crate::database::models::Note;
use crate::error::ApiError;
use crate::validation::FieldErrors;

/// The entity a note hangs off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteTarget {
    Case(i32),
    Request(i32),
}

impl NoteTarget {
    fn table(&self) -> &'static str {
        match self {
            NoteTarget::Case(_) => "case_notes",
            NoteTarget::Request(_) => "general_request_notes",
        }
    }

    fn parent_column(&self) -> &'static str {
        match self {
            NoteTarget::Case(_) => "id_case",
            NoteTarget::Request(_) => "id_general_request",
        }
    }

    fn id(&self) -> i32 {
        match self {
            NoteTarget::Case(id) | NoteTarget::Request(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewNote {
    pub note: Option<String>,
}

impl NewNote {
    pub fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::new().require_text("note", self.note.as_deref()).finish()
    }
}

/// Append-only notes; there is no edit or delete path
pub struct NoteService {
    pool: PgPool,
}

impl NoteService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, target: NoteTarget) -> Result<Vec<Note>, ServiceError> {
        let query = format!(
            r#"
            SELECT n.id_note, n.id_user, u.name AS author_name, n.note, n.created_at
            FROM {table} n
            JOIN users u ON u.id_user = n.id_user
            WHERE n.{parent} = $1
            ORDER BY n.created_at, n.id_note
            "#,
            table = target.table(),
            parent = target.parent_column(),
        );
        Ok(sqlx::query_as::<_, Note>(&query)
            .bind(target.id())
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn append(&self, target: NoteTarget, id_user: i32, input: &NewNote) -> Result<Note, ServiceError> {
        let text = required(non_blank(input.note.as_deref()), "note")?;
        let query = format!(
            r#"
            WITH inserted AS (
                INSERT INTO {table} ({parent}, id_user, note) VALUES ($1, $2, $3)
                RETURNING id_note, id_user, note, created_at
            )
            SELECT i.id_note, i.id_user, u.name AS author_name, i.note, i.created_at
            FROM inserted i
            JOIN users u ON u.id_user = i.id_user
            "#,
            table = target.table(),
            parent = target.parent_column(),
        );
        let note = sqlx::query_as::<_, Note>(&query)
            .bind(target.id())
            .bind(id_user)
            .bind(text)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ServiceError::from(e).within("Error al guardar la nota"))?;
        tracing::info!("Note {} appended to {:?} by user {}", note.id_note, target, id_user);
        Ok(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_map_to_their_tables() {
        assert_eq!(NoteTarget::Case(1).table(), "case_notes");
        assert_eq!(NoteTarget::Request(1).parent_column(), "id_general_request");
        assert_eq!(NoteTarget::Request(42).id(), 42);
    }

    #[test]
    fn blank_note_is_rejected() {
        let err = NewNote { note: Some("  ".into()) }.validate().unwrap_err();
        assert_eq!(err.to_json()["field_errors"]["note"], "Campo requerido");
    }
}
