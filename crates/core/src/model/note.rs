use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NoteError {
    #[error("note cannot be empty")]
    Empty,
}

/// Free-text problem report submitted against a bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    body: String,
    created_at: DateTime<Utc>,
}

impl Note {
    /// # Errors
    ///
    /// Returns `NoteError::Empty` if the body is blank.
    pub fn new(body: impl Into<String>, created_at: DateTime<Utc>) -> Result<Self, NoteError> {
        let body = body.into();
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Err(NoteError::Empty);
        }
        Ok(Self {
            body: trimmed.to_string(),
            created_at,
        })
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
