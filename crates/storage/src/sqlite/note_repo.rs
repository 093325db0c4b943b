use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paper_core::model::{BankId, Note};
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{NoteRepository, StorageError};

#[async_trait]
impl NoteRepository for SqliteRepository {
    async fn append_note(&self, bank: &BankId, note: &Note) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO notes (bank_id, body, created_at)
                VALUES (?1, ?2, ?3)
            ",
        )
        .bind(bank.as_str())
        .bind(note.body())
        .bind(note.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn list_notes(&self, bank: &BankId) -> Result<Vec<Note>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT body, created_at
                FROM notes
                WHERE bank_id = ?1
                ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(bank.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let body: String = row
                    .try_get("body")
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                let created_at: DateTime<Utc> = row
                    .try_get("created_at")
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Note::new(body, created_at).map_err(|e| StorageError::Serialization(e.to_string()))
            })
            .collect()
    }
}
