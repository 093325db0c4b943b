use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paper_core::model::{BankId, ReviewChange, ReviewEntry, ReviewKey};
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{ReviewState, ReviewStateRepository, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn map_entry_row(row: &sqlx::sqlite::SqliteRow) -> Result<(ReviewKey, ReviewEntry), StorageError> {
    let key = ReviewKey::new(row.try_get::<String, _>("entry_key").map_err(ser)?).map_err(ser)?;
    let group_index = row
        .try_get::<Option<i64>, _>("group_index")
        .map_err(ser)?
        .map(|v| u32::try_from(v).map_err(|_| ser("group_index out of range")))
        .transpose()?;

    Ok((
        key,
        ReviewEntry {
            topic: row.try_get("topic").map_err(ser)?,
            group_index,
            group_id: row.try_get("group_id").map_err(ser)?,
            label: row.try_get("label").map_err(ser)?,
            status: row.try_get("status").map_err(ser)?,
            notes: row.try_get("notes").map_err(ser)?,
            updated_at: row.try_get("updated_at").map_err(ser)?,
        },
    ))
}

#[async_trait]
impl ReviewStateRepository for SqliteRepository {
    async fn review_state(&self, bank: &BankId) -> Result<ReviewState, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT entry_key, topic, group_index, group_id, label, status, notes, updated_at
                FROM review_entries
                WHERE bank_id = ?1
            ",
        )
        .bind(bank.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let entries = rows.iter().map(map_entry_row).collect::<Result<_, _>>()?;

        let updated_at: Option<DateTime<Utc>> =
            sqlx::query("SELECT updated_at FROM review_banks WHERE bank_id = ?1")
                .bind(bank.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(conn)?
                .map(|row| row.try_get("updated_at"))
                .transpose()
                .map_err(ser)?;

        Ok(ReviewState {
            entries,
            updated_at,
        })
    }

    async fn apply_review_change(
        &self,
        bank: &BankId,
        change: &ReviewChange,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        match change {
            ReviewChange::Remove(key) => {
                sqlx::query("DELETE FROM review_entries WHERE bank_id = ?1 AND entry_key = ?2")
                    .bind(bank.as_str())
                    .bind(key.as_str())
                    .execute(&mut *tx)
                    .await
                    .map_err(conn)?;
            }
            ReviewChange::Upsert(key, entry) => {
                sqlx::query(
                    r"
                        INSERT INTO review_entries (
                            bank_id, entry_key, topic, group_index, group_id,
                            label, status, notes, updated_at
                        )
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                        ON CONFLICT(bank_id, entry_key) DO UPDATE SET
                            topic = excluded.topic,
                            group_index = excluded.group_index,
                            group_id = excluded.group_id,
                            label = excluded.label,
                            status = excluded.status,
                            notes = excluded.notes,
                            updated_at = excluded.updated_at
                    ",
                )
                .bind(bank.as_str())
                .bind(key.as_str())
                .bind(&entry.topic)
                .bind(entry.group_index.map(i64::from))
                .bind(entry.group_id.as_deref())
                .bind(&entry.label)
                .bind(entry.status.as_deref())
                .bind(&entry.notes)
                .bind(entry.updated_at)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
            }
        }

        sqlx::query(
            r"
                INSERT INTO review_banks (bank_id, updated_at)
                VALUES (?1, ?2)
                ON CONFLICT(bank_id) DO UPDATE SET updated_at = excluded.updated_at
            ",
        )
        .bind(bank.as_str())
        .bind(at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
