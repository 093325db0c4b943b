use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paper_core::model::{Bank, BankId, Note, ReviewChange, ReviewEntry, ReviewKey};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::bank_file::BankLoadError;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(String),

    #[error(transparent)]
    InvalidBank(#[from] BankLoadError),
}

/// Opaque version stamp of a bank's backing data.
///
/// A cache entry stays valid while the repository reports the same revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BankRevision(u128);

impl BankRevision {
    #[must_use]
    pub fn new(value: u128) -> Self {
        Self(value)
    }

    /// Revision derived from a file modification time (nanoseconds since the epoch).
    #[must_use]
    pub fn from_system_time(at: SystemTime) -> Self {
        Self(at.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_nanos()))
    }
}

/// Persisted review entries of one bank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewState {
    pub entries: BTreeMap<ReviewKey, ReviewEntry>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Read access to question banks.
#[async_trait]
pub trait BankRepository: Send + Sync {
    /// Current revision of the bank's backing data.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for unknown banks or missing files.
    async fn revision(&self, id: &BankId) -> Result<BankRevision, StorageError>;

    /// Load and validate a bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for unknown banks, and
    /// `StorageError::InvalidBank` when the document is malformed.
    async fn load_bank(&self, id: &BankId) -> Result<Bank, StorageError>;
}

/// Review verdicts recorded per bank.
#[async_trait]
pub trait ReviewStateRepository: Send + Sync {
    /// Fetch all review entries of a bank. Banks never reviewed yield an empty state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the state cannot be read.
    async fn review_state(&self, bank: &BankId) -> Result<ReviewState, StorageError>;

    /// Apply an upsert or removal and stamp the bank's state with `at`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the change cannot be persisted.
    async fn apply_review_change(
        &self,
        bank: &BankId,
        change: &ReviewChange,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;
}

/// Problem reports submitted against banks.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the note cannot be stored.
    async fn append_note(&self, bank: &BankId, note: &Note) -> Result<i64, StorageError>;

    /// Notes of a bank, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if notes cannot be read.
    async fn list_notes(&self, bank: &BankId) -> Result<Vec<Note>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    banks: Arc<Mutex<HashMap<BankId, (Bank, BankRevision)>>>,
    reviews: Arc<Mutex<HashMap<BankId, ReviewState>>>,
    notes: Arc<Mutex<HashMap<BankId, Vec<Note>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or replace a bank, bumping its revision.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn put_bank(&self, id: BankId, bank: Bank) -> Result<BankRevision, StorageError> {
        let mut guard = self
            .banks
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let next = guard
            .get(&id)
            .map_or(BankRevision::new(1), |(_, rev)| BankRevision::new(rev.0 + 1));
        guard.insert(id, (bank, next));
        Ok(next)
    }
}

#[async_trait]
impl BankRepository for InMemoryRepository {
    async fn revision(&self, id: &BankId) -> Result<BankRevision, StorageError> {
        let guard = self
            .banks
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(id).map(|(_, rev)| *rev).ok_or(StorageError::NotFound)
    }

    async fn load_bank(&self, id: &BankId) -> Result<Bank, StorageError> {
        let guard = self
            .banks
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(id)
            .map(|(bank, _)| bank.clone())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ReviewStateRepository for InMemoryRepository {
    async fn review_state(&self, bank: &BankId) -> Result<ReviewState, StorageError> {
        let guard = self
            .reviews
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(bank).cloned().unwrap_or_default())
    }

    async fn apply_review_change(
        &self,
        bank: &BankId,
        change: &ReviewChange,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .reviews
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let state = guard.entry(bank.clone()).or_default();
        match change {
            ReviewChange::Remove(key) => {
                state.entries.remove(key);
            }
            ReviewChange::Upsert(key, entry) => {
                state.entries.insert(key.clone(), entry.clone());
            }
        }
        state.updated_at = Some(at);
        Ok(())
    }
}

#[async_trait]
impl NoteRepository for InMemoryRepository {
    async fn append_note(&self, bank: &BankId, note: &Note) -> Result<i64, StorageError> {
        let mut guard = self
            .notes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let notes = guard.entry(bank.clone()).or_default();
        notes.push(note.clone());
        i64::try_from(notes.len()).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn list_notes(&self, bank: &BankId) -> Result<Vec<Note>, StorageError> {
        let guard = self
            .notes
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(bank).cloned().unwrap_or_default())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub banks: Arc<dyn BankRepository>,
    pub reviews: Arc<dyn ReviewStateRepository>,
    pub notes: Arc<dyn NoteRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory(repo: InMemoryRepository) -> Self {
        let banks: Arc<dyn BankRepository> = Arc::new(repo.clone());
        let reviews: Arc<dyn ReviewStateRepository> = Arc::new(repo.clone());
        let notes: Arc<dyn NoteRepository> = Arc::new(repo);
        Self {
            banks,
            reviews,
            notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paper_core::model::{ReviewUpdate, Topic};
    use paper_core::time::fixed_now;

    fn bank_id() -> BankId {
        BankId::new("CSAS").unwrap()
    }

    #[tokio::test]
    async fn put_bank_bumps_revision() {
        let repo = InMemoryRepository::new();
        let bank = Bank::new(vec![Topic::new("SQL", vec![])]).unwrap();

        let first = repo.put_bank(bank_id(), bank.clone()).unwrap();
        let second = repo.put_bank(bank_id(), bank).unwrap();

        assert!(second > first);
        assert_eq!(repo.revision(&bank_id()).await.unwrap(), second);
        assert!(matches!(
            repo.load_bank(&BankId::new("PHAS").unwrap()).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn review_changes_upsert_then_remove() {
        let repo = InMemoryRepository::new();
        let update = ReviewUpdate {
            key: "SQL:0".into(),
            status: Some("ok".into()),
            ..ReviewUpdate::default()
        };
        let change = update.resolve(fixed_now()).unwrap();
        repo.apply_review_change(&bank_id(), &change, fixed_now())
            .await
            .unwrap();
        assert_eq!(repo.review_state(&bank_id()).await.unwrap().entries.len(), 1);

        let key = ReviewKey::new("SQL:0").unwrap();
        repo.apply_review_change(&bank_id(), &ReviewChange::Remove(key), fixed_now())
            .await
            .unwrap();
        let state = repo.review_state(&bank_id()).await.unwrap();
        assert!(state.entries.is_empty());
        assert_eq!(state.updated_at, Some(fixed_now()));
    }
}
