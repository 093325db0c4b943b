use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use paper_core::model::{Bank, BankId, GroupLookup};

use crate::repository::{BankRepository, BankRevision, StorageError};

/// A bank together with its derived question → group index.
#[derive(Debug, Clone)]
pub struct LoadedBank {
    pub bank: Arc<Bank>,
    pub lookup: Arc<GroupLookup>,
    pub revision: BankRevision,
}

/// Process-lifetime cache of parsed banks.
///
/// Entries are reloaded when the repository reports a different revision
/// (for files: a new modification time) and can be evicted explicitly. The
/// map lock is never held across an `.await`.
pub struct BankCache {
    repo: Arc<dyn BankRepository>,
    entries: Mutex<HashMap<BankId, LoadedBank>>,
}

impl BankCache {
    #[must_use]
    pub fn new(repo: Arc<dyn BankRepository>) -> Self {
        Self {
            repo,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a bank, loading or reloading it when the cached copy is stale.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the revision cannot be read or the bank
    /// cannot be loaded.
    pub async fn get(&self, id: &BankId) -> Result<LoadedBank, StorageError> {
        let revision = self.repo.revision(id).await?;

        if let Some(hit) = self.cached(id)? {
            if hit.revision == revision {
                tracing::trace!(bank = %id, "bank cache hit");
                return Ok(hit);
            }
            tracing::debug!(bank = %id, "bank changed on disk; reloading");
        }

        let bank = Arc::new(self.repo.load_bank(id).await?);
        let loaded = LoadedBank {
            lookup: Arc::new(GroupLookup::build(&bank)),
            bank,
            revision,
        };

        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(id.clone(), loaded.clone());
        Ok(loaded)
    }

    /// Drop a cached bank. Returns whether an entry was present.
    pub fn evict(&self, id: &BankId) -> bool {
        self.entries
            .lock()
            .is_ok_and(|mut guard| guard.remove(id).is_some())
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.clear();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |guard| guard.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, id: &BankId) -> Result<Option<LoadedBank>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(id).cloned())
    }
}
