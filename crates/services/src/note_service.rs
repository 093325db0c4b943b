use std::sync::Arc;

use paper_core::model::{BankId, Note};
use paper_core::time::Clock;
use storage::BankCatalog;
use storage::repository::NoteRepository;

use crate::error::NoteServiceError;

/// Collects problem reports about bank content.
#[derive(Clone)]
pub struct NoteService {
    clock: Clock,
    catalog: Arc<BankCatalog>,
    notes: Arc<dyn NoteRepository>,
}

impl NoteService {
    #[must_use]
    pub fn new(clock: Clock, catalog: Arc<BankCatalog>, notes: Arc<dyn NoteRepository>) -> Self {
        Self {
            clock,
            catalog,
            notes,
        }
    }

    /// Store a note stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns `NoteServiceError::Note` for blank text.
    /// Returns `NoteServiceError::Storage` if persistence fails.
    pub async fn submit(&self, bank_id: &BankId, text: &str) -> Result<Note, NoteServiceError> {
        self.ensure_known(bank_id)?;
        let note = Note::new(text, self.clock.now())?;
        let id = self.notes.append_note(bank_id, &note).await?;
        tracing::info!(bank = %bank_id, note_id = id, "note submitted");
        Ok(note)
    }

    /// Notes of a bank, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `NoteServiceError` if the bank is unknown or notes cannot be read.
    pub async fn list(&self, bank_id: &BankId) -> Result<Vec<Note>, NoteServiceError> {
        self.ensure_known(bank_id)?;
        Ok(self.notes.list_notes(bank_id).await?)
    }

    fn ensure_known(&self, bank_id: &BankId) -> Result<(), NoteServiceError> {
        if self.catalog.get(bank_id).is_none() {
            return Err(NoteServiceError::UnknownBank(bank_id.clone()));
        }
        Ok(())
    }
}
