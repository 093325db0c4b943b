//! Shared error types for the services crate.

use thiserror::Error;

use paper_core::model::{BankId, NoteError, ReviewError};
use storage::catalog::CatalogError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `PaperService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PaperError {
    #[error("unknown question bank `{0}`")]
    UnknownBank(BankId),
    #[error("Please select at least one topic.")]
    NoTopics,
    #[error("Invalid custom selection format: {0}")]
    InvalidSelection(String),
    #[error("Topic '{0}' not found.")]
    UnknownTopic(String),
    #[error("Group {index} in topic '{topic}' could not be found.")]
    GroupNotFound { topic: String, index: i64 },
    #[error("No questions could be selected. Please check your criteria.")]
    NoQuestionsSelected,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `BrowseService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BrowseError {
    #[error("unknown question bank `{0}`")]
    UnknownBank(BankId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `PracticeService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PracticeError {
    #[error("unknown question bank `{0}`")]
    UnknownBank(BankId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ReviewService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReviewServiceError {
    #[error("unknown question bank `{0}`")]
    UnknownBank(BankId),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `NoteService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NoteServiceError {
    #[error("unknown question bank `{0}`")]
    UnknownBank(BankId),
    #[error(transparent)]
    Note(#[from] NoteError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
