use std::io::ErrorKind;
use std::sync::Arc;

use async_trait::async_trait;
use paper_core::model::{Bank, BankId};

use crate::bank_file::parse_bank;
use crate::catalog::{BankCatalog, BankPaths};
use crate::repository::{BankRepository, BankRevision, StorageError};

mod images;

pub use images::{ImageKind, MissingImage, find_missing_images, resolve_image_path};

/// Reads bank documents from the catalog's data directory.
#[derive(Clone)]
pub struct FsBankRepository {
    catalog: Arc<BankCatalog>,
}

impl FsBankRepository {
    #[must_use]
    pub fn new(catalog: Arc<BankCatalog>) -> Self {
        Self { catalog }
    }

    fn paths(&self, id: &BankId) -> Result<BankPaths, StorageError> {
        self.catalog.paths(id).ok_or(StorageError::NotFound)
    }
}

fn io_error(err: &std::io::Error) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound
    } else {
        StorageError::Io(err.to_string())
    }
}

#[async_trait]
impl BankRepository for FsBankRepository {
    async fn revision(&self, id: &BankId) -> Result<BankRevision, StorageError> {
        let paths = self.paths(id)?;
        let meta = tokio::fs::metadata(&paths.json_path)
            .await
            .map_err(|e| io_error(&e))?;
        let modified = meta.modified().map_err(|e| io_error(&e))?;
        Ok(BankRevision::from_system_time(modified))
    }

    async fn load_bank(&self, id: &BankId) -> Result<Bank, StorageError> {
        let paths = self.paths(id)?;
        let raw = tokio::fs::read_to_string(&paths.json_path)
            .await
            .map_err(|e| io_error(&e))?;
        let bank = parse_bank(&raw)?;
        tracing::debug!(
            bank = %id,
            topics = bank.topics().len(),
            groups = bank.group_count(),
            "loaded bank document"
        );
        Ok(bank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_bank_from_catalog_path() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(BankCatalog::builtin(dir.path()));
        let id = BankId::new("CSAS").unwrap();
        let paths = catalog.paths(&id).unwrap();
        std::fs::create_dir_all(&paths.base_dir).unwrap();
        std::fs::write(
            &paths.json_path,
            r#"{"topics": {"SQL": [{"questions": [{"question_id": "1", "points": 3}]}]}}"#,
        )
        .unwrap();

        let repo = FsBankRepository::new(catalog);
        let bank = repo.load_bank(&id).await.unwrap();
        assert!(bank.contains_topic("SQL"));
        assert!(repo.revision(&id).await.is_ok());
    }

    #[tokio::test]
    async fn missing_file_and_unknown_bank_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FsBankRepository::new(Arc::new(BankCatalog::builtin(dir.path())));

        let missing = repo.load_bank(&BankId::new("CSAS").unwrap()).await;
        assert!(matches!(missing, Err(StorageError::NotFound)));
        let unknown = repo.revision(&BankId::new("XX").unwrap()).await;
        assert!(matches!(unknown, Err(StorageError::NotFound)));
    }
}
