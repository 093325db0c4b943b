use std::path::PathBuf;
use std::sync::Arc;

use paper_core::model::BankId;
use storage::fs::{MissingImage, find_missing_images, resolve_image_path};
use storage::repository::StorageError;
use storage::{BankCache, BankCatalog};

use crate::error::BrowseError;

/// Locates bank images on disk and audits broken references.
#[derive(Clone)]
pub struct ImageService {
    catalog: Arc<BankCatalog>,
    banks: Arc<BankCache>,
}

impl ImageService {
    #[must_use]
    pub fn new(catalog: Arc<BankCatalog>, banks: Arc<BankCache>) -> Self {
        Self { catalog, banks }
    }

    /// File path for an image reference of `bank_id`.
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::UnknownBank` for banks outside the catalog.
    pub fn resolve(&self, bank_id: &BankId, reference: &str) -> Result<Option<PathBuf>, BrowseError> {
        let paths = self
            .catalog
            .paths(bank_id)
            .ok_or_else(|| BrowseError::UnknownBank(bank_id.clone()))?;
        Ok(resolve_image_path(&paths, bank_id, reference))
    }

    /// Missing question and answer images across every catalog bank.
    ///
    /// Banks whose document is absent are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::Storage` if a present bank cannot be read or parsed.
    pub async fn audit(&self) -> Result<Vec<MissingImage>, BrowseError> {
        let mut missing = Vec::new();
        for descriptor in self.catalog.banks() {
            let Some(paths) = self.catalog.paths(&descriptor.id) else {
                continue;
            };
            let loaded = match self.banks.get(&descriptor.id).await {
                Ok(loaded) => loaded,
                Err(StorageError::NotFound) => {
                    tracing::warn!(
                        bank = %descriptor.id,
                        path = %paths.json_path.display(),
                        "bank document missing; skipping image audit"
                    );
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            missing.extend(find_missing_images(&descriptor.id, &paths, &loaded.bank));
        }
        tracing::info!(missing = missing.len(), "image audit finished");
        Ok(missing)
    }
}
