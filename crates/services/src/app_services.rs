use std::sync::Arc;

use storage::fs::FsBankRepository;
use storage::repository::{BankRepository, Storage};
use storage::{BankCache, BankCatalog};

use crate::browse::BrowseService;
use crate::config::AppConfig;
use crate::error::AppServicesError;
use crate::images::ImageService;
use crate::note_service::NoteService;
use crate::papers::PaperService;
use crate::practice::PracticeService;
use crate::review_service::ReviewService;
use crate::Clock;

/// Assembles app-facing services around one catalog and one bank cache.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<BankCatalog>,
    banks: Arc<BankCache>,
    papers: Arc<PaperService>,
    browse: Arc<BrowseService>,
    practice: Arc<PracticeService>,
    reviews: Arc<ReviewService>,
    notes: Arc<NoteService>,
    images: Arc<ImageService>,
}

impl AppServices {
    /// Build services reading banks from `config.data_dir` and keeping
    /// review state and notes in `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the catalog file cannot be loaded or
    /// storage initialization fails.
    pub async fn from_config(config: &AppConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let catalog = match &config.banks_file {
            Some(path) => BankCatalog::from_json_file(&config.data_dir, path).await?,
            None => BankCatalog::builtin(&config.data_dir),
        };
        let catalog = Arc::new(catalog);
        let banks: Arc<dyn BankRepository> = Arc::new(FsBankRepository::new(Arc::clone(&catalog)));
        let storage = Storage::sqlite(banks, &config.database_url()).await?;
        tracing::debug!(
            data_dir = %config.data_dir.display(),
            banks = catalog.banks().len(),
            "services ready"
        );
        Ok(Self::new(catalog, &storage, clock))
    }

    /// Wire services over an existing catalog and storage.
    #[must_use]
    pub fn new(catalog: Arc<BankCatalog>, storage: &Storage, clock: Clock) -> Self {
        let banks = Arc::new(BankCache::new(Arc::clone(&storage.banks)));
        let papers = Arc::new(PaperService::new(Arc::clone(&catalog), Arc::clone(&banks)));
        let browse = Arc::new(BrowseService::new(Arc::clone(&catalog), Arc::clone(&banks)));
        let practice = Arc::new(PracticeService::new(Arc::clone(&catalog), Arc::clone(&banks)));
        let reviews = Arc::new(ReviewService::new(
            clock,
            Arc::clone(&catalog),
            Arc::clone(&banks),
            Arc::clone(&storage.reviews),
        ));
        let notes = Arc::new(NoteService::new(
            clock,
            Arc::clone(&catalog),
            Arc::clone(&storage.notes),
        ));
        let images = Arc::new(ImageService::new(Arc::clone(&catalog), Arc::clone(&banks)));

        Self {
            catalog,
            banks,
            papers,
            browse,
            practice,
            reviews,
            notes,
            images,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<BankCatalog> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn bank_cache(&self) -> Arc<BankCache> {
        Arc::clone(&self.banks)
    }

    #[must_use]
    pub fn papers(&self) -> Arc<PaperService> {
        Arc::clone(&self.papers)
    }

    #[must_use]
    pub fn browse(&self) -> Arc<BrowseService> {
        Arc::clone(&self.browse)
    }

    #[must_use]
    pub fn practice(&self) -> Arc<PracticeService> {
        Arc::clone(&self.practice)
    }

    #[must_use]
    pub fn reviews(&self) -> Arc<ReviewService> {
        Arc::clone(&self.reviews)
    }

    #[must_use]
    pub fn notes(&self) -> Arc<NoteService> {
        Arc::clone(&self.notes)
    }

    #[must_use]
    pub fn images(&self) -> Arc<ImageService> {
        Arc::clone(&self.images)
    }
}
