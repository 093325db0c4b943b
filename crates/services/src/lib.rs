#![forbid(unsafe_code)]

pub mod app_services;
pub mod browse;
pub mod config;
pub mod error;
pub mod images;
pub mod note_service;
pub mod papers;
pub mod practice;
pub mod review_service;

pub use paper_core::Clock;

pub use app_services::AppServices;
pub use browse::{BankListing, BankSummary, BrowseService, GroupView, SearchHit};
pub use config::AppConfig;
pub use error::{
    AppServicesError, BrowseError, NoteServiceError, PaperError, PracticeError, ReviewServiceError,
};
pub use images::ImageService;
pub use note_service::NoteService;
pub use papers::{PaperMode, PaperRequest, PaperSelection, PaperService, TitlePageRequest};
pub use practice::{PracticeItem, PracticeRequest, PracticeService};
pub use review_service::{ReviewGroup, ReviewService, ReviewStatus};
