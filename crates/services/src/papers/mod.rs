//! Paper assembly: point-constrained selection, custom picks and the title page.

mod breakdown;
mod selector;
mod service;

pub use breakdown::{MarkBreakdownRow, collect_mark_breakdown};
pub use selector::{Selection, SelectionRequest, max_fitting_prefix, request_rng, select_questions};
pub use service::{
    DEFAULT_TITLE_NOTES, GroupRef, PaperMode, PaperRequest, PaperSelection, PaperService,
    SelectedQuestion, TitlePage, TitlePageRequest, compose_paper,
};
