use thiserror::Error;

use crate::model::{BankError, NoteError, ParseIdError, PointsError, ReviewError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Points(#[from] PointsError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Note(#[from] NoteError),
    #[error(transparent)]
    Id(#[from] ParseIdError),
}
