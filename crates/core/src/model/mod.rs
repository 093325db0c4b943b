mod bank;
mod group;
mod ids;
mod lookup;
mod note;
mod points;
mod question;
mod review;

pub use bank::{Bank, BankError};
pub use group::{QuestionGroup, Topic};
pub use ids::{BankId, GroupKey, ParseIdError, QuestionId};
pub use lookup::GroupLookup;
pub use note::{Note, NoteError};
pub use points::{Points, PointsError};
pub use question::{Part, Question, UNRELATED_TAG};
pub use review::{ReviewChange, ReviewEntry, ReviewError, ReviewKey, ReviewUpdate};
