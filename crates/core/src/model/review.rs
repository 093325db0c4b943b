use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReviewError {
    #[error("Missing entry key.")]
    MissingKey,
}

/// Key of a review entry, chosen by the reviewing client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewKey(String);

impl ReviewKey {
    /// # Errors
    ///
    /// Returns `ReviewError::MissingKey` when the key is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, ReviewError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(ReviewError::MissingKey);
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reviewer's verdict and notes on one group of a bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub topic: String,
    pub group_index: Option<u32>,
    pub group_id: Option<String>,
    pub label: String,
    pub status: Option<String>,
    pub notes: String,
    pub updated_at: DateTime<Utc>,
}

/// Incoming change to a review entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewUpdate {
    pub key: String,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub topic: Option<String>,
    pub group_id: Option<String>,
    pub label: Option<String>,
    pub group_index: Option<u32>,
}

/// What applying a `ReviewUpdate` amounts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewChange {
    Remove(ReviewKey),
    Upsert(ReviewKey, ReviewEntry),
}

impl ReviewUpdate {
    /// Resolves the update into a removal or an upsert stamped with `now`.
    ///
    /// An update with no status and no notes clears the entry.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::MissingKey` when the key is blank.
    pub fn resolve(self, now: DateTime<Utc>) -> Result<ReviewChange, ReviewError> {
        let key = ReviewKey::new(self.key)?;
        let status = self.status;
        let notes = self.notes.unwrap_or_default();

        if status.is_none() && notes.is_empty() {
            return Ok(ReviewChange::Remove(key));
        }

        let group_id = self.group_id.filter(|id| !id.is_empty());
        let label = self
            .label
            .filter(|l| !l.is_empty())
            .or_else(|| group_id.clone())
            .unwrap_or_default();

        Ok(ReviewChange::Upsert(
            key,
            ReviewEntry {
                topic: self.topic.unwrap_or_default(),
                group_index: self.group_index,
                group_id,
                label,
                status,
                notes,
                updated_at: now,
            },
        ))
    }
}
