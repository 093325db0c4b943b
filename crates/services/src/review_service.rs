use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use paper_core::{
    model::{Bank, BankId, ReviewEntry, ReviewKey, ReviewUpdate},
    time::Clock,
};
use storage::repository::ReviewStateRepository;
use storage::{BankCache, BankCatalog};

use crate::error::ReviewServiceError;
use crate::papers::SelectedQuestion;

//
// ─── NATURAL ORDER ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
enum Chunk {
    Text(String),
    /// Digit run without leading zeros.
    Number(String),
}

impl Ord for Chunk {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Chunk {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort key comparing digit runs numerically and the rest case-insensitively,
/// so `Topic 2` sorts before `Topic 10`.
fn natural_key(value: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut in_digits = false;

    let flush = |current: &mut String, digits: bool, chunks: &mut Vec<Chunk>| {
        if current.is_empty() {
            return;
        }
        let chunk = if digits {
            let trimmed = current.trim_start_matches('0');
            Chunk::Number(if trimmed.is_empty() { "0".into() } else { trimmed.into() })
        } else {
            Chunk::Text(current.to_lowercase())
        };
        chunks.push(chunk);
        current.clear();
    };

    for ch in value.chars() {
        let digit = ch.is_ascii_digit();
        if digit != in_digits {
            flush(&mut current, in_digits, &mut chunks);
            in_digits = digit;
        }
        current.push(ch);
    }
    flush(&mut current, in_digits, &mut chunks);
    chunks
}

//
// ─── VIEWS ─────────────────────────────────────────────────────────────────────
//

/// A group as shown to reviewers, with normalised questions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewGroup {
    pub topic: String,
    pub group_index: usize,
    pub group_id: Option<String>,
    pub tags: Vec<String>,
    pub questions: Vec<SelectedQuestion>,
}

/// Recorded verdicts of one bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewStatus {
    pub bank_id: BankId,
    pub entries: BTreeMap<ReviewKey, ReviewEntry>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Every group of `bank`, ordered by topic in natural order then position.
#[must_use]
pub fn review_groups(bank: &Bank) -> Vec<ReviewGroup> {
    let mut groups: Vec<(Vec<Chunk>, ReviewGroup)> = bank
        .topics()
        .iter()
        .flat_map(|topic| {
            topic.groups().iter().enumerate().map(move |(index, group)| {
                (
                    natural_key(topic.name()),
                    ReviewGroup {
                        topic: topic.name().to_string(),
                        group_index: index,
                        group_id: group.group_id.clone(),
                        tags: group.tags.clone(),
                        questions: group
                            .questions
                            .iter()
                            .map(SelectedQuestion::from_question)
                            .collect(),
                    },
                )
            })
        })
        .collect();
    groups.sort_by(|(a_key, a), (b_key, b)| {
        a_key.cmp(b_key).then_with(|| a.group_index.cmp(&b.group_index))
    });
    groups.into_iter().map(|(_, group)| group).collect()
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Serves review listings and records reviewer verdicts.
#[derive(Clone)]
pub struct ReviewService {
    clock: Clock,
    catalog: Arc<BankCatalog>,
    banks: Arc<BankCache>,
    reviews: Arc<dyn ReviewStateRepository>,
}

impl ReviewService {
    #[must_use]
    pub fn new(
        clock: Clock,
        catalog: Arc<BankCatalog>,
        banks: Arc<BankCache>,
        reviews: Arc<dyn ReviewStateRepository>,
    ) -> Self {
        Self {
            clock,
            catalog,
            banks,
            reviews,
        }
    }

    /// # Errors
    ///
    /// Returns `ReviewServiceError::UnknownBank` for banks outside the catalog.
    /// Returns `ReviewServiceError::Storage` if the bank cannot be loaded.
    pub async fn groups(&self, bank_id: &BankId) -> Result<Vec<ReviewGroup>, ReviewServiceError> {
        self.ensure_known(bank_id)?;
        let loaded = self.banks.get(bank_id).await?;
        Ok(review_groups(&loaded.bank))
    }

    /// # Errors
    ///
    /// Returns `ReviewServiceError` if the bank is unknown or the state
    /// cannot be read.
    pub async fn status(&self, bank_id: &BankId) -> Result<ReviewStatus, ReviewServiceError> {
        self.ensure_known(bank_id)?;
        let state = self.reviews.review_state(bank_id).await?;
        Ok(ReviewStatus {
            bank_id: bank_id.clone(),
            entries: state.entries,
            updated_at: state.updated_at,
        })
    }

    /// Record or clear a verdict and return the bank's resulting state.
    ///
    /// # Errors
    ///
    /// Returns `ReviewServiceError::Review` when the key is missing.
    /// Returns `ReviewServiceError::Storage` if persistence fails.
    pub async fn update(
        &self,
        bank_id: &BankId,
        update: ReviewUpdate,
    ) -> Result<ReviewStatus, ReviewServiceError> {
        self.ensure_known(bank_id)?;
        let now = self.clock.now();
        let change = update.resolve(now)?;
        self.reviews.apply_review_change(bank_id, &change, now).await?;
        tracing::debug!(bank = %bank_id, ?change, "review state updated");
        self.status(bank_id).await
    }

    fn ensure_known(&self, bank_id: &BankId) -> Result<(), ReviewServiceError> {
        if self.catalog.get(bank_id).is_none() {
            return Err(ReviewServiceError::UnknownBank(bank_id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paper_core::model::{Question, QuestionGroup, QuestionId, ReviewError, Topic};
    use paper_core::time::{fixed_clock, fixed_now};
    use storage::fs::FsBankRepository;
    use storage::repository::InMemoryRepository;

    #[test]
    fn natural_key_orders_numbers_numerically() {
        let mut names = vec!["Topic 10", "topic 2", "Topic 1b", "Alpha", "Topic 02a"];
        names.sort_by_key(|name| natural_key(name));
        assert_eq!(names, vec!["Alpha", "Topic 1b", "topic 2", "Topic 02a", "Topic 10"]);
    }

    #[test]
    fn groups_sorted_by_topic_then_index() {
        let group = |id: &str| QuestionGroup {
            group_id: Some(id.into()),
            questions: vec![Question {
                question_id: Some(QuestionId::new(id)),
                ..Question::default()
            }],
            ..QuestionGroup::default()
        };
        let bank = Bank::new(vec![
            Topic::new("Unit 10", vec![group("u10")]),
            Topic::new("Unit 9", vec![group("u9a"), group("u9b")]),
        ])
        .unwrap();

        let groups = review_groups(&bank);
        let order: Vec<_> = groups
            .iter()
            .map(|g| (g.topic.as_str(), g.group_index))
            .collect();
        assert_eq!(order, vec![("Unit 9", 0), ("Unit 9", 1), ("Unit 10", 0)]);
        assert_eq!(groups[0].questions.len(), 1);
    }

    fn service(dir: &std::path::Path) -> ReviewService {
        let catalog = Arc::new(BankCatalog::builtin(dir));
        let banks = Arc::new(BankCache::new(Arc::new(FsBankRepository::new(Arc::clone(
            &catalog,
        )))));
        ReviewService::new(fixed_clock(), catalog, banks, Arc::new(InMemoryRepository::new()))
    }

    #[tokio::test]
    async fn update_upserts_and_removes_entries() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());
        let bank = BankId::new("CSAS").unwrap();

        let status = svc
            .update(
                &bank,
                ReviewUpdate {
                    key: "SQL|0".into(),
                    status: Some("needs-fix".into()),
                    topic: Some("SQL".into()),
                    group_id: Some("G1".into()),
                    group_index: Some(0),
                    ..ReviewUpdate::default()
                },
            )
            .await
            .unwrap();
        let entry = status.entries.values().next().unwrap();
        assert_eq!(entry.label, "G1");
        assert_eq!(entry.updated_at, fixed_now());
        assert_eq!(status.updated_at, Some(fixed_now()));

        let status = svc
            .update(
                &bank,
                ReviewUpdate {
                    key: "SQL|0".into(),
                    ..ReviewUpdate::default()
                },
            )
            .await
            .unwrap();
        assert!(status.entries.is_empty());
    }

    #[tokio::test]
    async fn rejects_missing_key_and_unknown_bank() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path());

        let err = svc
            .update(&BankId::new("CSAS").unwrap(), ReviewUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewServiceError::Review(ReviewError::MissingKey)));

        let err = svc.status(&BankId::new("NOPE").unwrap()).await.unwrap_err();
        assert!(matches!(err, ReviewServiceError::UnknownBank(_)));
    }
}
