use std::sync::Arc;

use paper_core::model::{Bank, BankId, Points, QuestionGroup};
use serde::Serialize;
use storage::{BankCache, BankCatalog};

use crate::error::BrowseError;

pub const DEFAULT_SEARCH_PLACEHOLDER: &str = "Search by concept, keyword or tag";
pub const MIN_SEARCH_TERM_CHARS: usize = 2;
pub const MAX_SEARCH_RESULTS: usize = 25;
const SUMMARY_MAX_CHARS: usize = 160;
const SUMMARY_CUT_CHARS: usize = 157;
const NO_SUMMARY: &str = "No question text available.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankListing {
    pub id: BankId,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicSummary {
    pub name: String,
    pub topic_points: Points,
}

/// Landing data of one bank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankSummary {
    pub bank_id: BankId,
    pub label: String,
    pub search_placeholder: String,
    pub search_examples: Vec<String>,
    pub topics: Vec<TopicSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionView {
    pub question: String,
    pub question_id: String,
    pub points: Points,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub answer_images: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupView {
    pub group_id: String,
    pub questions: Vec<QuestionView>,
    pub total_points: Points,
    pub tags: Vec<String>,
    pub tag_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub topic: String,
    pub group_index: usize,
    pub group_title: String,
    pub summary: String,
}

/// Read-only views over the catalog's banks.
#[derive(Clone)]
pub struct BrowseService {
    catalog: Arc<BankCatalog>,
    banks: Arc<BankCache>,
}

impl BrowseService {
    #[must_use]
    pub fn new(catalog: Arc<BankCatalog>, banks: Arc<BankCache>) -> Self {
        Self { catalog, banks }
    }

    /// Catalog banks sorted by label.
    #[must_use]
    pub fn list_banks(&self) -> Vec<BankListing> {
        self.catalog
            .sorted_by_label()
            .into_iter()
            .map(|bank| BankListing {
                id: bank.id.clone(),
                label: bank.label.clone(),
            })
            .collect()
    }

    /// Topics of a bank in document order with their point totals.
    ///
    /// # Errors
    ///
    /// Returns `BrowseError::UnknownBank` for banks outside the catalog and
    /// `BrowseError::Storage` if the bank cannot be loaded.
    pub async fn bank_summary(&self, bank_id: &BankId) -> Result<BankSummary, BrowseError> {
        let descriptor = self
            .catalog
            .get(bank_id)
            .ok_or_else(|| BrowseError::UnknownBank(bank_id.clone()))?;
        let loaded = self.banks.get(bank_id).await?;
        let topics = loaded
            .bank
            .topics()
            .iter()
            .map(|topic| TopicSummary {
                name: topic.name().to_string(),
                topic_points: topic.total_points(),
            })
            .collect();

        Ok(BankSummary {
            bank_id: bank_id.clone(),
            label: descriptor.label.clone(),
            search_placeholder: descriptor
                .search_placeholder
                .clone()
                .unwrap_or_else(|| DEFAULT_SEARCH_PLACEHOLDER.to_string()),
            search_examples: descriptor.search_examples.clone(),
            topics,
        })
    }

    /// # Errors
    ///
    /// Returns `BrowseError` if the bank is unknown or cannot be loaded.
    pub async fn topic_groups(
        &self,
        bank_id: &BankId,
        topic: &str,
    ) -> Result<Vec<GroupView>, BrowseError> {
        self.ensure_known(bank_id)?;
        let loaded = self.banks.get(bank_id).await?;
        Ok(topic_groups(&loaded.bank, topic))
    }

    /// # Errors
    ///
    /// Returns `BrowseError` if the bank is unknown or cannot be loaded.
    pub async fn search(&self, bank_id: &BankId, term: &str) -> Result<Vec<SearchHit>, BrowseError> {
        self.ensure_known(bank_id)?;
        let loaded = self.banks.get(bank_id).await?;
        let hits = search(&loaded.bank, term);
        tracing::debug!(bank = %bank_id, term, hits = hits.len(), "search");
        Ok(hits)
    }

    fn ensure_known(&self, bank_id: &BankId) -> Result<(), BrowseError> {
        if self.catalog.get(bank_id).is_none() {
            return Err(BrowseError::UnknownBank(bank_id.clone()));
        }
        Ok(())
    }
}

fn tag_text(tags: &[String]) -> String {
    if tags.is_empty() {
        String::new()
    } else {
        format!(" - [{}]", tags.join(", "))
    }
}

/// Display form of every group in `topic`. Unknown topics yield no groups.
#[must_use]
pub fn topic_groups(bank: &Bank, topic: &str) -> Vec<GroupView> {
    let Some(topic) = bank.topic(topic) else {
        return Vec::new();
    };

    topic
        .groups()
        .iter()
        .enumerate()
        .map(|(index, group)| {
            let questions = group
                .questions
                .iter()
                .map(|question| {
                    let points = question.points();
                    QuestionView {
                        question: format!(
                            "Q{} ({} points){}",
                            question.id_str(),
                            points,
                            tag_text(&question.tags)
                        ),
                        question_id: question.id_str().to_string(),
                        points,
                        tags: question.tags.clone(),
                        images: question.images.clone(),
                        answer_images: question.answer_images.clone(),
                    }
                })
                .collect();

            GroupView {
                group_id: group.title(index),
                questions,
                total_points: group.total_points(),
                tags: group.tags.clone(),
                tag_text: tag_text(&group.tags),
            }
        })
        .collect()
}

/// Case-insensitive search over group titles, tags and question content.
///
/// Terms shorter than two characters return nothing; at most
/// [`MAX_SEARCH_RESULTS`] hits are returned in bank order.
#[must_use]
pub fn search(bank: &Bank, term: &str) -> Vec<SearchHit> {
    let term = term.trim().to_lowercase();
    if term.chars().count() < MIN_SEARCH_TERM_CHARS {
        return Vec::new();
    }

    bank.topics()
        .iter()
        .flat_map(|topic| {
            topic
                .groups()
                .iter()
                .enumerate()
                .map(move |(index, group)| (topic.name(), index, group))
        })
        .filter_map(|(topic, index, group)| {
            let summary = match_group(group, index, &term)?;
            Some(SearchHit {
                topic: topic.to_string(),
                group_index: index,
                group_title: format!("{} ({} pts)", group.title(index), group.total_points()),
                summary,
            })
        })
        .take(MAX_SEARCH_RESULTS)
        .collect()
}

/// Summary text when `group` matches `term`, otherwise `None`.
fn match_group(group: &QuestionGroup, index: usize, term: &str) -> Option<String> {
    let group_match = group.title(index).to_lowercase().contains(term)
        || group.tags.iter().any(|tag| tag.to_lowercase().contains(term));

    let question_match = group.questions.iter().find(|question| {
        let searchable = [
            question.id_str().to_lowercase(),
            question.question_text.to_lowercase(),
            question.tags.join(" ").to_lowercase(),
        ]
        .join(" ");
        searchable.contains(term)
    });

    if !group_match && question_match.is_none() {
        return None;
    }

    let text = question_match
        .map(|question| question.question_text.as_str())
        .filter(|text| !text.is_empty())
        .or_else(|| group.questions.first().map(|q| q.question_text.as_str()))
        .unwrap_or_default();
    Some(summarize(text))
}

fn summarize(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return NO_SUMMARY.to_string();
    }
    if text.chars().count() <= SUMMARY_MAX_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(SUMMARY_CUT_CHARS).collect();
    format!("{}...", cut.trim_end())
}
