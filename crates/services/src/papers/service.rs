use std::str::FromStr;
use std::sync::Arc;

use paper_core::model::{Bank, BankId, GroupLookup, Points, Question, QuestionId};
use serde::Serialize;
use storage::{BankCache, BankCatalog};

use super::breakdown::{MarkBreakdownRow, collect_mark_breakdown};
use super::selector::{SelectionRequest, request_rng, select_questions};
use crate::error::PaperError;

pub const DEFAULT_TITLE_NOTES: &str = "Class should be your CS class NOT your AS class — e.g. CS1\n\
                                       Leave mark blank (Teachers use)";

/// How questions are chosen for a paper.
#[derive(Debug, Clone, PartialEq)]
pub enum PaperMode {
    /// Random groups approaching a point total.
    Automatic {
        target_points: Points,
        exclude_unrelated: bool,
        seed: Option<u64>,
    },
    /// Hand-picked groups passed through in the given order.
    Custom { selections: Vec<GroupRef> },
}

/// Reference to a group as `topic|index`, index counted from zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRef {
    pub topic: String,
    pub index: i64,
}

impl FromStr for GroupRef {
    type Err = PaperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('|');
        let (Some(topic), Some(index), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(PaperError::InvalidSelection(s.to_string()));
        };
        let index = index
            .trim()
            .parse::<i64>()
            .map_err(|_| PaperError::InvalidSelection(s.to_string()))?;
        Ok(Self {
            topic: topic.to_string(),
            index,
        })
    }
}

/// Optional cover page fields supplied by the requester.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitlePageRequest {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaperRequest {
    pub topics: Vec<String>,
    pub mode: PaperMode,
    pub title_page: Option<TitlePageRequest>,
}

/// Question record handed to the PDF layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedQuestion {
    pub question_id: Option<QuestionId>,
    pub question_text: String,
    pub images: Vec<String>,
    pub answer_images: Vec<String>,
    pub points: Points,
}

impl SelectedQuestion {
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        Self {
            question_id: question.question_id.clone(),
            question_text: question.question_text.clone(),
            images: question.images.clone(),
            answer_images: question.answer_images.clone(),
            points: question.points(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitlePage {
    pub title: String,
    pub subtitle: String,
    pub date: String,
    pub notes: String,
    pub total_points: Points,
    pub breakdown: Vec<MarkBreakdownRow>,
}

/// A generated paper: questions in order plus the cover page, if requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperSelection {
    pub questions: Vec<SelectedQuestion>,
    pub total_points: Points,
    pub title_page: Option<TitlePage>,
}

/// Builds papers from cached banks.
#[derive(Clone)]
pub struct PaperService {
    catalog: Arc<BankCatalog>,
    banks: Arc<BankCache>,
}

impl PaperService {
    #[must_use]
    pub fn new(catalog: Arc<BankCatalog>, banks: Arc<BankCache>) -> Self {
        Self { catalog, banks }
    }

    /// Generate a paper from `bank_id`.
    ///
    /// # Errors
    ///
    /// Returns `PaperError::UnknownBank` if the catalog does not list the bank,
    /// `PaperError::Storage` if it cannot be loaded, and the validation errors
    /// of [`compose_paper`].
    pub async fn generate(
        &self,
        bank_id: &BankId,
        request: PaperRequest,
    ) -> Result<PaperSelection, PaperError> {
        let descriptor = self
            .catalog
            .get(bank_id)
            .ok_or_else(|| PaperError::UnknownBank(bank_id.clone()))?;
        let loaded = self.banks.get(bank_id).await?;
        let paper = compose_paper(&loaded.bank, &loaded.lookup, &descriptor.label, request)?;
        tracing::info!(
            bank = %bank_id,
            questions = paper.questions.len(),
            total = %paper.total_points,
            "generated paper"
        );
        Ok(paper)
    }
}

/// Assemble a paper from an already loaded bank.
///
/// # Errors
///
/// Returns `PaperError::NoTopics` when none of the requested topics exist,
/// the custom-selection errors for bad group references, and
/// `PaperError::NoQuestionsSelected` when nothing could be selected.
pub fn compose_paper(
    bank: &Bank,
    lookup: &GroupLookup,
    bank_label: &str,
    request: PaperRequest,
) -> Result<PaperSelection, PaperError> {
    let topics: Vec<String> = request
        .topics
        .into_iter()
        .filter(|topic| bank.contains_topic(topic))
        .collect();
    if topics.is_empty() {
        return Err(PaperError::NoTopics);
    }

    let questions: Vec<SelectedQuestion> = match request.mode {
        PaperMode::Automatic {
            target_points,
            exclude_unrelated,
            seed,
        } => {
            let selection_request = SelectionRequest {
                topics,
                target_points,
                exclude_unrelated,
                seed,
            };
            let mut rng = request_rng(seed);
            select_questions(bank, &selection_request, &mut rng)
                .questions
                .into_iter()
                .map(SelectedQuestion::from_question)
                .collect()
        }
        PaperMode::Custom { selections } => custom_questions(bank, &selections)?,
    };

    if questions.is_empty() {
        return Err(PaperError::NoQuestionsSelected);
    }

    let total_points: Points = questions.iter().map(|q| q.points).sum();
    let title_page = request.title_page.map(|page| TitlePage {
        title: non_blank(page.title).unwrap_or_else(|| bank_label.to_string()),
        subtitle: non_blank(page.subtitle).unwrap_or_default(),
        date: non_blank(page.date).unwrap_or_default(),
        notes: non_blank(page.notes).unwrap_or_else(|| DEFAULT_TITLE_NOTES.to_string()),
        total_points,
        breakdown: collect_mark_breakdown(&questions, lookup),
    });

    Ok(PaperSelection {
        questions,
        total_points,
        title_page,
    })
}

fn custom_questions(
    bank: &Bank,
    selections: &[GroupRef],
) -> Result<Vec<SelectedQuestion>, PaperError> {
    let mut questions = Vec::new();
    for selection in selections {
        let topic = bank
            .topic(&selection.topic)
            .ok_or_else(|| PaperError::UnknownTopic(selection.topic.clone()))?;
        let group = usize::try_from(selection.index)
            .ok()
            .and_then(|index| topic.groups().get(index))
            .ok_or_else(|| PaperError::GroupNotFound {
                topic: selection.topic.clone(),
                index: selection.index,
            })?;
        questions.extend(group.questions.iter().map(SelectedQuestion::from_question));
    }
    Ok(questions)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
