use std::collections::HashMap;

use thiserror::Error;

use crate::model::group::{QuestionGroup, Topic};
use crate::model::points::Points;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum BankError {
    #[error("topic name cannot be empty")]
    EmptyTopicName,

    #[error("topic `{0}` appears more than once")]
    DuplicateTopic(String),

    #[error("question {question} in topic `{topic}` has negative points ({points})")]
    NegativePoints {
        topic: String,
        question: String,
        points: Points,
    },
}

//
// ─── BANK ──────────────────────────────────────────────────────────────────────
//

/// Validated, immutable `topic → [group]` hierarchy.
///
/// Topic order follows the source document.
#[derive(Debug, Clone, PartialEq)]
pub struct Bank {
    topics: Vec<Topic>,
    index: HashMap<String, usize>,
}

impl Bank {
    /// Builds a bank from topics in document order.
    ///
    /// # Errors
    ///
    /// Returns `BankError` for empty or duplicated topic names, and for any
    /// question or part with a negative mark value.
    pub fn new(topics: Vec<Topic>) -> Result<Self, BankError> {
        let mut index = HashMap::with_capacity(topics.len());
        for (position, topic) in topics.iter().enumerate() {
            if topic.name().trim().is_empty() {
                return Err(BankError::EmptyTopicName);
            }
            if index.insert(topic.name().to_string(), position).is_some() {
                return Err(BankError::DuplicateTopic(topic.name().to_string()));
            }
            validate_points(topic)?;
        }
        Ok(Self { topics, index })
    }

    #[must_use]
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    #[must_use]
    pub fn topic(&self, name: &str) -> Option<&Topic> {
        self.index.get(name).map(|&position| &self.topics[position])
    }

    #[must_use]
    pub fn contains_topic(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn topic_names(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(Topic::name)
    }

    /// Group at `index` within `topic`, if both exist.
    #[must_use]
    pub fn group(&self, topic: &str, index: usize) -> Option<&QuestionGroup> {
        self.topic(topic).and_then(|t| t.groups().get(index))
    }

    /// Total number of groups across all topics.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.topics.iter().map(|t| t.groups().len()).sum()
    }
}

fn validate_points(topic: &Topic) -> Result<(), BankError> {
    for group in topic.groups() {
        for question in &group.questions {
            let part_points = question.parts.iter().filter_map(|p| p.points);
            let negative = question
                .points
                .into_iter()
                .chain(part_points)
                .find(|p| p.is_negative());
            if let Some(points) = negative {
                return Err(BankError::NegativePoints {
                    topic: topic.name().to_string(),
                    question: question.id_str().to_string(),
                    points,
                });
            }
        }
    }
    Ok(())
}
