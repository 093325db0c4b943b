use serde::{Deserialize, Serialize};

use crate::model::points::Points;
use crate::model::question::Question;

/// Ordered cluster of questions selected or rejected as a unit, typically
/// one exam question with its lettered parts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuestionGroup {
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl QuestionGroup {
    #[must_use]
    pub fn total_points(&self) -> Points {
        self.questions.iter().map(Question::points).sum()
    }

    /// The group's id, or `Group {n}` using its 1-based position in the topic.
    #[must_use]
    pub fn title(&self, index: usize) -> String {
        match self.group_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("Group {}", index + 1),
        }
    }
}

/// Named partition of a bank.
#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    name: String,
    groups: Vec<QuestionGroup>,
}

impl Topic {
    #[must_use]
    pub fn new(name: impl Into<String>, groups: Vec<QuestionGroup>) -> Self {
        Self {
            name: name.into(),
            groups,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn groups(&self) -> &[QuestionGroup] {
        &self.groups
    }

    /// Sum of the points of every question in the topic.
    #[must_use]
    pub fn total_points(&self) -> Points {
        self.groups.iter().map(QuestionGroup::total_points).sum()
    }
}
