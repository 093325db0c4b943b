use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::points::Points;

/// Tag marking questions that fall outside the syllabus a paper targets.
pub const UNRELATED_TAG: &str = "unrelated";

/// Sub-question carrying its own mark value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub points: Option<Points>,
}

/// Atomic gradable unit of a bank.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Question {
    #[serde(default)]
    pub question_id: Option<QuestionId>,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub answer_images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Points>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<Part>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Question {
    /// Mark value of this question.
    ///
    /// An explicit `points` value wins; otherwise the parts are summed (parts
    /// without points count as zero); a question with neither is worth zero.
    #[must_use]
    pub fn points(&self) -> Points {
        if let Some(points) = self.points {
            return points;
        }
        self.parts
            .iter()
            .map(|part| part.points.unwrap_or(Points::ZERO))
            .sum()
    }

    /// True when the question carries the `unrelated` tag in any letter case.
    #[must_use]
    pub fn is_unrelated(&self) -> bool {
        self.tags
            .iter()
            .any(|tag| tag.eq_ignore_ascii_case(UNRELATED_TAG))
    }

    #[must_use]
    pub fn id_str(&self) -> &str {
        self.question_id.as_ref().map_or("", QuestionId::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Question {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn explicit_points_win_over_parts() {
        let q = parse(r#"{"points": 3, "parts": [{"points": 10}]}"#);
        assert_eq!(q.points(), Points::from(3));
    }

    #[test]
    fn parts_are_summed_with_missing_as_zero() {
        let q = parse(r#"{"parts": [{"points": 2}, {}, {"points": 1.5}]}"#);
        assert_eq!(q.points(), Points::new(3.5).unwrap());
    }

    #[test]
    fn question_without_marks_is_zero() {
        assert_eq!(parse("{}").points(), Points::ZERO);
    }

    #[test]
    fn unrelated_tag_is_case_insensitive() {
        let q = parse(r#"{"tags": ["Recursion", "UNRELATED"]}"#);
        assert!(q.is_unrelated());
        let q = parse(r#"{"tags": ["unrelated-ish"]}"#);
        assert!(!q.is_unrelated());
    }
}
