use std::collections::HashMap;

use crate::model::bank::Bank;
use crate::model::ids::{GroupKey, QuestionId};

/// Maps each question id back to the group it was authored in.
///
/// Groups without a `group_id` get a synthetic `{topic}_{index}_{n}` key,
/// where `index` is the 1-based position within the topic and `n` counts
/// id-less groups across the whole bank. The first occurrence of a question
/// id wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupLookup {
    keys: HashMap<QuestionId, GroupKey>,
}

impl GroupLookup {
    #[must_use]
    pub fn build(bank: &Bank) -> Self {
        let mut keys = HashMap::new();
        let mut fallback = 0_usize;

        for topic in bank.topics() {
            for (position, group) in topic.groups().iter().enumerate() {
                let key = match group.group_id.as_deref() {
                    Some(id) if !id.is_empty() => GroupKey::new(id),
                    _ => {
                        fallback += 1;
                        GroupKey::new(format!("{}_{}_{fallback}", topic.name(), position + 1))
                    }
                };
                for question in &group.questions {
                    if let Some(id) = &question.question_id {
                        if id.as_str().is_empty() {
                            continue;
                        }
                        keys.entry(id.clone()).or_insert_with(|| key.clone());
                    }
                }
            }
        }

        Self { keys }
    }

    #[must_use]
    pub fn group_of(&self, id: &QuestionId) -> Option<&GroupKey> {
        self.keys.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::group::{QuestionGroup, Topic};
    use crate::model::question::Question;

    fn q(id: &str) -> Question {
        Question {
            question_id: Some(QuestionId::new(id)),
            ..Question::default()
        }
    }

    fn group(id: Option<&str>, questions: Vec<Question>) -> QuestionGroup {
        QuestionGroup {
            group_id: id.map(str::to_string),
            questions,
            ..QuestionGroup::default()
        }
    }

    #[test]
    fn uses_group_id_then_synthetic_keys() {
        let bank = Bank::new(vec![
            Topic::new(
                "Sorting",
                vec![
                    group(Some("G1"), vec![q("1a"), q("1b")]),
                    group(None, vec![q("2a")]),
                ],
            ),
            Topic::new("Graphs", vec![group(None, vec![q("3a")])]),
        ])
        .unwrap();

        let lookup = GroupLookup::build(&bank);
        assert_eq!(lookup.len(), 4);
        assert_eq!(lookup.group_of(&QuestionId::new("1b")), Some(&GroupKey::new("G1")));
        assert_eq!(
            lookup.group_of(&QuestionId::new("2a")),
            Some(&GroupKey::new("Sorting_2_1"))
        );
        assert_eq!(
            lookup.group_of(&QuestionId::new("3a")),
            Some(&GroupKey::new("Graphs_1_2"))
        );
    }

    #[test]
    fn first_occurrence_wins() {
        let bank = Bank::new(vec![Topic::new(
            "T",
            vec![
                group(Some("first"), vec![q("dup")]),
                group(Some("second"), vec![q("dup")]),
            ],
        )])
        .unwrap();

        let lookup = GroupLookup::build(&bank);
        assert_eq!(
            lookup.group_of(&QuestionId::new("dup")),
            Some(&GroupKey::new("first"))
        );
    }
}
