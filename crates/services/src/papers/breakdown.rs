use std::collections::HashMap;

use paper_core::model::{GroupKey, GroupLookup, Points};
use serde::Serialize;

use super::service::SelectedQuestion;

/// One row of the title-page marks table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkBreakdownRow {
    pub label: String,
    pub total: Points,
}

/// Total marks per originating group, labelled `Q 1`, `Q 2`, … in the order
/// groups first appear in the paper.
///
/// Questions the lookup does not know each get a row of their own.
#[must_use]
pub fn collect_mark_breakdown(
    questions: &[SelectedQuestion],
    lookup: &GroupLookup,
) -> Vec<MarkBreakdownRow> {
    let mut rows: Vec<MarkBreakdownRow> = Vec::new();
    let mut row_of: HashMap<GroupKey, usize> = HashMap::new();
    let mut fallback = 0;

    for question in questions {
        let key = question
            .question_id
            .as_ref()
            .and_then(|id| lookup.group_of(id))
            .cloned()
            .unwrap_or_else(|| {
                fallback += 1;
                GroupKey::new(format!("auto_{fallback}"))
            });

        let index = *row_of.entry(key).or_insert_with(|| {
            rows.push(MarkBreakdownRow {
                label: format!("Q {}", rows.len() + 1),
                total: Points::ZERO,
            });
            rows.len() - 1
        });
        rows[index].total += question.points;
    }

    rows
}
