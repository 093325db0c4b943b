use std::path::PathBuf;

use paper_core::model::{Bank, BankId};
use serde::Serialize;

use crate::catalog::BankPaths;

/// Resolve an image reference from a bank document to a file path.
///
/// References may be relative to the bank directory or to its `images`
/// directory, and may repeat an `images/` or `{bank_id}/` prefix. The first
/// existing candidate wins; otherwise the path under the bank directory is
/// returned. Empty references resolve to `None`.
#[must_use]
pub fn resolve_image_path(paths: &BankPaths, bank_id: &BankId, reference: &str) -> Option<PathBuf> {
    let normalized = reference.trim_start_matches('/');
    if normalized.is_empty() {
        return None;
    }

    let mut candidates = vec![
        paths.base_dir.join(normalized),
        paths.images_dir.join(normalized),
    ];
    if let Some(rest) = normalized.strip_prefix("images/") {
        candidates.push(paths.images_dir.join(rest));
    }
    let bank_prefix = format!("{}/", bank_id.as_str().trim_end_matches('/'));
    if let Some(rest) = normalized.strip_prefix(bank_prefix.as_str()) {
        candidates.push(paths.base_dir.join(rest));
    }

    let fallback = paths.base_dir.join(normalized);
    Some(
        candidates
            .into_iter()
            .find(|candidate| candidate.exists())
            .unwrap_or(fallback),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    Question,
    Answer,
}

/// An image reference that does not resolve to an existing file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingImage {
    pub bank_id: BankId,
    pub question_id: String,
    pub kind: ImageKind,
    pub reference: String,
}

/// Every question and answer image of `bank` that is missing on disk.
#[must_use]
pub fn find_missing_images(bank_id: &BankId, paths: &BankPaths, bank: &Bank) -> Vec<MissingImage> {
    let mut missing = Vec::new();
    for topic in bank.topics() {
        for group in topic.groups() {
            for question in &group.questions {
                let references = question
                    .images
                    .iter()
                    .map(|r| (ImageKind::Question, r))
                    .chain(question.answer_images.iter().map(|r| (ImageKind::Answer, r)));
                for (kind, reference) in references {
                    let exists = resolve_image_path(paths, bank_id, reference)
                        .is_some_and(|path| path.exists());
                    if !exists {
                        let question_id = match question.id_str() {
                            "" => "UNKNOWN".to_string(),
                            id => id.to_string(),
                        };
                        missing.push(MissingImage {
                            bank_id: bank_id.clone(),
                            question_id,
                            kind,
                            reference: reference.clone(),
                        });
                    }
                }
            }
        }
    }
    missing
}
