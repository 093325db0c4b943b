use std::collections::HashSet;
use std::sync::Arc;

use paper_core::model::{Bank, BankId, Points};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use storage::{BankCache, BankCatalog};

use crate::error::PracticeError;
use crate::papers::request_rng;

pub const DEFAULT_PRACTICE_COUNT: usize = 10;

/// One flash-card style practice item built from a whole group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PracticeItem {
    pub id: String,
    pub group_id: Option<String>,
    pub question_ids: Vec<String>,
    pub topic: String,
    pub question_images: Vec<String>,
    pub answer_images: Vec<String>,
    pub points: Points,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PracticeRequest {
    pub topic: Option<String>,
    pub count: Option<usize>,
    pub seed: Option<u64>,
}

#[derive(Clone)]
pub struct PracticeService {
    catalog: Arc<BankCatalog>,
    banks: Arc<BankCache>,
}

impl PracticeService {
    #[must_use]
    pub fn new(catalog: Arc<BankCatalog>, banks: Arc<BankCache>) -> Self {
        Self { catalog, banks }
    }

    /// Draw a shuffled set of practice items.
    ///
    /// # Errors
    ///
    /// Returns `PracticeError::UnknownBank` for banks outside the catalog and
    /// `PracticeError::Storage` if the bank cannot be loaded.
    pub async fn draw(
        &self,
        bank_id: &BankId,
        request: &PracticeRequest,
    ) -> Result<Vec<PracticeItem>, PracticeError> {
        if self.catalog.get(bank_id).is_none() {
            return Err(PracticeError::UnknownBank(bank_id.clone()));
        }
        let loaded = self.banks.get(bank_id).await?;
        let mut rng = request_rng(request.seed);
        let items = draw_items(
            &loaded.bank,
            request.topic.as_deref(),
            request.count.unwrap_or(DEFAULT_PRACTICE_COUNT),
            &mut rng,
        );
        Ok(items)
    }
}

/// Append the non-empty entries of `items` not already in `target`.
fn extend_unique(target: &mut Vec<String>, seen: &mut HashSet<String>, items: &[String]) {
    for item in items {
        if !item.is_empty() && seen.insert(item.clone()) {
            target.push(item.clone());
        }
    }
}

/// Every group with at least one image, optionally limited to `topic`.
#[must_use]
pub fn practice_pool(bank: &Bank, topic: Option<&str>) -> Vec<PracticeItem> {
    let mut pool = Vec::new();
    for current in bank.topics() {
        if topic.is_some_and(|wanted| wanted != current.name()) {
            continue;
        }
        for group in current.groups() {
            if group.questions.is_empty() {
                continue;
            }

            let mut question_ids = Vec::new();
            let mut question_images = Vec::new();
            let mut answer_images = Vec::new();
            let mut seen_questions = HashSet::new();
            let mut seen_answers = HashSet::new();
            for question in &group.questions {
                if !question.id_str().is_empty() {
                    question_ids.push(question.id_str().to_string());
                }
                extend_unique(&mut question_images, &mut seen_questions, &question.images);
                extend_unique(&mut answer_images, &mut seen_answers, &question.answer_images);
            }
            if question_images.is_empty() && answer_images.is_empty() {
                continue;
            }

            let group_id = group.group_id.clone().filter(|id| !id.is_empty());
            let id = group_id
                .clone()
                .or_else(|| question_ids.first().cloned())
                .unwrap_or_else(|| format!("{}_group_{}", current.name(), pool.len() + 1));

            pool.push(PracticeItem {
                id,
                group_id,
                question_ids,
                topic: current.name().to_string(),
                question_images,
                answer_images,
                points: group.total_points(),
            });
        }
    }
    pool
}

/// Shuffle the practice pool and keep the first `count` items.
pub fn draw_items<R: Rng + ?Sized>(
    bank: &Bank,
    topic: Option<&str>,
    count: usize,
    rng: &mut R,
) -> Vec<PracticeItem> {
    let mut pool = practice_pool(bank, topic);
    pool.shuffle(rng);
    pool.truncate(count);
    pool
}
