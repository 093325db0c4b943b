//! Parsing of bank JSON documents.
//!
//! Two shapes are accepted: `{"topics": {"<topic>": [group, ...]}}` and the
//! bare topic map. Topic order is taken from the document.

use paper_core::model::{Bank, BankError, QuestionGroup, Topic};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankLoadError {
    #[error("bank document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bank document must be a JSON object of topics")]
    NotAnObject,

    #[error("topic `{topic}` is malformed: {source}")]
    Topic {
        topic: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Bank(#[from] BankError),
}

/// Parse and validate a bank document.
///
/// # Errors
///
/// Returns `BankLoadError` when the document is not JSON, does not have one of
/// the accepted shapes, has malformed groups, or fails bank validation.
pub fn parse_bank(raw: &str) -> Result<Bank, BankLoadError> {
    let Value::Object(mut document) = serde_json::from_str::<Value>(raw)? else {
        return Err(BankLoadError::NotAnObject);
    };

    let wrapped = matches!(document.get("topics"), Some(Value::Object(_)));
    let topics = if wrapped {
        match document.remove("topics") {
            Some(Value::Object(topics)) => topics,
            _ => Map::new(),
        }
    } else {
        document
    };

    Bank::new(collect_topics(topics)?).map_err(BankLoadError::from)
}

fn collect_topics(topics: Map<String, Value>) -> Result<Vec<Topic>, BankLoadError> {
    topics
        .into_iter()
        .map(|(name, groups)| {
            let groups: Vec<QuestionGroup> = serde_json::from_value(groups)
                .map_err(|source| BankLoadError::Topic {
                    topic: name.clone(),
                    source,
                })?;
            Ok(Topic::new(name, groups))
        })
        .collect()
}
