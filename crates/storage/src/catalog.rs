use std::collections::HashSet;
use std::path::{Path, PathBuf};

use paper_core::model::BankId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("cannot read bank catalog {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("bank catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bank `{0}` is listed more than once")]
    DuplicateBank(BankId),

    #[error("bank `{bank}` has an invalid JSON file name: {file}")]
    InvalidFileName { bank: BankId, file: String },
}

/// Static description of a question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDescriptor {
    pub id: BankId,
    pub label: String,
    /// File name of the bank document inside the bank directory.
    pub json: String,
    #[serde(default)]
    pub search_placeholder: Option<String>,
    #[serde(default)]
    pub search_examples: Vec<String>,
}

/// On-disk locations of one bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankPaths {
    pub base_dir: PathBuf,
    pub json_path: PathBuf,
    pub images_dir: PathBuf,
}

/// Registry of the banks served from a data directory.
#[derive(Debug, Clone)]
pub struct BankCatalog {
    root: PathBuf,
    banks: Vec<BankDescriptor>,
}

const BUILTIN: &[(&str, &str, &str, &str, &[&str])] = &[
    (
        "CSA2",
        "Computer Science A2",
        "A2Questions.json",
        "Search A2 CS topics — e.g. recursion, enumerated, floating point",
        &["recursion", "enumerated", "floating point", "binary search"],
    ),
    (
        "CSAS",
        "Computer Science AS",
        "ASQuestions.json",
        "Look up AS topics like - SQL, Logic Gate, 2D array",
        &["Logic Gate", "SQL", "Router", "2D array"],
    ),
    (
        "CSIG",
        "Computer Science IGCSE",
        "IGTheory.json",
        "Look up IGCSE concepts — e.g. lossy, sensors, flowchart",
        &["lossy compression", "sensor", "flowchart", "binary"],
    ),
    (
        "PHAS",
        "Physics AS",
        "ASPhysicsQB.json",
        "Search AS Physics — e.g. SHM, resistivity, acceleration",
        &["SHM", "resistivity", "acceleration", "electromagnetic"],
    ),
    (
        "PHIG",
        "Physics IGCSE",
        "IGPQ.json",
        "Try GCSE ideas — e.g. momentum, refraction, graph",
        &["momentum", "refraction", "graph", "radiation"],
    ),
    (
        "PHA2",
        "Physics A2",
        "A2Questions.json",
        "Search A2 Physics — e.g. capacitors, nuclei, simple harmonic",
        &["capacitor", "radioactive decay", "SHM", "magnetic flux"],
    ),
];

impl BankCatalog {
    /// Build a catalog rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` for duplicated bank ids or JSON file names that
    /// are not plain file names.
    pub fn new(root: impl Into<PathBuf>, banks: Vec<BankDescriptor>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(banks.len());
        for bank in &banks {
            if !seen.insert(bank.id.clone()) {
                return Err(CatalogError::DuplicateBank(bank.id.clone()));
            }
            let plain = Path::new(&bank.json)
                .file_name()
                .is_some_and(|name| name == bank.json.as_str());
            if !plain {
                return Err(CatalogError::InvalidFileName {
                    bank: bank.id.clone(),
                    file: bank.json.clone(),
                });
            }
        }
        Ok(Self {
            root: root.into(),
            banks,
        })
    }

    /// The computer-science and physics banks shipped with the application.
    #[must_use]
    pub fn builtin(root: impl Into<PathBuf>) -> Self {
        let banks = BUILTIN
            .iter()
            .filter_map(|(id, label, json, placeholder, examples)| {
                Some(BankDescriptor {
                    id: BankId::new(*id).ok()?,
                    label: (*label).to_string(),
                    json: (*json).to_string(),
                    search_placeholder: Some((*placeholder).to_string()),
                    search_examples: examples.iter().map(|s| (*s).to_string()).collect(),
                })
            })
            .collect();
        Self {
            root: root.into(),
            banks,
        }
    }

    /// Load bank descriptors from a JSON array file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the file cannot be read or parsed, or if the
    /// descriptors are invalid.
    pub async fn from_json_file(
        root: impl Into<PathBuf>,
        path: &Path,
    ) -> Result<Self, CatalogError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| CatalogError::Io {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        let banks: Vec<BankDescriptor> = serde_json::from_str(&raw)?;
        Self::new(root, banks)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn banks(&self) -> &[BankDescriptor] {
        &self.banks
    }

    #[must_use]
    pub fn get(&self, id: &BankId) -> Option<&BankDescriptor> {
        self.banks.iter().find(|bank| &bank.id == id)
    }

    /// The first bank in catalog order, used when no bank is named.
    #[must_use]
    pub fn default_bank(&self) -> Option<&BankDescriptor> {
        self.banks.first()
    }

    /// Descriptors sorted by label, for bank pickers.
    #[must_use]
    pub fn sorted_by_label(&self) -> Vec<&BankDescriptor> {
        let mut banks: Vec<_> = self.banks.iter().collect();
        banks.sort_by(|a, b| a.label.cmp(&b.label));
        banks
    }

    #[must_use]
    pub fn paths(&self, id: &BankId) -> Option<BankPaths> {
        let bank = self.get(id)?;
        let base_dir = self.root.join(bank.id.as_str());
        Some(BankPaths {
            json_path: base_dir.join(&bank.json),
            images_dir: base_dir.join("images"),
            base_dir,
        })
    }
}
