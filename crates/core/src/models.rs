use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Closed set of classification labels, plus the review sentinel.
///
/// Wire labels double as output folder names and report keys, so they keep
/// the taxonomy's established spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Contrats")]
    Contracts,
    #[serde(rename = "Factures")]
    Invoices,
    #[serde(rename = "Photos")]
    Photos,
    #[serde(rename = "Rapports")]
    Reports,
    #[serde(rename = "Exports_donnees")]
    DataExports,
    #[serde(rename = "Documents_identite")]
    IdentityDocuments,
    #[serde(rename = "Maintenance")]
    Maintenance,
    #[serde(rename = "Autre")]
    Other,
    /// Never assigned by the keyword stage; the semantic stage assigns it
    /// only on hard failure. Also serves as the low-confidence routing
    /// bucket.
    #[serde(rename = "A_verifier")]
    ToVerify,
}

impl Category {
    /// The eight categories a classifier may legitimately assign.
    pub const REAL: [Category; 8] = [
        Category::Contracts,
        Category::Invoices,
        Category::Photos,
        Category::Reports,
        Category::DataExports,
        Category::IdentityDocuments,
        Category::Maintenance,
        Category::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Contracts => "Contrats",
            Category::Invoices => "Factures",
            Category::Photos => "Photos",
            Category::Reports => "Rapports",
            Category::DataExports => "Exports_donnees",
            Category::IdentityDocuments => "Documents_identite",
            Category::Maintenance => "Maintenance",
            Category::Other => "Autre",
            Category::ToVerify => "A_verifier",
        }
    }

    /// Resolves an oracle-supplied label against the real categories only.
    /// The sentinel is not a valid oracle answer.
    pub fn from_label(label: &str) -> Option<Category> {
        Category::REAL.into_iter().find(|c| c.label() == label)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One classifier's verdict: category and confidence always travel together.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: Category,
    pub confidence: f32,
    pub description: String,
}

/// One file moving through the pipeline: immutable identity captured at
/// discovery, classification and outcome state filled in per stage.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    /// Current location; updated to the destination after a successful move.
    pub path: PathBuf,
    pub name: String,
    /// Lowercased, with leading dot, or empty when the name has none.
    pub extension: String,
    pub size: u64,
    pub modified: i64,
    pub category: Option<Category>,
    pub confidence: f32,
    pub description: String,
    pub final_name: String,
    pub error: Option<String>,
}

impl FileDescriptor {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("reading metadata for {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();
        let modified = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            name,
            extension,
            size: meta.len(),
            modified,
            category: None,
            confidence: 0.0,
            description: String::new(),
            final_name: String::new(),
            error: None,
        })
    }

    /// Category and confidence are set together, by exactly one classifier.
    pub fn record_classification(&mut self, classification: Classification) {
        self.category = Some(classification.category);
        self.confidence = classification.confidence;
        self.description = classification.description;
    }

    pub fn is_classified(&self) -> bool {
        self.category.is_some()
    }
}
