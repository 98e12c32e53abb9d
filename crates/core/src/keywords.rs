//! Deterministic first-stage classifier over file names.

use crate::models::{Category, Classification, FileDescriptor};

#[derive(Debug, Clone)]
pub struct KeywordRule {
    pub category: Category,
    pub tokens: Vec<&'static str>,
}

/// Ordered substring rules; the table is immutable once built and the first
/// category with a matching token wins.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<KeywordRule>,
}

impl KeywordClassifier {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        Self { rules }
    }

    pub fn with_default_rules() -> Self {
        Self::new(vec![
            KeywordRule {
                category: Category::IdentityDocuments,
                tokens: vec!["carte_identite", "cni", "identite", "passeport", "permis"],
            },
            KeywordRule {
                category: Category::Maintenance,
                tokens: vec!["maintenance", "batterie"],
            },
            KeywordRule {
                category: Category::DataExports,
                tokens: vec!["export", "transaction"],
            },
            KeywordRule {
                category: Category::Contracts,
                tokens: vec!["contrat", "convention", "accord"],
            },
            KeywordRule {
                category: Category::Invoices,
                tokens: vec!["facture", "paiement", "recu"],
            },
            KeywordRule {
                category: Category::Reports,
                tokens: vec![
                    "rapport",
                    "bilan",
                    "synthese",
                    "analyse",
                    "etude",
                    "compte_rendu",
                ],
            },
            KeywordRule {
                category: Category::Photos,
                tokens: vec!["photo", "image", "img", "screenshot", "capture_ecran"],
            },
            KeywordRule {
                category: Category::Other,
                tokens: vec!["planning", "bon_de_commande"],
            },
        ])
    }

    /// Matches tokens against the lowercased base name. A hit is recorded on
    /// the descriptor with confidence fixed at 1.0 and returned; `None`
    /// means "no decision" and hands the file to the semantic stage. Never
    /// conflate it with a zero-confidence result.
    pub fn classify(&self, descriptor: &mut FileDescriptor) -> Option<Classification> {
        let name = descriptor.name.to_lowercase();
        for rule in &self.rules {
            if rule.tokens.iter().any(|token| name.contains(token)) {
                let classification = Classification {
                    category: rule.category,
                    confidence: 1.0,
                    description: String::new(),
                };
                descriptor.record_classification(classification.clone());
                return Some(classification);
            }
        }
        None
    }
}
