//! Run report: the authoritative record of every success and failure,
//! written once per run into the output folder root.

use crate::models::{Category, FileDescriptor};
use crate::routing::RoutingPolicy;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const REPORT_FILE_NAME: &str = "rapport_traitement.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub date_execution: String,
    pub total_fichiers: usize,
    pub classes: CategoryCounts,
    pub fichiers: Vec<FileOutcome>,
    pub erreurs: Vec<ErrorEntry>,
}

/// One counter per bucket, keyed by wire label. Counts follow the ROUTED
/// bucket, so a low-confidence file increments `A_verifier`, not the
/// category it was guessed into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryCounts {
    #[serde(rename = "Contrats")]
    pub contracts: usize,
    #[serde(rename = "Factures")]
    pub invoices: usize,
    #[serde(rename = "Photos")]
    pub photos: usize,
    #[serde(rename = "Rapports")]
    pub reports: usize,
    #[serde(rename = "Exports_donnees")]
    pub data_exports: usize,
    #[serde(rename = "Documents_identite")]
    pub identity_documents: usize,
    #[serde(rename = "Maintenance")]
    pub maintenance: usize,
    #[serde(rename = "Autre")]
    pub other: usize,
    #[serde(rename = "A_verifier")]
    pub to_verify: usize,
}

impl CategoryCounts {
    pub fn increment(&mut self, bucket: Category) {
        match bucket {
            Category::Contracts => self.contracts += 1,
            Category::Invoices => self.invoices += 1,
            Category::Photos => self.photos += 1,
            Category::Reports => self.reports += 1,
            Category::DataExports => self.data_exports += 1,
            Category::IdentityDocuments => self.identity_documents += 1,
            Category::Maintenance => self.maintenance += 1,
            Category::Other => self.other += 1,
            Category::ToVerify => self.to_verify += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.contracts
            + self.invoices
            + self.photos
            + self.reports
            + self.data_exports
            + self.identity_documents
            + self.maintenance
            + self.other
            + self.to_verify
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    #[serde(rename = "succes")]
    Success,
    #[serde(rename = "echec")]
    Failure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub nom_original: String,
    pub nom_final: String,
    /// The ASSIGNED category label, even for review-routed files.
    pub categorie: Category,
    pub confiance: f32,
    pub statut: RunStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub nom_original: String,
    pub erreur: String,
}

/// Folds the run's descriptors into the report. Per-file entries keep
/// listing order.
pub fn aggregate(descriptors: &[FileDescriptor], routing: &RoutingPolicy) -> RunReport {
    let mut classes = CategoryCounts::default();
    let mut fichiers = Vec::with_capacity(descriptors.len());
    let mut erreurs = Vec::new();

    for desc in descriptors {
        classes.increment(routing.bucket(desc));

        let statut = if desc.error.is_some() {
            RunStatus::Failure
        } else {
            RunStatus::Success
        };
        fichiers.push(FileOutcome {
            nom_original: desc.name.clone(),
            nom_final: desc.final_name.clone(),
            categorie: desc.category.unwrap_or(Category::ToVerify),
            confiance: desc.confidence,
            statut,
        });

        if let Some(erreur) = &desc.error {
            erreurs.push(ErrorEntry {
                nom_original: desc.name.clone(),
                erreur: erreur.clone(),
            });
        }
    }

    RunReport {
        date_execution: chrono::Local::now().to_rfc3339(),
        total_fichiers: descriptors.len(),
        classes,
        fichiers,
        erreurs,
    }
}

pub fn persist(report: &RunReport, output_dir: &Path) -> anyhow::Result<PathBuf> {
    let path = output_dir.join(REPORT_FILE_NAME);
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, json)
        .with_context(|| format!("writing run report to {}", path.display()))?;
    Ok(path)
}
