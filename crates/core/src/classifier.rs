//! Fallback semantic classifier: consults the external oracle for files the
//! keyword stage could not resolve.

use crate::models::{Category, Classification, FileDescriptor};
use providers::{LlmProvider, ProviderError};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Taxonomy instruction sent with every consultation. Covers exactly the
/// eight real categories; the review sentinel is not offered to the oracle.
pub const SYSTEM_PROMPT: &str = "\
Tu es un système de classification de fichiers pour une plateforme de mobilité électrique.

Tu dois classer chaque fichier dans exactement une de ces catégories :
- Contrats : contrats de vente, accords partenaires, conventions
- Factures : factures, bons de paiement, reçus
- Photos : images de stations, de motos, de terrain
- Rapports : rapports mensuels, bilans, synthèses
- Exports_donnees : fichiers CSV, exports de transactions, données brutes
- Documents_identite : cartes d'identité, passeports, justificatifs
- Maintenance : rapports de maintenance, fiches techniques, interventions
- Autre : tout ce qui ne correspond à aucune catégorie ci-dessus

Réponds UNIQUEMENT avec un objet JSON valide, sans texte avant ni après :
{\"categorie\": \"...\", \"confiance\": 0.00, \"description_courte\": \"...\"}

La description_courte : minuscules, tirets à la place des espaces, 4 mots max.
Si tu hésites, baisse la confiance plutôt que de deviner.";

const UNREADABLE_CONTENT: &str = "Contenu non lisible";
const FAILURE_DESCRIPTION: &str = "classification-error";

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("malformed oracle reply: {0}")]
    Malformed(String),
    #[error("invalid field in oracle reply: {0}")]
    InvalidField(String),
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    categorie: String,
    confiance: serde_json::Value,
    description_courte: String,
}

pub struct SemanticClassifier {
    provider: Arc<dyn LlmProvider>,
    max_preview_bytes: usize,
}

impl SemanticClassifier {
    pub fn new(provider: Arc<dyn LlmProvider>, max_preview_bytes: usize) -> Self {
        Self {
            provider,
            max_preview_bytes,
        }
    }

    /// Total over its inputs: every descriptor leaves this stage with a
    /// category, a confidence and a description. Any failure along the
    /// request/parse path collapses into the deterministic review outcome
    /// and the failure text lands in the descriptor's error field. A single
    /// attempt is final; there are no retries.
    pub async fn classify(&self, descriptor: &mut FileDescriptor) {
        match self.try_classify(descriptor).await {
            Ok(classification) => {
                debug!(
                    file = %descriptor.name,
                    category = %classification.category,
                    confidence = classification.confidence,
                    "oracle verdict"
                );
                descriptor.record_classification(classification);
            }
            Err(err) => {
                warn!(file = %descriptor.name, error = %err, "oracle consultation failed");
                descriptor.record_classification(Classification {
                    category: Category::ToVerify,
                    confidence: 0.0,
                    description: FAILURE_DESCRIPTION.to_string(),
                });
                descriptor.error = Some(err.to_string());
            }
        }
    }

    async fn try_classify(
        &self,
        descriptor: &FileDescriptor,
    ) -> Result<Classification, ClassifyError> {
        let payload = self.build_payload(descriptor);
        let reply = self.provider.complete(SYSTEM_PROMPT, &payload).await?;
        parse_verdict(&reply)
    }

    fn build_payload(&self, descriptor: &FileDescriptor) -> String {
        let content = read_text_preview(&descriptor.path, self.max_preview_bytes)
            .unwrap_or_else(|| UNREADABLE_CONTENT.to_string());
        format!(
            "Fichier à classifier :\n\
             - Nom original : {}\n\
             - Extension : {}\n\
             - Taille : {} octets\n\
             - Contenu : {}",
            descriptor.name, descriptor.extension, descriptor.size, content
        )
    }
}

/// Reads up to `max_bytes` of UTF-8 text. Binary or unreadable files yield
/// `None`; a read cut mid-sequence at the byte cap keeps the valid prefix.
fn read_text_preview(path: &Path, max_bytes: usize) -> Option<String> {
    use std::io::Read;

    let mut file = std::fs::File::open(path).ok()?;
    let mut buf = vec![0u8; max_bytes];
    let mut filled = 0;
    loop {
        let n = file.read(&mut buf[filled..]).ok()?;
        if n == 0 {
            break;
        }
        filled += n;
        if filled == buf.len() {
            break;
        }
    }
    buf.truncate(filled);

    match String::from_utf8(buf) {
        Ok(text) => Some(text),
        Err(err) => {
            // Only the truncation point may be cut mid-sequence; anything
            // earlier means the content is not text.
            let valid = err.utf8_error().valid_up_to();
            if filled == max_bytes && filled - valid < 4 {
                let mut bytes = err.into_bytes();
                bytes.truncate(valid);
                String::from_utf8(bytes).ok()
            } else {
                None
            }
        }
    }
}

/// Strict parse of the full reply first; on failure, retry on the substring
/// between the first `{` and the last `}`. Both failing is a hard failure.
pub fn parse_verdict(reply: &str) -> Result<Classification, ClassifyError> {
    let raw: RawVerdict = match serde_json::from_str(reply) {
        Ok(raw) => raw,
        Err(_) => {
            let start = reply.find('{');
            let end = reply.rfind('}');
            match (start, end) {
                (Some(start), Some(end)) if start < end => {
                    serde_json::from_str(&reply[start..=end])
                        .map_err(|e| ClassifyError::Malformed(e.to_string()))?
                }
                _ => {
                    return Err(ClassifyError::Malformed(
                        "no JSON object in reply".to_string(),
                    ))
                }
            }
        }
    };

    let category = Category::from_label(&raw.categorie)
        .ok_or_else(|| ClassifyError::InvalidField(format!("categorie: {}", raw.categorie)))?;

    let confidence = coerce_confidence(&raw.confiance)?;

    Ok(Classification {
        category,
        confidence,
        description: raw.description_courte,
    })
}

/// The oracle is untrusted: accept a JSON number or a numeric string, but
/// reject anything outside [0, 1].
fn coerce_confidence(value: &serde_json::Value) -> Result<f32, ClassifyError> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(c) if (0.0..=1.0).contains(&c) => Ok(c as f32),
        _ => Err(ClassifyError::InvalidField(format!("confiance: {}", value))),
    }
}
