//! Run orchestration: discover, classify, rename, move, report.

use crate::classifier::SemanticClassifier;
use crate::config::AppConfig;
use crate::keywords::KeywordClassifier;
use crate::models::Category;
use crate::report;
use crate::routing::{RenamePolicy, RoutingPolicy};
use crate::scanner;
use anyhow::Context;
use providers::anthropic::{AnthropicConfig, AnthropicProvider};
use providers::noop::NoopProvider;
use providers::ProviderRegistry;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct PipelineSummary {
    pub discovered: usize,
    pub processed: usize,
    pub review: usize,
    pub errors: usize,
}

/// Processes the drop folder end to end, strictly sequentially: one file is
/// fully classified, renamed and moved before the next begins. Discovery
/// failures abort the run; everything after discovery is absorbed per file.
pub async fn run(config: &AppConfig, registry: &ProviderRegistry) -> anyhow::Result<PipelineSummary> {
    let input = PathBuf::from(&config.ingest.input_dir);
    let output = PathBuf::from(&config.ingest.output_dir);

    info!("Starting run on {}", input.display());
    let mut descriptors = scanner::discover(&input)?;
    info!("Discovered {} files.", descriptors.len());

    let mut summary = PipelineSummary {
        discovered: descriptors.len(),
        ..Default::default()
    };
    if descriptors.is_empty() {
        info!("Nothing to process.");
        return Ok(summary);
    }

    let provider = match registry.llm(None) {
        Ok(provider) => provider,
        Err(err) => {
            warn!("Preferred oracle provider unavailable ({err}), falling back to noop.");
            registry.llm(Some("noop"))?
        }
    };

    let keyword = KeywordClassifier::with_default_rules();
    let semantic = SemanticClassifier::new(provider, config.oracle.max_preview_bytes);
    let routing = RoutingPolicy::new(config.classification.threshold);
    let rename = RenamePolicy::for_today();

    for desc in &mut descriptors {
        info!("Processing {}", desc.name);

        // Keyword stage first; the oracle is consulted only on no-decision.
        if keyword.classify(desc).is_none() {
            semantic.classify(desc).await;
        }

        desc.final_name = rename.derive(desc);
        let bucket = routing.bucket(desc);

        match move_file(&desc.path, &output, bucket, &desc.final_name) {
            Ok(destination) => desc.path = destination,
            Err(err) => {
                warn!(file = %desc.name, error = %err, "move failed");
                desc.error = Some(err.to_string());
            }
        }

        info!(
            "→ {} (confidence {}) as {}",
            desc.category.unwrap_or(Category::ToVerify),
            desc.confidence,
            desc.final_name
        );

        summary.processed += 1;
        if bucket == Category::ToVerify {
            summary.review += 1;
        }
        if desc.error.is_some() {
            summary.errors += 1;
        }
    }

    let run_report = report::aggregate(&descriptors, &routing);
    let report_path = report::persist(&run_report, &output)?;
    info!("Run complete. Report written to {}", report_path.display());

    Ok(summary)
}

/// Creates the bucket folder on demand and relocates the file. Renames that
/// cross a filesystem boundary fall back to copy-then-delete.
fn move_file(
    from: &Path,
    output_root: &Path,
    bucket: Category,
    final_name: &str,
) -> anyhow::Result<PathBuf> {
    let dir = output_root.join(bucket.label());
    fs::create_dir_all(&dir)
        .with_context(|| format!("creating destination folder {}", dir.display()))?;
    let destination = dir.join(final_name);
    if fs::rename(from, &destination).is_err() {
        fs::copy(from, &destination)
            .with_context(|| format!("moving {} to {}", from.display(), destination.display()))?;
        fs::remove_file(from)
            .with_context(|| format!("removing source file {}", from.display()))?;
    }
    Ok(destination)
}

/// The `noop` provider is always registered so offline runs stay total; the
/// remote oracle joins only when a credential is present.
pub fn build_registry(config: &AppConfig) -> ProviderRegistry {
    let mut reg = ProviderRegistry::new().with_llm("noop", Arc::new(NoopProvider));

    if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
        let provider = AnthropicProvider::new(AnthropicConfig {
            api_key: key,
            base_url: config.oracle.base_url.clone(),
            model: config.oracle.model.clone(),
            max_tokens: config.oracle.max_tokens,
            timeout: Duration::from_secs(config.oracle.timeout_secs),
        });
        reg = reg.with_llm("anthropic", Arc::new(provider));
    }

    reg.set_preferred_llm(&config.oracle.provider)
}
