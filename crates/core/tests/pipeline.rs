use providers::{LlmProvider, ProviderError, ProviderRegistry};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;
use triage_core::config::AppConfig;
use triage_core::pipeline;
use triage_core::report::REPORT_FILE_NAME;

/// Oracle double: always replies with the same text and counts consultations.
struct ScriptedOracle {
    reply: String,
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedOracle {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

fn scripted_registry(reply: &str) -> (ProviderRegistry, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = ProviderRegistry::new()
        .with_llm(
            "scripted",
            Arc::new(ScriptedOracle {
                reply: reply.to_string(),
                calls: calls.clone(),
            }),
        )
        .set_preferred_llm("scripted");
    (registry, calls)
}

fn test_config(input: &Path, output: &Path) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.ingest.input_dir = input.to_string_lossy().into_owned();
    cfg.ingest.output_dir = output.to_string_lossy().into_owned();
    cfg.classification.threshold = 0.70;
    cfg
}

fn read_report(output: &Path) -> serde_json::Value {
    let text = fs::read_to_string(output.join(REPORT_FILE_NAME)).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[tokio::test]
async fn keyword_hit_and_low_confidence_oracle_result() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("inbox");
    let output = temp.path().join("organised");
    fs::create_dir_all(&input).unwrap();

    fs::write(input.join("cni_jean.pdf"), b"piece d'identite").unwrap();
    fs::write(input.join("notes.txt"), "quelques notes de reunion").unwrap();

    let (registry, calls) = scripted_registry(
        r#"{"categorie": "Rapports", "confiance": 0.55, "description_courte": "notes-reunion"}"#,
    );
    let cfg = test_config(&input, &output);

    let summary = pipeline::run(&cfg, &registry).await.unwrap();
    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.review, 1);
    assert_eq!(summary.errors, 0);

    // The keyword hit never reaches the oracle; notes.txt is consulted once.
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // The input folder is drained.
    assert!(fs::read_dir(&input).unwrap().next().is_none());

    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    let identity = output
        .join("Documents_identite")
        .join(format!("{date}_Documents_identite_cni-jean.pdf"));
    assert!(identity.exists());
    // Routed to review, but the final name keeps the guessed category.
    let review = output
        .join("A_verifier")
        .join(format!("{date}_Rapports_notes.txt"));
    assert!(review.exists());

    let report = read_report(&output);
    assert_eq!(report["total_fichiers"], 2);
    assert_eq!(report["classes"]["Documents_identite"], 1);
    assert_eq!(report["classes"]["A_verifier"], 1);
    assert_eq!(report["classes"]["Rapports"], 0);
    assert_eq!(report["erreurs"].as_array().unwrap().len(), 0);

    let fichiers = report["fichiers"].as_array().unwrap();
    assert_eq!(fichiers.len(), 2);
    let notes = fichiers
        .iter()
        .find(|f| f["nom_original"] == "notes.txt")
        .unwrap();
    assert_eq!(notes["categorie"], "Rapports");
    assert_eq!(notes["confiance"], 0.55);
    assert_eq!(notes["statut"], "succes");
}

#[tokio::test]
async fn confident_oracle_result_lands_in_its_category() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("inbox");
    let output = temp.path().join("organised");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("janvier 2026.txt"), "bilan du mois").unwrap();

    let (registry, _) = scripted_registry(
        r#"{"categorie": "Rapports", "confiance": 0.91, "description_courte": "bilan-mensuel"}"#,
    );
    let cfg = test_config(&input, &output);

    let summary = pipeline::run(&cfg, &registry).await.unwrap();
    assert_eq!(summary.review, 0);

    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    assert!(output
        .join("Rapports")
        .join(format!("{date}_Rapports_janvier-2026.txt"))
        .exists());

    let report = read_report(&output);
    assert_eq!(report["classes"]["Rapports"], 1);
}

#[tokio::test]
async fn offline_run_degrades_to_review_and_records_the_error() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("inbox");
    let output = temp.path().join("organised");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("mystere.dat"), [0u8, 159, 146, 150]).unwrap();

    // Only the noop provider: every consultation fails deterministically.
    let registry = ProviderRegistry::new()
        .with_llm("noop", Arc::new(providers::noop::NoopProvider))
        .set_preferred_llm("noop");
    let cfg = test_config(&input, &output);

    let summary = pipeline::run(&cfg, &registry).await.unwrap();
    assert_eq!(summary.review, 1);
    assert_eq!(summary.errors, 1);

    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    assert!(output
        .join("A_verifier")
        .join(format!("{date}_A_verifier_mystere.dat"))
        .exists());

    let report = read_report(&output);
    assert_eq!(report["classes"]["A_verifier"], 1);
    assert_eq!(report["fichiers"][0]["statut"], "echec");
    assert_eq!(report["erreurs"].as_array().unwrap().len(), 1);
    assert_eq!(report["erreurs"][0]["nom_original"], "mystere.dat");
}

#[tokio::test]
async fn empty_drop_folder_is_terminal_without_a_report() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("inbox");
    let output = temp.path().join("organised");
    fs::create_dir_all(&input).unwrap();

    let (registry, calls) = scripted_registry("{}");
    let cfg = test_config(&input, &output);

    let summary = pipeline::run(&cfg, &registry).await.unwrap();
    assert_eq!(summary.discovered, 0);
    assert_eq!(summary.processed, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!output.join(REPORT_FILE_NAME).exists());
}

#[tokio::test]
async fn missing_drop_folder_aborts_the_run() {
    let temp = tempdir().unwrap();
    let input = temp.path().join("absent");
    let output = temp.path().join("organised");

    let (registry, _) = scripted_registry("{}");
    let cfg = test_config(&input, &output);

    assert!(pipeline::run(&cfg, &registry).await.is_err());
    assert!(!output.exists());
}
