use anyhow::Result;
use clap::{Parser, Subcommand};
use triage_core::config;
use triage_core::config::AppConfig;
use triage_core::pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { json, threshold } => run_pipeline(cfg, threshold, json).await,
    }
}

#[derive(Parser)]
#[command(name = "file-triage")]
#[command(about = "Drop-folder triage: classify, rename and route incoming files", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process the drop folder once and write the run report
    Run {
        /// Output JSON summary
        #[arg(long)]
        json: bool,
        /// Override the confidence threshold from the config
        #[arg(long)]
        threshold: Option<f32>,
    },
}

async fn run_pipeline(mut cfg: AppConfig, threshold: Option<f32>, json: bool) -> Result<()> {
    if let Some(t) = threshold {
        cfg.classification.threshold = t;
    }
    let registry = pipeline::build_registry(&cfg);
    let summary = pipeline::run(&cfg, &registry).await?;

    if json {
        let summary_json = serde_json::json!({
            "status": "ok",
            "discovered": summary.discovered,
            "processed": summary.processed,
            "review": summary.review,
            "errors": summary.errors,
        });
        println!("{}", serde_json::to_string_pretty(&summary_json)?);
    } else {
        println!(
            "run: discovered {}, processed {}, sent to review {}, errors {}",
            summary.discovered, summary.processed, summary.review, summary.errors
        );
    }
    Ok(())
}
