//! caseforge CLI - drive a single case through the production loop.

use anyhow::Result;
use caseforge_core::CaseId;
use caseforge_metrics::CsvMetricsSink;
use caseforge_pipeline::{PipelineConfig, ProductionLoop};
use caseforge_render::HtmlRenderer;
use caseforge_safety::{OpenAiClassifier, SafetyReviewer};
use caseforge_storage::{seed, CaseStore, SqliteCaseStore};
use caseforge_writer::OpenAiWriter;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "caseforge")]
#[command(about = "Gated content production pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Case database path
    #[arg(long, default_value = "data/cases.db")]
    db: PathBuf,

    /// Directory for rendered artifacts
    #[arg(long, default_value = "public")]
    public: PathBuf,

    /// Threshold configuration file
    #[arg(long, default_value = "caseforge.json")]
    config: PathBuf,

    /// Outcome metrics log
    #[arg(long, default_value = "logs/content_metrics.csv")]
    metrics: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the production loop for one case
    Run {
        /// Case ID
        case_id: String,
        /// Attempt budget (clamped by the loop's documented cap)
        #[arg(long, default_value = "3")]
        max_attempts: u32,
    },
    /// Insert the designated safe-mode test case
    Seed,
    /// List cases waiting to be processed
    List {
        /// Maximum rows to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Show how many cases have been published
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    let store = SqliteCaseStore::new(&cli.db)
        .await?
        .with_public_dir(&cli.public);

    match cli.command {
        Commands::Run {
            case_id,
            max_attempts,
        } => {
            let api_key = std::env::var("OPENAI_API_KEY").ok();
            let mut writer = OpenAiWriter::new(api_key.clone());
            if let Ok(model) = std::env::var("OPENAI_MODEL_WRITER") {
                writer = writer.with_model(model);
            }

            let reviewer = match api_key {
                Some(key) => {
                    let mut classifier = OpenAiClassifier::new(key);
                    if let Ok(model) = std::env::var("OPENAI_MODEL_SAFETY") {
                        classifier = classifier.with_model(model);
                    }
                    SafetyReviewer::with_semantic(Arc::new(classifier))
                }
                None => SafetyReviewer::new(),
            };

            let config = PipelineConfig::load_or_default(&cli.config);
            let pipeline = ProductionLoop::new(
                Arc::new(store),
                Arc::new(writer),
                reviewer,
                Arc::new(HtmlRenderer::new(&cli.public)),
                Arc::new(CsvMetricsSink::new(&cli.metrics)),
                config,
            );

            let outcome = pipeline.run(&CaseId::from(case_id), max_attempts).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Seed => {
            let case = seed::test_case();
            store.upsert_case(&case).await?;
            info!("seeded case {}", case.case_id);
            println!("Seeded: {} ({})", case.case_id, case.slug.unwrap_or_default());
        }
        Commands::List { limit } => {
            store.cleanup_null_cases().await?;
            let cases = store.list_todo(limit).await?;
            println!("Todo cases ({})", cases.len());
            for case in cases {
                println!(
                    "  {} | {} | {} - {}",
                    case.case_id,
                    case.status,
                    case.slug.unwrap_or_default(),
                    case.title.unwrap_or_default(),
                );
            }
        }
        Commands::Status => {
            let published = store.count_published().await?;
            println!("Published cases: {published}");
        }
    }

    Ok(())
}
