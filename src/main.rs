use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use taxolabel::commands;
use taxolabel::commands::label::LabelArgs;
use taxolabel::core::config::EmbeddingBackend;

#[derive(Parser)]
#[command(name = "taxolabel")]
#[command(about = "Assign insurance taxonomy labels to companies by embedding similarity", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Label companies and rewrite the companies file (default)
    Label(LabelCmd),

    /// Check or download the embedding model
    Model {
        /// Subcommand: download, status
        #[arg(default_value = "status")]
        action: String,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
}

#[derive(Args, Default)]
struct LabelCmd {
    #[arg(long, help = "Companies CSV (rewritten in place)")]
    companies: Option<PathBuf>,
    #[arg(long, help = "Taxonomy CSV with a 'label' column")]
    taxonomy: Option<PathBuf>,
    #[arg(long, help = "Minimum cosine similarity (default: 0.32)")]
    threshold: Option<f32>,
    #[arg(long, help = "Embedding backend: fastembed (default) or model2vec")]
    backend: Option<EmbeddingBackend>,
    #[arg(long, help = "Model ID (default: all-MiniLM-L6-v2, or potion-base-8M for model2vec)")]
    model: Option<String>,
    #[arg(long, help = "Model2Vec model directory, or fastembed cache directory")]
    model_path: Option<PathBuf>,
    #[arg(long, help = "Texts per embedding batch")]
    batch_size: Option<usize>,
    #[arg(long, help = "Fail on zero-norm embeddings instead of excluding them")]
    strict_vectors: bool,
    #[arg(long, help = "Compute labels without writing the file")]
    dry_run: bool,
    #[arg(long, help = "JSON output")]
    json: bool,
}

impl From<LabelCmd> for LabelArgs {
    fn from(cmd: LabelCmd) -> Self {
        LabelArgs {
            companies: cmd.companies,
            taxonomy: cmd.taxonomy,
            threshold: cmd.threshold,
            backend: cmd.backend,
            model: cmd.model,
            model_path: cmd.model_path,
            batch_size: cmd.batch_size,
            strict_vectors: cmd.strict_vectors,
            dry_run: cmd.dry_run,
            json: cmd.json,
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")).into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        // Default: label with config-file settings
        None => commands::label::run(LabelCmd::default().into()),
        Some(Commands::Label(cmd)) => commands::label::run(cmd.into()),
        Some(Commands::Model { action, json }) => commands::model::run(&action, json),
    }
}
