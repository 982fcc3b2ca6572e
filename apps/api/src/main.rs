mod config;
mod errors;
mod interview;
mod llm_client;
mod research;
mod retrieval;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, IndexConfig};
use crate::llm_client::LlmClient;
use crate::retrieval::builder::{build_index, load_records};
use crate::retrieval::embedding::OllamaEmbedder;
use crate::retrieval::search::SearchService;
use crate::retrieval::store::{FsIndexStore, IndexStore};
use crate::routes::build_router;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "interview-api", version, about = "Interview preparation backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Rebuild the similar-question index from the question dataset
    BuildIndex {
        /// CSV dataset to read (overrides QUESTION_DATASET)
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Index directory to replace (overrides INDEX_PATH)
        #[arg(long)]
        index_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::BuildIndex {
            dataset,
            index_path,
        } => {
            let mut config = IndexConfig::from_env()?;
            if let Some(dataset) = dataset {
                config.dataset_path = dataset;
            }
            if let Some(index_path) = index_path {
                config.index_path = index_path;
            }
            init_tracing("info");
            rebuild_index(&config).await
        }
    }
}

/// Initialize structured logging. `RUST_LOG` wins when set.
fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                default_level
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;
    init_tracing(&config.rust_log);

    info!("Starting interview API v{}", env!("CARGO_PKG_VERSION"));

    let llm = LlmClient::from_config(&config);
    info!("LLM client initialized (model: {})", llm.model());

    let embedder = OllamaEmbedder::new(
        &config.index.embedding_url,
        &config.index.embedding_model,
        config.index.embedding_timeout,
    )
    .context("building embedding client")?;
    let store = Arc::new(FsIndexStore::new(&config.index.index_path));
    if store.exists() {
        info!("Question index found at {}", config.index.index_path.display());
    } else {
        warn!(
            "No question index at {}; run `interview-api build-index` before searching",
            config.index.index_path.display()
        );
    }
    let search = Arc::new(SearchService::new(store, Arc::new(embedder)));

    let state = AppState {
        llm,
        search,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn rebuild_index(config: &IndexConfig) -> Result<()> {
    let records = load_records(&config.dataset_path)?;
    let embedder = OllamaEmbedder::new(
        &config.embedding_url,
        &config.embedding_model,
        config.embedding_timeout,
    )
    .context("building embedding client")?;
    let store = FsIndexStore::new(&config.index_path);

    let report = build_index(
        records,
        &embedder,
        &store,
        config.embedding_batch_size,
        &config.dataset_path.display().to_string(),
    )
    .await
    .with_context(|| format!("rebuilding index from {}", config.dataset_path.display()))?;

    println!(
        "Index rebuilt: {} entries ({} skipped), {} dimensions, model {}, build {}",
        report.entry_count, report.skipped, report.dimensions, report.model, report.build_id
    );
    Ok(())
}
