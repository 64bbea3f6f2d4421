mod config;
mod errors;
mod llm_client;
mod models;
mod outreach;
mod portfolio;
mod routes;
mod scrape;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::portfolio::embedder::{Embedder, FastEmbedder};
use crate::portfolio::PortfolioStore;
use crate::routes::build_router;
use crate::scrape::PageFetcher;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on a missing GROQ_API_KEY)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Coldmail API v{}", env!("CARGO_PKG_VERSION"));

    // Open the portfolio index and populate it from the CSV if empty
    let embedding_cache = config.embedding_cache_dir.clone();
    let embedder: Arc<dyn Embedder> = Arc::new(
        tokio::task::spawn_blocking(move || FastEmbedder::new(&embedding_cache))
            .await
            .context("Embedding model loader panicked")??,
    );
    let mut portfolio = PortfolioStore::open(
        &config.portfolio_csv,
        &config.vectorstore_dir,
        embedder.clone(),
    )
    .await
    .with_context(|| format!("Failed to open portfolio {}", config.portfolio_csv.display()))?;
    portfolio.load_portfolio().await?;
    info!(
        "Portfolio ready: {} entries (embedder: {})",
        portfolio.count(),
        embedder.id()
    );

    // Initialize LLM client
    let llm = LlmClient::new(config.groq_api_key.clone())?.with_endpoint(&config.llm_api_url);
    info!(
        "LLM client initialized (model: {}, endpoint: {})",
        llm_client::MODEL,
        config.llm_api_url
    );

    let fetcher = PageFetcher::new(Duration::from_secs(config.fetch_timeout_secs))?;

    // Build app state
    let state = AppState {
        llm: Arc::new(llm),
        fetcher,
        portfolio: Arc::new(portfolio),
        config: config.clone(),
        run_lock: Arc::new(Mutex::new(())),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
