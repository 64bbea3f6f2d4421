use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::llm_client::ChatModel;
use crate::outreach::pipeline::PipelineDeps;
use crate::portfolio::PortfolioStore;
use crate::scrape::PageFetcher;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn ChatModel>,
    pub fetcher: PageFetcher,
    /// Loaded once at startup; read-only afterwards.
    pub portfolio: Arc<PortfolioStore>,
    pub config: Config,
    /// Serialises LLM-backed operations: one generation in flight at a time.
    pub run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn pipeline_deps(&self) -> PipelineDeps<'_> {
        PipelineDeps {
            fetcher: &self.fetcher,
            llm: self.llm.as_ref(),
            portfolio: &self.portfolio,
            candidate: &self.config.candidate,
            n_results: self.config.portfolio_results,
        }
    }
}
