//! Axum route handlers for the Outreach API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::models::job::{dedup_skills, JobPosting};
use crate::models::portfolio::{PortfolioEntry, SkillMatches};
use crate::outreach::job_extractor::extract_jobs;
use crate::outreach::pipeline::{generate_outreach, load_page_text, OutreachReport};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractJobsResponse {
    pub url: String,
    pub jobs: Vec<JobPosting>,
}

#[derive(Debug, Serialize)]
pub struct PortfolioListResponse {
    pub count: usize,
    pub entries: Vec<PortfolioEntry>,
}

#[derive(Debug, Deserialize)]
pub struct PortfolioQueryRequest {
    pub skills: Vec<String>,
    pub n_results: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct PortfolioQueryResponse {
    pub matches: Vec<SkillMatches>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/emails
///
/// Full flow for one job URL: scrape → extract postings → match portfolio → draft emails.
pub async fn handle_generate_emails(
    State(state): State<AppState>,
    Json(request): Json<UrlRequest>,
) -> Result<Json<OutreachReport>, AppError> {
    validate_url_field(&request.url)?;

    let _guard = state.run_lock.lock().await;
    info!("Generating outreach for {}", request.url.trim());

    let report = generate_outreach(&state.pipeline_deps(), &request.url).await?;
    Ok(Json(report))
}

/// POST /api/v1/jobs/extract
///
/// Previews the postings found on a page without drafting any email.
pub async fn handle_extract_jobs(
    State(state): State<AppState>,
    Json(request): Json<UrlRequest>,
) -> Result<Json<ExtractJobsResponse>, AppError> {
    validate_url_field(&request.url)?;

    let _guard = state.run_lock.lock().await;
    let page_text = load_page_text(&state.fetcher, &request.url).await?;
    let jobs = extract_jobs(&page_text, state.llm.as_ref()).await?;

    Ok(Json(ExtractJobsResponse {
        url: request.url.trim().to_string(),
        jobs,
    }))
}

/// GET /api/v1/portfolio
pub async fn handle_list_portfolio(
    State(state): State<AppState>,
) -> Json<PortfolioListResponse> {
    Json(PortfolioListResponse {
        count: state.portfolio.count(),
        entries: state.portfolio.entries().to_vec(),
    })
}

/// POST /api/v1/portfolio/query
///
/// Top portfolio links per skill, exactly as the email composer would see them.
pub async fn handle_query_portfolio(
    State(state): State<AppState>,
    Json(request): Json<PortfolioQueryRequest>,
) -> Result<Json<PortfolioQueryResponse>, AppError> {
    let skills = dedup_skills(request.skills);
    if skills.is_empty() {
        return Err(AppError::Validation("skills cannot be empty".to_string()));
    }

    let n_results = request.n_results.unwrap_or(state.config.portfolio_results);
    if n_results == 0 {
        return Err(AppError::Validation(
            "n_results must be at least 1".to_string(),
        ));
    }

    let matches = state.portfolio.query_links(&skills, n_results).await?;
    Ok(Json(PortfolioQueryResponse { matches }))
}

fn validate_url_field(url: &str) -> Result<(), AppError> {
    if url.trim().is_empty() {
        return Err(AppError::Validation("url cannot be empty".to_string()));
    }
    Ok(())
}
