//! Outreach pipeline — the single pass from job URL to drafted emails.
//!
//! Flow: fetch page → clean text → extract postings → for each posting with
//!       skills: query portfolio → compose email.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::CandidateProfile;
use crate::errors::AppError;
use crate::llm_client::ChatModel;
use crate::models::job::JobPosting;
use crate::models::portfolio::SkillMatches;
use crate::outreach::email_composer::write_mail;
use crate::outreach::job_extractor::extract_jobs;
use crate::portfolio::PortfolioStore;
use crate::scrape::cleaner::clean_text;
use crate::scrape::PageFetcher;

pub const NO_SKILLS_WARNING: &str = "No skills found to query.";

/// Everything one pipeline run reads. Borrowed from `AppState` per request.
pub struct PipelineDeps<'a> {
    pub fetcher: &'a PageFetcher,
    pub llm: &'a dyn ChatModel,
    pub portfolio: &'a PortfolioStore,
    pub candidate: &'a CandidateProfile,
    pub n_results: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftEmail {
    pub job: JobPosting,
    pub matched_links: Vec<SkillMatches>,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutreachReport {
    pub url: String,
    pub emails: Vec<DraftEmail>,
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Downloads `url` and returns its cleaned text.
pub async fn load_page_text(fetcher: &PageFetcher, url: &str) -> Result<String, AppError> {
    let page = fetcher.fetch(url).await?;
    let text = clean_text(&page.content);
    if text.is_empty() {
        return Err(AppError::PageLoad);
    }
    info!(
        "Cleaned page text: {} chars (raw {})",
        text.len(),
        page.content.len()
    );
    Ok(text)
}

/// Runs the whole flow for one job URL.
pub async fn generate_outreach(deps: &PipelineDeps<'_>, url: &str) -> Result<OutreachReport, AppError> {
    let page_text = load_page_text(deps.fetcher, url).await?;
    let jobs = extract_jobs(&page_text, deps.llm).await?;

    let mut emails = Vec::with_capacity(jobs.len());
    let mut warnings = Vec::new();

    for job in jobs {
        if !job.has_skills() {
            warn!("Skipping posting '{}' with no skills", job.role);
            warnings.push(NO_SKILLS_WARNING.to_string());
            continue;
        }

        let matched_links = deps
            .portfolio
            .query_links(&job.skills, deps.n_results)
            .await?;
        let email = write_mail(&job, &matched_links, deps.candidate, deps.llm).await?;

        info!(
            "Drafted email for '{}' citing {} skill match(es)",
            job.role,
            matched_links.len()
        );
        emails.push(DraftEmail {
            job,
            matched_links,
            email,
        });
    }

    Ok(OutreachReport {
        url: url.trim().to_string(),
        emails,
        warnings,
        generated_at: Utc::now(),
    })
}
