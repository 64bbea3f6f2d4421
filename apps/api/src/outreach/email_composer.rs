//! Email Composer — drafts the cold email for one posting from the matched portfolio links.

use std::collections::HashSet;

use crate::config::CandidateProfile;
use crate::errors::AppError;
use crate::llm_client::prompts::NO_PREAMBLE_SYSTEM;
use crate::llm_client::{ChatModel, LlmError};
use crate::models::job::JobPosting;
use crate::models::portfolio::SkillMatches;
use crate::outreach::prompts::{fill_template, EMAIL_PROMPT_TEMPLATE};

/// Writes the outreach email for `job`, citing the portfolio links in `matches`.
pub async fn write_mail(
    job: &JobPosting,
    matches: &[SkillMatches],
    candidate: &CandidateProfile,
    llm: &dyn ChatModel,
) -> Result<String, AppError> {
    let prompt = build_email_prompt(job, matches, candidate)?;
    let email = llm.complete(&prompt, NO_PREAMBLE_SYSTEM).await?;
    let email = email.trim();
    if email.is_empty() {
        return Err(LlmError::EmptyContent.into());
    }
    Ok(email.to_string())
}

fn build_email_prompt(
    job: &JobPosting,
    matches: &[SkillMatches],
    candidate: &CandidateProfile,
) -> Result<String, AppError> {
    let job_description = serde_json::to_string_pretty(job)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize job posting: {e}")))?;

    let link_list = render_link_list(matches);

    Ok(fill_template(
        EMAIL_PROMPT_TEMPLATE,
        &[
            ("job_description", job_description.as_str()),
            ("candidate_profile", candidate.summary.as_str()),
            ("link_list", link_list.as_str()),
            ("candidate_name", candidate.name.as_str()),
        ],
    ))
}

/// One bullet per distinct link, in match order.
fn render_link_list(matches: &[SkillMatches]) -> String {
    let mut seen = HashSet::new();
    let lines: Vec<String> = matches
        .iter()
        .flat_map(|m| m.links.iter())
        .filter(|l| seen.insert(l.link.as_str()))
        .map(|l| format!("- {} ({})", l.link, l.techstack))
        .collect();

    if lines.is_empty() {
        "(no portfolio links available)".to_string()
    } else {
        lines.join("\n")
    }
}
