//! Job Extractor — turns cleaned careers-page text into structured job postings.

use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{strip_json_fences, ChatModel};
use crate::models::job::{JobPosting, OneOrMany};
use crate::outreach::prompts::{fill_template, JOB_EXTRACT_PROMPT_TEMPLATE};

const POSTING_KEYS: &[&str] = &["role", "experience", "skills", "description"];

/// Asks the model for the postings on a page.
///
/// Output that is not valid JSON fails with `AppError::JobExtraction`; it is
/// not retried, since an oversized page would fail the same way again.
pub async fn extract_jobs(page_text: &str, llm: &dyn ChatModel) -> Result<Vec<JobPosting>, AppError> {
    let prompt = fill_template(JOB_EXTRACT_PROMPT_TEMPLATE, &[("page_data", page_text)]);
    let raw = llm.complete(&prompt, JSON_ONLY_SYSTEM).await?;

    let jobs = parse_job_payload(&raw).ok_or_else(|| {
        warn!(
            "Job extraction output was not JSON: {:?}",
            raw.chars().take(120).collect::<String>()
        );
        AppError::JobExtraction
    })?;

    info!("Extracted {} job posting(s)", jobs.len());
    Ok(jobs)
}

/// Parses model output into postings. Accepts a bare object, an array, a
/// fenced block, text around the JSON, or an object wrapping the array.
pub fn parse_job_payload(raw: &str) -> Option<Vec<JobPosting>> {
    let text = strip_json_fences(raw);
    let value = serde_json::from_str::<Value>(text)
        .ok()
        .or_else(|| outermost_json_span(text).and_then(|span| serde_json::from_str(span).ok()))?;

    let value = unwrap_envelope(value);
    match value {
        Value::Object(_) | Value::Array(_) => serde_json::from_value::<OneOrMany>(value)
            .ok()
            .map(OneOrMany::into_vec),
        _ => None,
    }
}

/// `{"jobs": [...]}` style wrappers: an object with none of the posting keys
/// and exactly one array value.
fn unwrap_envelope(value: Value) -> Value {
    if let Value::Object(map) = &value {
        let looks_like_posting = POSTING_KEYS.iter().any(|k| map.contains_key(*k));
        if !looks_like_posting && map.len() == 1 {
            if let Some(inner @ Value::Array(_)) = map.values().next() {
                return inner.clone();
            }
        }
    }
    value
}

/// The widest `{...}` or `[...]` slice, whichever starts first.
fn outermost_json_span(text: &str) -> Option<&str> {
    let start = text.find(|c: char| c == '{' || c == '[')?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}
