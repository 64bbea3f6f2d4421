use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_CANDIDATE_NAME: &str = "the applicant";
const DEFAULT_CANDIDATE_PROFILE: &str = "\
    A software engineer with hands-on industry experience building production systems, \
    proficient in multiple programming languages and databases, \
    with a strong interest in machine learning and software engineering.";

/// Application configuration loaded from environment variables.
/// Only the LLM API key is required; everything else has a default.
#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: String,
    /// OpenAI-compatible chat-completions URL; Groq unless overridden.
    pub llm_api_url: String,
    pub port: u16,
    pub rust_log: String,
    pub portfolio_csv: PathBuf,
    pub vectorstore_dir: PathBuf,
    /// Where the embedding model files are downloaded to.
    pub embedding_cache_dir: PathBuf,
    /// Number of portfolio links returned per skill.
    pub portfolio_results: usize,
    pub fetch_timeout_secs: u64,
    pub candidate: CandidateProfile,
}

/// Who the outreach email is written as.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateProfile {
    pub name: String,
    pub summary: String,
}

impl Default for CandidateProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_CANDIDATE_NAME.to_string(),
            summary: DEFAULT_CANDIDATE_PROFILE.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = CandidateProfile::default();

        let portfolio_results: usize = parse_env("PORTFOLIO_RESULTS", 2)
            .context("PORTFOLIO_RESULTS must be a positive integer")?;
        anyhow::ensure!(portfolio_results > 0, "PORTFOLIO_RESULTS must be at least 1");

        Ok(Config {
            groq_api_key: require_env("GROQ_API_KEY")?,
            llm_api_url: optional_env("LLM_API_URL")
                .unwrap_or_else(|| crate::llm_client::GROQ_API_URL.to_string()),
            port: parse_env("PORT", 8080).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            portfolio_csv: optional_env("PORTFOLIO_CSV")
                .unwrap_or_else(|| "./resource/my_portfolio.csv".to_string())
                .into(),
            vectorstore_dir: optional_env("VECTORSTORE_DIR")
                .unwrap_or_else(|| "./vectorstore".to_string())
                .into(),
            embedding_cache_dir: optional_env("EMBEDDING_CACHE_DIR")
                .unwrap_or_else(|| "./.fastembed_cache".to_string())
                .into(),
            portfolio_results,
            fetch_timeout_secs: parse_env("FETCH_TIMEOUT_SECS", 30)
                .context("FETCH_TIMEOUT_SECS must be a number of seconds")?,
            candidate: CandidateProfile {
                name: optional_env("CANDIDATE_NAME").unwrap_or(defaults.name),
                summary: optional_env("CANDIDATE_PROFILE").unwrap_or(defaults.summary),
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    optional_env(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank values are treated the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Invalid value '{raw}' for '{key}'")),
        None => Ok(default),
    }
}
