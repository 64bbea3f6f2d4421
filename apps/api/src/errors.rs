use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::portfolio::PortfolioError;
use crate::scrape::ScrapeError;

/// Shown when the page could not be loaded or had no readable text.
pub const PAGE_LOAD_MESSAGE: &str = "Unable to load data from the provided URL.";

/// Shown when the model's job extraction output is not valid JSON.
pub const JOB_EXTRACTION_MESSAGE: &str = "Context is too big. Unable to extract job postings.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unable to load data from the provided URL.")]
    PageLoad,

    #[error("Context is too big. Unable to extract job postings.")]
    JobExtraction,

    #[error("Scrape error: {0}")]
    Scrape(ScrapeError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Portfolio error: {0}")]
    Portfolio(#[from] PortfolioError),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ScrapeError> for AppError {
    fn from(err: ScrapeError) -> Self {
        match err {
            ScrapeError::InvalidUrl(msg) => AppError::Validation(msg),
            ScrapeError::Empty | ScrapeError::Status { .. } => {
                tracing::warn!("Page load failed: {err}");
                AppError::PageLoad
            }
            other => AppError::Scrape(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::PageLoad => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "PAGE_LOAD_FAILED",
                PAGE_LOAD_MESSAGE.to_string(),
            ),
            AppError::JobExtraction => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "JOB_EXTRACTION_FAILED",
                JOB_EXTRACTION_MESSAGE.to_string(),
            ),
            AppError::Scrape(e) => {
                tracing::error!("Scrape error: {e}");
                (StatusCode::BAD_GATEWAY, "SCRAPE_ERROR", occurred(e))
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (StatusCode::BAD_GATEWAY, "LLM_ERROR", occurred(e))
            }
            AppError::Portfolio(e) => {
                tracing::error!("Portfolio error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "PORTFOLIO_ERROR", occurred(e))
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", occurred(e))
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Unexpected failures are surfaced to the user verbatim.
fn occurred(err: &dyn std::fmt::Display) -> String {
    format!("An Error Occurred: {err}")
}
