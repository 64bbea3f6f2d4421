// Outreach: job extraction, portfolio matching and cold email drafting.
// All LLM calls go through llm_client — no direct provider calls here.

pub mod email_composer;
pub mod handlers;
pub mod job_extractor;
pub mod pipeline;
pub mod prompts;
