// LLM prompt templates for the outreach flow.
// Shared system fragments live in llm_client::prompts.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Job extraction prompt. Replace `{page_data}` before sending.
pub const JOB_EXTRACT_PROMPT_TEMPLATE: &str = r#"### SCRAPED TEXT FROM WEBSITE:
{page_data}

### INSTRUCTION:
The scraped text is from the careers page of a website.
Your job is to extract the job postings and return them in JSON format containing
the following keys: `role`, `experience`, `skills` and `description`.
`skills` must be a JSON array of strings.
If there are several postings return a JSON array of objects.
Only return the valid JSON.

### VALID JSON (NO PREAMBLE):"#;

/// Cold email prompt.
/// Replace: {job_description}, {candidate_name}, {candidate_profile}, {link_list}
pub const EMAIL_PROMPT_TEMPLATE: &str = r#"### JOB DESCRIPTION:
{job_description}

### INSTRUCTION:
You are {candidate_name}.
{candidate_profile}

Your job is to write a cold email to the hiring team regarding the job mentioned above,
describing {candidate_name}'s capability in fulfilling their needs.

Also add the most relevant ones from the following links to showcase {candidate_name}'s portfolio:
{link_list}

Remember you are {candidate_name}.
Do not provide a preamble.

### EMAIL (NO PREAMBLE):"#;

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid"));

/// Fills `{name}` placeholders in one pass. Substituted text is never
/// rescanned, so values may safely contain brace-wrapped words.
/// Unknown placeholders are left as they are.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map_or_else(|| caps[0].to_string(), |(_, value)| value.to_string())
        })
        .into_owned()
}
