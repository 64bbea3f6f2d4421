use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A job posting as extracted by the model from a careers page.
///
/// Decoding is lenient: models routinely emit numbers for `experience`,
/// a comma-separated string for `skills`, or leave fields out entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(default, deserialize_with = "string_or_default")]
    pub role: String,
    #[serde(default, deserialize_with = "optional_scalar")]
    pub experience: Option<String>,
    #[serde(default, deserialize_with = "skill_set")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "string_or_default")]
    pub description: String,
}

impl JobPosting {
    pub fn has_skills(&self) -> bool {
        !self.skills.is_empty()
    }
}

/// The extraction prompt may yield either one posting or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    Many(Vec<JobPosting>),
    One(JobPosting),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<JobPosting> {
        match self {
            OneOrMany::Many(jobs) => jobs,
            OneOrMany::One(job) => vec![job],
        }
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

fn string_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(value).unwrap_or_default())
}

fn optional_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(value))
}

fn skill_set<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(scalar_to_string).collect(),
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    Ok(dedup_skills(raw))
}

/// Trims, drops blanks, and removes case-insensitive duplicates keeping first spelling.
pub fn dedup_skills<I>(skills: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect()
}
