use serde::{Deserialize, Serialize};

/// One row of the portfolio CSV: a tech-stack description and the link that showcases it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioEntry {
    #[serde(rename(deserialize = "Techstack"))]
    pub techstack: String,
    #[serde(rename(deserialize = "Links"))]
    pub link: String,
}

/// A portfolio link ranked against a single skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMatch {
    pub link: String,
    pub techstack: String,
    /// Cosine similarity in [-1, 1]; higher is closer.
    pub score: f32,
}

/// The top portfolio links for one skill of a job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatches {
    pub skill: String,
    pub links: Vec<PortfolioMatch>,
}
