//! Portfolio store: the candidate's work samples, embedded and searchable by skill.
//!
//! The CSV is the source of truth; the LanceDB table under the vector-store
//! directory is built from it once and reused on later runs.

pub mod collection;
pub mod embedder;
#[cfg(test)]
pub mod hash_embedder;
pub mod source;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::models::portfolio::{PortfolioEntry, PortfolioMatch, SkillMatches};

use self::collection::{Collection, NewRecord};
use self::embedder::Embedder;
use self::source::read_portfolio_csv;

pub const COLLECTION_NAME: &str = "portfolio";

#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("Failed to read portfolio source {0}")]
    Source(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Vector store error: {0}")]
    Store(#[from] lancedb::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("Unexpected collection layout: {0}")]
    Schema(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding failed: {0}")]
    Embedding(String),
}

pub struct PortfolioStore {
    entries: Vec<PortfolioEntry>,
    collection: Collection,
    store_dir: PathBuf,
    embedder: Arc<dyn Embedder>,
    record_count: usize,
}

impl PortfolioStore {
    /// Reads the CSV and opens (or creates) the persisted collection.
    ///
    /// Records embedded by a different model are discarded so that
    /// `load_portfolio` re-embeds every row.
    pub async fn open(
        csv_path: &Path,
        store_dir: &Path,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, PortfolioError> {
        let entries = read_portfolio_csv(csv_path).await?;
        let mut collection =
            Collection::open(store_dir, COLLECTION_NAME, embedder.dimension()).await?;

        if collection.has_foreign_records(embedder.id()).await? {
            warn!(
                "Collection holds vectors from another model, current embedder is {}; rebuilding",
                embedder.id()
            );
            collection.reset().await?;
        }

        let record_count = collection.count().await?;
        if record_count != 0 && record_count != entries.len() {
            warn!(
                "Collection holds {} records but {} has {} rows; delete {} to rebuild",
                record_count,
                csv_path.display(),
                entries.len(),
                store_dir.display()
            );
        }

        Ok(Self {
            entries,
            collection,
            store_dir: store_dir.to_path_buf(),
            embedder,
            record_count,
        })
    }

    /// Embeds every CSV row into the collection if it is empty. Returns the number of records added.
    pub async fn load_portfolio(&mut self) -> Result<usize, PortfolioError> {
        if self.record_count != 0 {
            info!("Portfolio collection already holds {} records", self.record_count);
            return Ok(0);
        }

        let documents: Vec<String> = self.entries.iter().map(|e| e.techstack.clone()).collect();
        let embeddings = self.embedder.embed(&documents).await?;
        if embeddings.len() != documents.len() {
            return Err(PortfolioError::Embedding(format!(
                "embedder returned {} vectors for {} documents",
                embeddings.len(),
                documents.len()
            )));
        }

        let records: Vec<NewRecord> = self
            .entries
            .iter()
            .zip(embeddings)
            .map(|(entry, embedding)| NewRecord {
                document: entry.techstack.clone(),
                link: entry.link.clone(),
                embedding,
            })
            .collect();

        let added = self.collection.add(self.embedder.id(), &records).await?;
        self.record_count = self.collection.count().await?;
        info!(
            "Loaded {} portfolio entries into {}",
            added,
            self.store_dir.display()
        );
        Ok(added)
    }

    pub fn count(&self) -> usize {
        self.record_count
    }

    pub fn entries(&self) -> &[PortfolioEntry] {
        &self.entries
    }

    /// Top `n_results` portfolio links for each skill, one query per skill.
    pub async fn query_links(
        &self,
        skills: &[String],
        n_results: usize,
    ) -> Result<Vec<SkillMatches>, PortfolioError> {
        if skills.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.embedder.embed(skills).await?;

        let mut matches = Vec::with_capacity(skills.len());
        for (skill, embedding) in skills.iter().zip(embeddings) {
            let links = self
                .collection
                .query(&embedding, n_results)
                .await?
                .into_iter()
                .map(|hit| PortfolioMatch {
                    link: hit.link,
                    techstack: hit.document,
                    score: hit.score,
                })
                .collect();
            matches.push(SkillMatches {
                skill: skill.clone(),
                links,
            });
        }
        Ok(matches)
    }
}
