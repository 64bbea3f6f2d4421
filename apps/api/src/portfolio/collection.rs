//! LanceDB-backed embedding collection for portfolio records.
//!
//! One table per collection under the vector-store directory. Every row keeps
//! the model that embedded it, so a model change can be detected on open.

use std::path::Path;
use std::sync::Arc;

use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator,
    StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use futures_util::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use tracing::{debug, warn};
use uuid::Uuid;

use super::PortfolioError;

/// A record ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub document: String,
    pub link: String,
    pub embedding: Vec<f32>,
}

/// A query hit with its cosine similarity (`1 - distance`).
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub document: String,
    pub link: String,
    pub score: f32,
}

/// Arrow schema of a collection table. `seq` preserves insertion order.
pub fn collection_schema(dimension: usize) -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("seq", DataType::Int32, false),
        Field::new("document", DataType::Utf8, false),
        Field::new("links", DataType::Utf8, false),
        Field::new("embedding_model", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                dimension as i32,
            ),
            false,
        ),
    ])
}

pub struct Collection {
    db: lancedb::Connection,
    table: lancedb::Table,
    name: String,
    dimension: usize,
}

impl Collection {
    /// Opens the named table under `dir`, creating the directory and table as needed.
    ///
    /// A table whose vector width differs from `dimension` is dropped and recreated empty.
    pub async fn open(dir: &Path, name: &str, dimension: usize) -> Result<Self, PortfolioError> {
        tokio::fs::create_dir_all(dir).await?;
        let uri = dir.to_str().ok_or_else(|| {
            PortfolioError::Source(format!("Path contains invalid UTF-8: {}", dir.display()))
        })?;
        let db = lancedb::connect(uri).execute().await?;

        let table = match db.open_table(name).execute().await {
            Ok(table) => {
                let stored = stored_dimension(&table).await?;
                if stored == Some(dimension) {
                    table
                } else {
                    warn!(
                        "Collection '{name}' has {stored:?}-dimension vectors, expected {dimension}; recreating"
                    );
                    drop_table(&db, name).await?;
                    create_table(&db, name, dimension).await?
                }
            }
            Err(lancedb::Error::TableNotFound { .. }) => create_table(&db, name, dimension).await?,
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            db,
            table,
            name: name.to_string(),
            dimension,
        })
    }

    /// True if any row was embedded by a model other than `model`.
    pub async fn has_foreign_records(&self, model: &str) -> Result<bool, PortfolioError> {
        let batches: Vec<RecordBatch> = self
            .table
            .query()
            .only_if(format!("embedding_model != '{}'", model.replace('\'', "''")))
            .limit(1)
            .execute()
            .await?
            .try_collect()
            .await?;
        Ok(batches.iter().any(|b| b.num_rows() > 0))
    }

    /// Drops every record.
    pub async fn reset(&mut self) -> Result<(), PortfolioError> {
        drop_table(&self.db, &self.name).await?;
        self.table = create_table(&self.db, &self.name, self.dimension).await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<usize, PortfolioError> {
        Ok(self.table.count_rows(None).await?)
    }

    /// Appends records embedded by `model`, each under a fresh UUID v4.
    pub async fn add(&self, model: &str, records: &[NewRecord]) -> Result<usize, PortfolioError> {
        if records.is_empty() {
            return Ok(0);
        }
        if let Some(bad) = records.iter().find(|r| r.embedding.len() != self.dimension) {
            return Err(PortfolioError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.embedding.len(),
            });
        }

        let start = self.count().await? as i32;
        let batch = self.build_record_batch(model, records, start)?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);

        self.table.add(reader).execute().await?;
        debug!("Added {} records to collection '{}'", records.len(), self.name);
        Ok(records.len())
    }

    /// Top `n` records by cosine similarity. Equal scores keep insertion order.
    pub async fn query(
        &self,
        embedding: &[f32],
        n: usize,
    ) -> Result<Vec<ScoredRecord>, PortfolioError> {
        if n == 0 || self.count().await? == 0 {
            return Ok(Vec::new());
        }
        if embedding.len() != self.dimension {
            return Err(PortfolioError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        let batches: Vec<RecordBatch> = self
            .table
            .vector_search(embedding)?
            .distance_type(lancedb::DistanceType::Cosine)
            .limit(n)
            .execute()
            .await?
            .try_collect()
            .await?;

        let mut hits: Vec<(i32, ScoredRecord)> = Vec::new();
        for batch in &batches {
            if batch.num_rows() == 0 {
                continue;
            }
            let seq = int_column(batch, "seq")?;
            let document = string_column(batch, "document")?;
            let links = string_column(batch, "links")?;
            let distance = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>());

            for i in 0..batch.num_rows() {
                let d = distance.map_or(0.0, |d| d.value(i));
                hits.push((
                    seq.value(i),
                    ScoredRecord {
                        document: document.value(i).to_string(),
                        link: links.value(i).to_string(),
                        score: 1.0 - d,
                    },
                ));
            }
        }

        hits.sort_by(|a, b| {
            b.1.score
                .partial_cmp(&a.1.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        hits.truncate(n);
        Ok(hits.into_iter().map(|(_, r)| r).collect())
    }

    fn build_record_batch(
        &self,
        model: &str,
        records: &[NewRecord],
        start: i32,
    ) -> Result<RecordBatch, PortfolioError> {
        let schema = Arc::new(collection_schema(self.dimension));

        let ids = StringArray::from(
            records
                .iter()
                .map(|_| Uuid::new_v4().to_string())
                .collect::<Vec<_>>(),
        );
        let seqs = Int32Array::from((0..records.len() as i32).map(|i| start + i).collect::<Vec<_>>());
        let documents = StringArray::from(
            records.iter().map(|r| r.document.clone()).collect::<Vec<_>>(),
        );
        let links = StringArray::from(records.iter().map(|r| r.link.clone()).collect::<Vec<_>>());
        let models = StringArray::from(vec![model.to_string(); records.len()]);

        let values = Float32Array::from(
            records
                .iter()
                .flat_map(|r| r.embedding.iter().copied())
                .collect::<Vec<_>>(),
        );
        let item = Arc::new(Field::new("item", DataType::Float32, true));
        let vectors =
            FixedSizeListArray::try_new(item, self.dimension as i32, Arc::new(values), None)?;

        Ok(RecordBatch::try_new(
            schema,
            vec![
                Arc::new(ids),
                Arc::new(seqs),
                Arc::new(documents),
                Arc::new(links),
                Arc::new(models),
                Arc::new(vectors),
            ],
        )?)
    }
}

async fn create_table(
    db: &lancedb::Connection,
    name: &str,
    dimension: usize,
) -> Result<lancedb::Table, PortfolioError> {
    let schema = Arc::new(collection_schema(dimension));
    Ok(db.create_empty_table(name, schema).execute().await?)
}

async fn drop_table(db: &lancedb::Connection, name: &str) -> Result<(), PortfolioError> {
    match db.drop_table(name, &[]).await {
        Ok(()) | Err(lancedb::Error::TableNotFound { .. }) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn stored_dimension(table: &lancedb::Table) -> Result<Option<usize>, PortfolioError> {
    let schema = table.schema().await?;
    Ok(match schema.field_with_name("vector").map(|f| f.data_type()) {
        Ok(DataType::FixedSizeList(_, size)) => Some(*size as usize),
        _ => None,
    })
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, PortfolioError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| PortfolioError::Schema(format!("column '{name}' missing or not Utf8")))
}

fn int_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int32Array, PortfolioError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Int32Array>())
        .ok_or_else(|| PortfolioError::Schema(format!("column '{name}' missing or not Int32")))
}
