//! Postgres-backed [`RunStore`] and [`SimilarityIndex`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedwire_core::{DedupRecord, RunRecord};
use sqlx::PgPool;

use crate::collaborators::{RunStore, SimilarityIndex};
use crate::error::PipelineError;

#[derive(Clone)]
pub struct PgRunStore {
    pool: PgPool,
}

impl PgRunStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RunStore for PgRunStore {
    async fn latest_run_timestamp(&self) -> Result<Option<DateTime<Utc>>, PipelineError> {
        Ok(feedwire_db::latest_run_timestamp(&self.pool).await?)
    }

    async fn insert_run_record(&self, record: &RunRecord) -> Result<(), PipelineError> {
        Ok(feedwire_db::insert_run_record(&self.pool, record).await?)
    }
}

#[derive(Clone)]
pub struct PgSimilarityIndex {
    pool: PgPool,
}

impl PgSimilarityIndex {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SimilarityIndex for PgSimilarityIndex {
    async fn similar_exists(
        &self,
        embedding: &[f32],
        threshold: f64,
    ) -> Result<bool, PipelineError> {
        Ok(feedwire_db::similar_summary_exists(&self.pool, embedding, threshold).await?)
    }

    async fn insert(&self, record: &DedupRecord) -> Result<(), PipelineError> {
        Ok(feedwire_db::insert_summary_embedding(&self.pool, record).await?)
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, PipelineError> {
        Ok(feedwire_db::delete_embeddings_before(&self.pool, cutoff).await?)
    }
}
