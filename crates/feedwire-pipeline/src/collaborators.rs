//! Seams between the pipeline core and the services it talks to.
//!
//! Production implementations live next to each trait's client module
//! (`tei`, `openai`, `cloud_tasks`, `telegram`, `store`); in-memory versions
//! for tests and local runs live in `memory`. Callers race these futures
//! against a cancellation token, so implementations need not take one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedwire_core::{DedupRecord, RunRecord, TaskEnvelope};
use feedwire_ingest::{FeedIngestor, IngestBatch};
use tokio_util::sync::CancellationToken;

use crate::error::PipelineError;

/// Text to fixed-width vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError>;
}

/// Structured text generation. Returns the model's raw text, which the
/// caller parses against `response_schema`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        response_schema: &serde_json::Value,
    ) -> Result<String, PipelineError>;
}

/// At-least-once dispatch of an HTTP callback.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn create_task(&self, envelope: &TaskEnvelope) -> Result<(), PipelineError>;
}

/// Posts one HTML-formatted message to one channel.
#[async_trait]
pub trait ChannelPoster: Send + Sync {
    async fn send_message(&self, channel: &str, html: &str) -> Result<(), PipelineError>;
}

/// Append-only run log backing the ingestion watermark.
#[async_trait]
pub trait RunStore: Send + Sync {
    async fn latest_run_timestamp(&self) -> Result<Option<DateTime<Utc>>, PipelineError>;
    async fn insert_run_record(&self, record: &RunRecord) -> Result<(), PipelineError>;
}

/// Vector store queried by the dedup filter.
#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    /// Whether any stored vector has cosine similarity `>= threshold`.
    async fn similar_exists(&self, embedding: &[f32], threshold: f64)
        -> Result<bool, PipelineError>;
    async fn insert(&self, record: &DedupRecord) -> Result<(), PipelineError>;
    /// Remove records accepted before `cutoff`; returns how many.
    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, PipelineError>;
}

/// Produces the articles for one fetch window.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch_articles(
        &self,
        after: DateTime<Utc>,
        before: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<IngestBatch, PipelineError>;
}

#[async_trait]
impl ArticleSource for FeedIngestor {
    async fn fetch_articles(
        &self,
        after: DateTime<Utc>,
        before: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<IngestBatch, PipelineError> {
        FeedIngestor::fetch_articles(self, after, before, cancel)
            .await
            .map_err(PipelineError::from)
    }
}
