//! Similarity-based dedup of accepted summaries.
//!
//! A summary is a duplicate when any stored embedding has cosine similarity
//! `>= threshold` with it. The check and the insert are two separate calls to
//! the index, so two near-identical summaries filtered at the same moment can
//! both be accepted.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use feedwire_core::{cancellable, Cancelled, DedupRecord, Summary};
use tokio_util::sync::CancellationToken;

use crate::collaborators::{Embedder, SimilarityIndex};
use crate::error::PipelineError;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupDecision {
    /// No similar record existed; the summary is now recorded.
    Unique,
    /// A stored record is at least as similar as the threshold.
    Duplicate,
    /// Embedding, lookup, or insert failed; the summary is treated as not
    /// unique so nothing questionable reaches the channels.
    Suppressed { reason: String },
}

impl DedupDecision {
    #[must_use]
    pub fn is_unique(&self) -> bool {
        matches!(self, DedupDecision::Unique)
    }
}

#[derive(Clone)]
pub struct SimilarityFilter {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn SimilarityIndex>,
    threshold: f64,
}

impl SimilarityFilter {
    #[must_use]
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn SimilarityIndex>, threshold: f64) -> Self {
        Self {
            embedder,
            index,
            threshold,
        }
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Record `summary` unless something similar is already stored.
    ///
    /// The English text is embedded. Collaborator failures never surface as
    /// errors; they yield [`DedupDecision::Suppressed`].
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if `cancel` fires before a decision is made.
    pub async fn add_if_unique(
        &self,
        summary: &Summary,
        cancel: &CancellationToken,
    ) -> Result<DedupDecision, Cancelled> {
        match cancellable(cancel, self.check_and_insert(summary)).await? {
            Ok(decision) => {
                tracing::info!(url = %summary.url, ?decision, "dedup decision");
                Ok(decision)
            }
            Err(e) => {
                tracing::error!(url = %summary.url, error = %e, "dedup failed; suppressing summary");
                Ok(DedupDecision::Suppressed {
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn check_and_insert(&self, summary: &Summary) -> Result<DedupDecision, PipelineError> {
        let embedding = self.embedder.embed(&summary.english).await?;

        if self.index.similar_exists(&embedding, self.threshold).await? {
            return Ok(DedupDecision::Duplicate);
        }

        let record = DedupRecord {
            id: summary.url.clone(),
            summary: summary.english.clone(),
            published_at: summary.published_at,
            embedding,
            created_at: Utc::now(),
        };
        self.index.insert(&record).await?;
        Ok(DedupDecision::Unique)
    }

    /// Delete records accepted before `cutoff`. Not part of the accept path.
    ///
    /// # Errors
    ///
    /// Returns the index error, or [`PipelineError::Cancelled`].
    pub async fn remove_records_before(
        &self,
        cutoff: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<u64, PipelineError> {
        let removed = cancellable(cancel, self.index.delete_before(cutoff)).await??;
        tracing::info!(%cutoff, removed, "dedup retention sweep complete");
        Ok(removed)
    }
}

/// Cosine similarity of two equal-length vectors. Zero vectors and length
/// mismatches score 0.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
