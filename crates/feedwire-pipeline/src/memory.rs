//! In-memory collaborators for tests and local dry runs.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use feedwire_core::{DedupRecord, RunRecord, TaskEnvelope};
use tokio::sync::Mutex;

use crate::collaborators::{ChannelPoster, RunStore, SimilarityIndex, TaskQueue};
use crate::dedup::cosine_similarity;
use crate::error::PipelineError;

#[derive(Default)]
pub struct MemoryRunStore {
    runs: Mutex<Vec<RunRecord>>,
}

impl MemoryRunStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with one recorded run at `ran_at`.
    #[must_use]
    pub fn with_watermark(ran_at: DateTime<Utc>) -> Self {
        Self {
            runs: Mutex::new(vec![RunRecord {
                run_id: "seed".to_string(),
                ran_at,
            }]),
        }
    }

    pub async fn records(&self) -> Vec<RunRecord> {
        self.runs.lock().await.clone()
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn latest_run_timestamp(&self) -> Result<Option<DateTime<Utc>>, PipelineError> {
        Ok(self.runs.lock().await.iter().map(|r| r.ran_at).max())
    }

    async fn insert_run_record(&self, record: &RunRecord) -> Result<(), PipelineError> {
        self.runs.lock().await.push(record.clone());
        Ok(())
    }
}

/// Exhaustive cosine scan over stored records.
#[derive(Default)]
pub struct MemorySimilarityIndex {
    records: Mutex<Vec<DedupRecord>>,
}

impl MemorySimilarityIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<DedupRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl SimilarityIndex for MemorySimilarityIndex {
    async fn similar_exists(
        &self,
        embedding: &[f32],
        threshold: f64,
    ) -> Result<bool, PipelineError> {
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .any(|r| cosine_similarity(&r.embedding, embedding) >= threshold))
    }

    async fn insert(&self, record: &DedupRecord) -> Result<(), PipelineError> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, PipelineError> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|r| r.created_at >= cutoff);
        Ok((before - records.len()) as u64)
    }
}

/// Records every envelope it accepts. Scripted failures are consumed one per
/// call, front first.
#[derive(Default)]
pub struct MemoryTaskQueue {
    accepted: Mutex<Vec<TaskEnvelope>>,
    failures: Mutex<VecDeque<String>>,
    attempts: Mutex<u32>,
}

impl MemoryTaskQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` calls.
    #[must_use]
    pub fn failing(count: usize) -> Self {
        Self {
            failures: Mutex::new((0..count).map(|i| format!("scripted failure {}", i + 1)).collect()),
            ..Self::default()
        }
    }

    pub async fn accepted(&self) -> Vec<TaskEnvelope> {
        self.accepted.lock().await.clone()
    }

    /// Total calls, failed ones included.
    pub async fn attempts(&self) -> u32 {
        *self.attempts.lock().await
    }
}

#[async_trait]
impl TaskQueue for MemoryTaskQueue {
    async fn create_task(&self, envelope: &TaskEnvelope) -> Result<(), PipelineError> {
        *self.attempts.lock().await += 1;
        if let Some(reason) = self.failures.lock().await.pop_front() {
            return Err(PipelineError::Queue(reason));
        }
        self.accepted.lock().await.push(envelope.clone());
        Ok(())
    }
}

/// Collects `(channel, html)` pairs; channels listed in `rejecting` fail.
#[derive(Default)]
pub struct MemoryChannelPoster {
    sent: Mutex<Vec<(String, String)>>,
    rejecting: Vec<String>,
}

impl MemoryChannelPoster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn rejecting(channels: &[&str]) -> Self {
        Self {
            rejecting: channels.iter().map(|c| (*c).to_string()).collect(),
            ..Self::default()
        }
    }

    pub async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl ChannelPoster for MemoryChannelPoster {
    async fn send_message(&self, channel: &str, html: &str) -> Result<(), PipelineError> {
        if self.rejecting.iter().any(|c| c == channel) {
            return Err(PipelineError::Delivery {
                channel: channel.to_string(),
                reason: "rejected".to_string(),
            });
        }
        self.sent
            .lock()
            .await
            .push((channel.to_string(), html.to_string()));
        Ok(())
    }
}
