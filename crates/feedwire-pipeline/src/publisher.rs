use std::sync::Arc;

use chrono::Utc;
use feedwire_core::{retry_fixed, QueueId, RetryPolicy, TaskEnvelope};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::collaborators::TaskQueue;
use crate::error::PipelineError;

/// Hands payloads to the next stage through a [`TaskQueue`].
///
/// Each publish is retried under the configured [`RetryPolicy`] (three
/// attempts, two seconds apart by default). The final failure is returned to
/// the caller, who decides whether to keep going.
#[derive(Clone)]
pub struct TaskPublisher {
    queue: Arc<dyn TaskQueue>,
    retry: RetryPolicy,
}

impl TaskPublisher {
    #[must_use]
    pub fn new(queue: Arc<dyn TaskQueue>) -> Self {
        Self {
            queue,
            retry: RetryPolicy::STANDARD,
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Serialize `payload` and enqueue it for `destination_url`, dispatching
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Serialize`] if the payload cannot be encoded,
    /// [`PipelineError::Cancelled`] if `cancel` fires, or the queue error of
    /// the last attempt.
    pub async fn publish<T: Serialize + Sync>(
        &self,
        queue: QueueId,
        destination_url: &str,
        payload: &T,
        cancel: &CancellationToken,
    ) -> Result<(), PipelineError> {
        let body = serde_json::to_string(payload).map_err(PipelineError::Serialize)?;
        let envelope = TaskEnvelope {
            queue,
            destination_url: destination_url.to_string(),
            body,
            schedule_time: Utc::now(),
        };

        let what = format!("publish to {queue}");
        retry_fixed(self.retry, cancel, &what, |attempt| {
            tracing::debug!(queue = %queue, attempt, "creating task");
            self.queue.create_task(&envelope)
        })
        .await?;

        tracing::info!(queue = %queue, destination = %destination_url, "task published");
        Ok(())
    }
}
