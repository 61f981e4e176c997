use chrono::{DateTime, Utc};

/// The three hand-off queues between pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueId {
    BuildSummary,
    FilterSummary,
    PostSummary,
}

impl QueueId {
    /// Default queue name as provisioned in the task service.
    #[must_use]
    pub fn default_name(self) -> &'static str {
        match self {
            QueueId::BuildSummary => "buildSummary",
            QueueId::FilterSummary => "filterSummary",
            QueueId::PostSummary => "postSummary",
        }
    }
}

impl std::fmt::Display for QueueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.default_name())
    }
}

/// A single message handed to the task queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEnvelope {
    pub queue: QueueId,
    /// Stage endpoint the queue will POST `body` to.
    pub destination_url: String,
    /// Serialized JSON payload.
    pub body: String,
    pub schedule_time: DateTime<Utc>,
}
