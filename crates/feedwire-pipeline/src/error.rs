use feedwire_core::Cancelled;
use feedwire_db::DbError;
use feedwire_ingest::IngestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TEI embed error: {0}")]
    Tei(String),

    #[error("generation error: {0}")]
    Generation(String),

    /// The model answered, but not with the expected JSON shape.
    #[error("malformed generation output: {source}")]
    MalformedGeneration {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("task queue error: {0}")]
    Queue(String),

    #[error("delivery to {channel} failed: {reason}")]
    Delivery { channel: String, reason: String },

    #[error("failed to serialize payload: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Ingest(IngestError),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl PipelineError {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled(_))
    }
}

impl From<IngestError> for PipelineError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::Cancelled(c) => PipelineError::Cancelled(c),
            other => PipelineError::Ingest(other),
        }
    }
}
