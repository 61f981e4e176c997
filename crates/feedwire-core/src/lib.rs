//! Shared domain types, configuration, and async helpers for feedwire.

pub mod app_config;
pub mod config;
pub mod queue;
pub mod retry;
pub mod sources;
pub mod types;

use thiserror::Error;

pub use app_config::{AppConfig, DeliveryConfig, Environment, GenerationConfig, QueueConfig};
pub use config::{
    load_app_config, load_app_config_from_env, MAX_LOOKBACK_MINUTES, MAX_RETENTION_DAYS,
};
pub use queue::{QueueId, TaskEnvelope};
pub use retry::{cancellable, retry_fixed, Cancelled, RetryPolicy};
pub use sources::{load_sources, SourceConfig, SourcesFile};
pub use types::{Article, DedupRecord, GeneratedSummary, RunRecord, Summary};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sources file {path}: {source}")]
    SourcesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sources file: {0}")]
    SourcesFileParse(#[from] serde_yaml::Error),

    #[error("sources validation failed: {0}")]
    Validation(String),
}
