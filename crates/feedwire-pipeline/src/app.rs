//! Builds the stage drivers from one [`AppConfig`].

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use feedwire_core::{AppConfig, SourceConfig};
use feedwire_ingest::FeedIngestor;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::cloud_tasks::CloudTasksClient;
use crate::dedup::SimilarityFilter;
use crate::delivery::Deliverer;
use crate::error::PipelineError;
use crate::openai::OpenAiClient;
use crate::publisher::TaskPublisher;
use crate::stages::{BuildSummaryStage, FetchStage, FilterStage, PostStage};
use crate::store::{PgRunStore, PgSimilarityIndex};
use crate::summarize::Summarizer;
use crate::tei::TeiClient;
use crate::telegram::TelegramClient;

pub const FETCH_ARTICLES_STAGE: &str = "fetch-articles";
pub const BUILD_SUMMARY_STAGE: &str = "build-summary";
pub const FILTER_SUMMARY_STAGE: &str = "filter-summary";
pub const POST_SUMMARY_STAGE: &str = "post-summary";

pub struct Pipeline {
    pub fetch: FetchStage,
    pub build_summary: BuildSummaryStage,
    pub filter: FilterStage,
    pub post: PostStage,
    retention: Duration,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        fetch: FetchStage,
        build_summary: BuildSummaryStage,
        filter: FilterStage,
        post: PostStage,
        retention: Duration,
    ) -> Self {
        Self {
            fetch,
            build_summary,
            filter,
            post,
            retention,
        }
    }

    /// Wire production clients: feeds over HTTP, Postgres for runs and
    /// embeddings, TEI, the generation endpoint, Cloud Tasks, and Telegram
    /// when delivery is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built, a source selector
    /// is invalid, or the lookback or retention period does not fit a
    /// duration.
    pub fn from_config(
        config: &AppConfig,
        pool: PgPool,
        sources: Vec<SourceConfig>,
    ) -> Result<Self, PipelineError> {
        let timeout = config.http_timeout_secs;
        let lookback = Duration::try_minutes(config.lookback_minutes).ok_or_else(|| {
            PipelineError::Config(format!("lookback of {} minutes", config.lookback_minutes))
        })?;
        let retention = Duration::try_days(config.retention_days).ok_or_else(|| {
            PipelineError::Config(format!("retention of {} days", config.retention_days))
        })?;

        let ingestor = FeedIngestor::new(sources, timeout, &config.user_agent)?;
        let queue = Arc::new(CloudTasksClient::new(config.queue.clone(), timeout)?);
        let publisher = TaskPublisher::new(queue);
        let embedder = Arc::new(TeiClient::new(&config.tei_url, config.embedding_dim, timeout)?);
        let generator = Arc::new(OpenAiClient::new(&config.generation, timeout)?);

        let deliverer = match &config.delivery {
            Some(delivery) => {
                let poster =
                    TelegramClient::new(&delivery.api_base_url, &delivery.bot_token, timeout)?;
                Some(Deliverer::new(Arc::new(poster), delivery.clone()))
            }
            None => None,
        };

        let fetch = FetchStage::new(
            Arc::new(ingestor),
            Arc::new(PgRunStore::new(pool.clone())),
            publisher.clone(),
            config.stage_url(BUILD_SUMMARY_STAGE),
            lookback,
        );
        let build_summary = BuildSummaryStage::new(
            Summarizer::new(generator),
            publisher.clone(),
            config.stage_url(FILTER_SUMMARY_STAGE),
        );
        let filter = FilterStage::new(
            SimilarityFilter::new(
                embedder,
                Arc::new(PgSimilarityIndex::new(pool)),
                config.similarity_threshold,
            ),
            publisher,
            config.stage_url(POST_SUMMARY_STAGE),
        );

        Ok(Self::new(
            fetch,
            build_summary,
            filter,
            PostStage::new(deliverer),
            retention,
        ))
    }

    /// Oldest acceptance time a retention sweep at `now` keeps. A retention
    /// reaching past the earliest representable time keeps everything.
    #[must_use]
    pub fn retention_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.retention)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Delete dedup records older than the retention period.
    ///
    /// # Errors
    ///
    /// Returns the store error or [`PipelineError::Cancelled`].
    pub async fn sweep(&self, cancel: &CancellationToken) -> Result<u64, PipelineError> {
        let cutoff = self.retention_cutoff(Utc::now());
        self.filter.filter().remove_records_before(cutoff, cancel).await
    }
}
