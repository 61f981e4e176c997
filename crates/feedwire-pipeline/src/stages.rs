//! The four stage drivers. Each handles one inbound message and keeps no
//! state between calls.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use feedwire_core::{cancellable, Article, QueueId, RunRecord, Summary};
use tokio_util::sync::CancellationToken;

use crate::collaborators::{ArticleSource, RunStore};
use crate::dedup::{DedupDecision, SimilarityFilter};
use crate::delivery::Deliverer;
use crate::error::PipelineError;
use crate::publisher::TaskPublisher;
use crate::summarize::Summarizer;

/// Outcome of one fetch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub run_id: String,
    pub after: DateTime<Utc>,
    pub before: DateTime<Utc>,
    pub articles: usize,
    pub published: usize,
    pub publish_failures: usize,
    pub failed_sources: usize,
}

pub struct FetchStage {
    source: Arc<dyn ArticleSource>,
    runs: Arc<dyn RunStore>,
    publisher: TaskPublisher,
    build_summary_url: String,
    lookback: Duration,
}

impl FetchStage {
    #[must_use]
    pub fn new(
        source: Arc<dyn ArticleSource>,
        runs: Arc<dyn RunStore>,
        publisher: TaskPublisher,
        build_summary_url: String,
        lookback: Duration,
    ) -> Self {
        Self {
            source,
            runs,
            publisher,
            build_summary_url,
            lookback,
        }
    }

    /// # Errors
    ///
    /// See [`FetchStage::run_at`].
    pub async fn run(&self, cancel: &CancellationToken) -> Result<FetchReport, PipelineError> {
        self.run_at(Utc::now(), cancel).await
    }

    /// Fetch `(watermark, now]` and fan every article out to the
    /// build-summary queue, then record the run at `now`.
    ///
    /// With no previous run the window starts `lookback` before `now`.
    /// A failed publish is logged and counted; the run continues.
    ///
    /// # Errors
    ///
    /// Returns the error when the watermark cannot be read, ingestion fails
    /// as a whole, the run record cannot be written, or `cancel` fires. In
    /// every case no run is recorded, so the next run covers the same window.
    pub async fn run_at(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<FetchReport, PipelineError> {
        let after = cancellable(cancel, self.runs.latest_run_timestamp())
            .await??
            .unwrap_or_else(|| {
                now.checked_sub_signed(self.lookback)
                    .unwrap_or(DateTime::<Utc>::MIN_UTC)
            });
        let before = now;
        tracing::info!(%after, %before, "fetch stage started");

        let batch = match self.source.fetch_articles(after, before, cancel).await {
            Ok(batch) => batch,
            Err(e) => {
                if !e.is_cancelled() {
                    tracing::error!(%after, %before, error = %e, "ingestion failed; run not recorded");
                }
                return Err(e);
            }
        };

        let mut published = 0usize;
        let mut publish_failures = 0usize;
        for article in &batch.articles {
            match self
                .publisher
                .publish(QueueId::BuildSummary, &self.build_summary_url, article, cancel)
                .await
            {
                Ok(()) => published += 1,
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    publish_failures += 1;
                    tracing::error!(url = %article.url, title = %article.title, error = %e, "failed to enqueue article");
                }
            }
        }

        let record = RunRecord {
            run_id: uuid::Uuid::new_v4().simple().to_string(),
            ran_at: now,
        };
        cancellable(cancel, self.runs.insert_run_record(&record)).await??;

        let report = FetchReport {
            run_id: record.run_id,
            after,
            before,
            articles: batch.articles.len(),
            published,
            publish_failures,
            failed_sources: batch.failed_sources(),
        };
        tracing::info!(
            run_id = %report.run_id,
            articles = report.articles,
            published = report.published,
            publish_failures = report.publish_failures,
            failed_sources = report.failed_sources,
            "fetch stage complete"
        );
        Ok(report)
    }
}

pub struct BuildSummaryStage {
    summarizer: Summarizer,
    publisher: TaskPublisher,
    filter_summary_url: String,
}

impl BuildSummaryStage {
    #[must_use]
    pub fn new(summarizer: Summarizer, publisher: TaskPublisher, filter_summary_url: String) -> Self {
        Self {
            summarizer,
            publisher,
            filter_summary_url,
        }
    }

    /// Summarize one article and hand the summary to the filter queue.
    ///
    /// # Errors
    ///
    /// Returns generation, parse, or publish failures so the queue redelivers.
    pub async fn handle(
        &self,
        article: &Article,
        cancel: &CancellationToken,
    ) -> Result<Summary, PipelineError> {
        let summary = self.summarizer.build_summary(article, cancel).await?;
        self.publisher
            .publish(QueueId::FilterSummary, &self.filter_summary_url, &summary, cancel)
            .await?;
        Ok(summary)
    }
}

pub struct FilterStage {
    filter: SimilarityFilter,
    publisher: TaskPublisher,
    post_summary_url: String,
}

impl FilterStage {
    #[must_use]
    pub fn new(filter: SimilarityFilter, publisher: TaskPublisher, post_summary_url: String) -> Self {
        Self {
            filter,
            publisher,
            post_summary_url,
        }
    }

    /// Forward `summary` to the post queue only if the filter accepts it.
    /// Duplicates and suppressed summaries end here successfully.
    ///
    /// # Errors
    ///
    /// Returns publish failures and [`PipelineError::Cancelled`]. After a
    /// publish failure the summary is already recorded, so a redelivery is
    /// judged a duplicate.
    pub async fn handle(
        &self,
        summary: &Summary,
        cancel: &CancellationToken,
    ) -> Result<DedupDecision, PipelineError> {
        tracing::info!(url = %summary.url, "filtering summary");
        let decision = self.filter.add_if_unique(summary, cancel).await?;

        if decision.is_unique() {
            self.publisher
                .publish(QueueId::PostSummary, &self.post_summary_url, summary, cancel)
                .await?;
        } else {
            tracing::info!(url = %summary.url, ?decision, "summary not forwarded");
        }
        Ok(decision)
    }

    #[must_use]
    pub fn filter(&self) -> &SimilarityFilter {
        &self.filter
    }
}

pub struct PostStage {
    deliverer: Option<Deliverer>,
}

impl PostStage {
    #[must_use]
    pub fn new(deliverer: Option<Deliverer>) -> Self {
        Self { deliverer }
    }

    /// Deliver `summary`; returns how many channels were posted to.
    ///
    /// # Errors
    ///
    /// Returns the first channel failure or [`PipelineError::Cancelled`].
    pub async fn handle(
        &self,
        summary: &Summary,
        cancel: &CancellationToken,
    ) -> Result<usize, PipelineError> {
        match &self.deliverer {
            Some(deliverer) => deliverer.deliver(summary, cancel).await,
            None => {
                tracing::warn!(url = %summary.url, "delivery not configured; dropping summary");
                Ok(0)
            }
        }
    }
}
