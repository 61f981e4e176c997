//! Command bodies. Each one loads what it needs from `AppConfig` and runs the
//! same code path the server would.

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use feedwire_core::{AppConfig, Article};
use feedwire_ingest::{FeedIngestor, SourceOutcome, SourceReport};
use feedwire_pipeline::Pipeline;
use tokio_util::sync::CancellationToken;

/// `(after, before]` for a dry run ending at `now`.
pub(crate) fn preview_window(
    now: DateTime<Utc>,
    lookback_minutes: i64,
) -> anyhow::Result<(DateTime<Utc>, DateTime<Utc>)> {
    let after = Duration::try_minutes(lookback_minutes)
        .filter(|lookback| *lookback > Duration::zero())
        .and_then(|lookback| now.checked_sub_signed(lookback))
        .with_context(|| format!("invalid lookback of {lookback_minutes} minutes"))?;
    Ok((after, now))
}

pub(crate) fn article_line(article: &Article) -> String {
    format!(
        "{}  {:<16}  {}  <{}>",
        article.published_at.format("%Y-%m-%d %H:%M"),
        article.source,
        article.title,
        article.url
    )
}

pub(crate) fn report_line(report: &SourceReport) -> String {
    match &report.outcome {
        SourceOutcome::Fetched { entries, accepted } => {
            format!("{}: {accepted}/{entries} entries in window", report.source)
        }
        SourceOutcome::Failed { attempts, error } => {
            format!("{}: FAILED after {attempts} attempts: {error}", report.source)
        }
    }
}

async fn build_pipeline(config: &AppConfig) -> anyhow::Result<Pipeline> {
    let pool = feedwire_db::connect_pool_from_config(config).await?;
    let sources = feedwire_core::load_sources(&config.sources_path)?.sources;
    Pipeline::from_config(config, pool, sources).context("failed to build pipeline")
}

/// Read every feed over the lookback window and print what the fetch stage
/// would enqueue. Touches neither the database nor the queue.
pub(crate) async fn run_fetch_preview(
    config: &AppConfig,
    lookback_minutes: Option<i64>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let sources = feedwire_core::load_sources(&config.sources_path)?.sources;
    let ingestor = FeedIngestor::new(sources, config.http_timeout_secs, &config.user_agent)?;

    let (after, before) =
        preview_window(Utc::now(), lookback_minutes.unwrap_or(config.lookback_minutes))?;
    let batch = ingestor.fetch_articles(after, before, cancel).await?;

    for report in &batch.reports {
        println!("{}", report_line(report));
    }
    println!();
    for article in &batch.articles {
        println!("{}", article_line(article));
    }
    println!("\n{} articles in ({after}, {before}]", batch.articles.len());
    Ok(())
}

pub(crate) async fn run_fetch(config: &AppConfig, cancel: &CancellationToken) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config).await?;
    let report = pipeline.fetch.run(cancel).await?;

    println!(
        "run {}: {} articles in ({}, {}], {} enqueued, {} publish failures, {} failed sources",
        report.run_id,
        report.articles,
        report.after,
        report.before,
        report.published,
        report.publish_failures,
        report.failed_sources
    );
    Ok(())
}

pub(crate) async fn run_sweep(config: &AppConfig, cancel: &CancellationToken) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config).await?;
    let removed = pipeline.sweep(cancel).await?;
    println!("removed {removed} dedup records");
    Ok(())
}

pub(crate) async fn list_runs(config: &AppConfig, limit: i64) -> anyhow::Result<()> {
    let pool = feedwire_db::connect_pool_from_config(config).await?;
    let runs = feedwire_db::list_recent_runs(&pool, limit).await?;

    if runs.is_empty() {
        println!("no runs recorded");
    }
    for run in runs {
        println!("{}  {}", run.ran_at.to_rfc3339(), run.run_id);
    }
    Ok(())
}
