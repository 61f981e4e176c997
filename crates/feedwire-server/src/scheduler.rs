//! Background job scheduler.
//!
//! Registers the dedup retention sweep and, when `FEEDWIRE_FETCH_CRON` is
//! set, an in-process fetch run for deployments without an external trigger.

use std::sync::Arc;

use feedwire_core::AppConfig;
use feedwire_pipeline::Pipeline;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tokio_util::sync::CancellationToken;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    pipeline: Arc<Pipeline>,
    config: &AppConfig,
    shutdown: CancellationToken,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_retention_job(
        &scheduler,
        &config.retention_cron,
        Arc::clone(&pipeline),
        shutdown.clone(),
    )
    .await?;
    if let Some(cron) = &config.fetch_cron {
        register_fetch_job(&scheduler, cron, pipeline, shutdown).await?;
    }

    scheduler.start().await?;
    Ok(scheduler)
}

async fn register_retention_job(
    scheduler: &JobScheduler,
    cron: &str,
    pipeline: Arc<Pipeline>,
    shutdown: CancellationToken,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pipeline = Arc::clone(&pipeline);
        let cancel = shutdown.child_token();

        Box::pin(async move {
            tracing::info!("scheduler: starting dedup retention sweep");
            match pipeline.sweep(&cancel).await {
                Ok(removed) => tracing::info!(removed, "scheduler: retention sweep complete"),
                Err(e) if e.is_cancelled() => tracing::warn!("scheduler: retention sweep cancelled"),
                Err(e) => tracing::error!(error = %e, "scheduler: retention sweep failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: retention sweep registered");
    Ok(())
}

async fn register_fetch_job(
    scheduler: &JobScheduler,
    cron: &str,
    pipeline: Arc<Pipeline>,
    shutdown: CancellationToken,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pipeline = Arc::clone(&pipeline);
        let cancel = shutdown.child_token();

        Box::pin(async move {
            match pipeline.fetch.run(&cancel).await {
                Ok(report) => tracing::info!(
                    run_id = %report.run_id,
                    published = report.published,
                    "scheduler: fetch run complete"
                ),
                Err(e) if e.is_cancelled() => tracing::warn!("scheduler: fetch run cancelled"),
                Err(e) => tracing::error!(error = %e, "scheduler: fetch run failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: fetch job registered");
    Ok(())
}
