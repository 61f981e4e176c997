//! Database operations for `pipeline_runs`, the ingestion watermark log.

use chrono::{DateTime, Utc};
use feedwire_core::RunRecord;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
struct RunRow {
    run_id: String,
    ran_at: DateTime<Utc>,
}

impl From<RunRow> for RunRecord {
    fn from(row: RunRow) -> Self {
        Self {
            run_id: row.run_id,
            ran_at: row.ran_at,
        }
    }
}

/// Returns the newest `ran_at`, or `None` before the first successful run.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_run_timestamp(pool: &PgPool) -> Result<Option<DateTime<Utc>>, DbError> {
    let ts = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
        "SELECT MAX(ran_at) FROM pipeline_runs",
    )
    .fetch_one(pool)
    .await?;

    Ok(ts)
}

/// Appends a run record. Run ids are unique; re-inserting one is an error.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_run_record(pool: &PgPool, record: &RunRecord) -> Result<(), DbError> {
    sqlx::query("INSERT INTO pipeline_runs (run_id, ran_at) VALUES ($1, $2)")
        .bind(&record.run_id)
        .bind(record.ran_at)
        .execute(pool)
        .await?;

    Ok(())
}

/// Most recent runs first, at most `limit` rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_runs(pool: &PgPool, limit: i64) -> Result<Vec<RunRecord>, DbError> {
    let rows = sqlx::query_as::<_, RunRow>(
        "SELECT run_id, ran_at FROM pipeline_runs ORDER BY ran_at DESC, run_id LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(RunRecord::from).collect())
}
