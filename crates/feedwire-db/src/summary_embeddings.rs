//! Database operations for `summary_embeddings`, the similarity index behind
//! the dedup filter.
//!
//! Similarity is `1 - cosine_distance`, computed by pgvector's `<=>`
//! operator. The query vector and threshold are always bound parameters.

use chrono::{DateTime, Utc};
use feedwire_core::DedupRecord;
use pgvector::Vector;
use sqlx::PgPool;

use crate::DbError;

/// Width of the `embedding` column. Must match the migration.
pub const EMBEDDING_DIM: usize = 768;

fn check_dim(embedding: &[f32]) -> Result<(), DbError> {
    if embedding.len() == EMBEDDING_DIM {
        Ok(())
    } else {
        Err(DbError::DimensionMismatch {
            expected: EMBEDDING_DIM,
            actual: embedding.len(),
        })
    }
}

/// Whether any stored embedding has similarity `>= threshold` to `embedding`.
///
/// Existence check only; stops at the first matching row.
///
/// # Errors
///
/// Returns [`DbError::DimensionMismatch`] for a vector of the wrong width, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn similar_summary_exists(
    pool: &PgPool,
    embedding: &[f32],
    threshold: f64,
) -> Result<bool, DbError> {
    check_dim(embedding)?;
    let vector = Vector::from(embedding.to_vec());

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (\
             SELECT 1 FROM summary_embeddings \
             WHERE 1 - (embedding <=> $1) >= $2\
         )",
    )
    .bind(&vector)
    .bind(threshold)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Stores one accepted summary. `created_at` comes from the record so the
/// retention sweep ages rows by acceptance time.
///
/// # Errors
///
/// Returns [`DbError::DimensionMismatch`] for a vector of the wrong width, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn insert_summary_embedding(pool: &PgPool, record: &DedupRecord) -> Result<(), DbError> {
    check_dim(&record.embedding)?;
    let vector = Vector::from(record.embedding.clone());

    sqlx::query(
        "INSERT INTO summary_embeddings (url, summary, published_at, embedding, created_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&record.id)
    .bind(&record.summary)
    .bind(record.published_at)
    .bind(&vector)
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Deletes rows accepted before `cutoff`. Returns the number removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_embeddings_before(pool: &PgPool, cutoff: DateTime<Utc>) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM summary_embeddings WHERE created_at < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_summary_embeddings(pool: &PgPool) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM summary_embeddings")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
