//! Handlers for the four stage callbacks. Each request runs under a child of
//! the shutdown token so a draining server answers 503 and the queue retries.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::{DateTime, Utc};
use feedwire_core::{Article, Summary};
use feedwire_pipeline::{
    DedupDecision, BUILD_SUMMARY_STAGE, FETCH_ARTICLES_STAGE, FILTER_SUMMARY_STAGE,
    POST_SUMMARY_STAGE,
};
use serde::Serialize;

use super::{map_stage_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Serialize)]
pub(super) struct FetchData {
    run_id: String,
    after: DateTime<Utc>,
    before: DateTime<Utc>,
    articles: usize,
    published: usize,
    publish_failures: usize,
    failed_sources: usize,
}

#[derive(Debug, Serialize)]
pub(super) struct SummaryData {
    url: String,
    tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct FilterData {
    url: String,
    decision: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct PostData {
    url: String,
    channels: usize,
}

fn ok<T: Serialize>(req_id: String, data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::OK,
        Json(ApiResponse {
            data,
            meta: ResponseMeta::new(req_id),
        }),
    )
}

pub(super) async fn fetch_articles(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    let cancel = state.shutdown.child_token();
    let report = state
        .pipeline
        .fetch
        .run(&cancel)
        .await
        .map_err(|e| map_stage_error(req_id.0.clone(), FETCH_ARTICLES_STAGE, &e))?;

    Ok(ok(
        req_id.0,
        FetchData {
            run_id: report.run_id,
            after: report.after,
            before: report.before,
            articles: report.articles,
            published: report.published,
            publish_failures: report.publish_failures,
            failed_sources: report.failed_sources,
        },
    ))
}

pub(super) async fn build_summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(article): Json<Article>,
) -> Result<impl IntoResponse, ApiError> {
    let cancel = state.shutdown.child_token();
    let summary = state
        .pipeline
        .build_summary
        .handle(&article, &cancel)
        .await
        .map_err(|e| map_stage_error(req_id.0.clone(), BUILD_SUMMARY_STAGE, &e))?;

    Ok(ok(
        req_id.0,
        SummaryData {
            url: summary.url,
            tags: summary.tags,
        },
    ))
}

pub(super) async fn filter_summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(summary): Json<Summary>,
) -> Result<impl IntoResponse, ApiError> {
    let cancel = state.shutdown.child_token();
    let decision = state
        .pipeline
        .filter
        .handle(&summary, &cancel)
        .await
        .map_err(|e| map_stage_error(req_id.0.clone(), FILTER_SUMMARY_STAGE, &e))?;

    let (decision, reason) = match decision {
        DedupDecision::Unique => ("unique", None),
        DedupDecision::Duplicate => ("duplicate", None),
        DedupDecision::Suppressed { reason } => ("suppressed", Some(reason)),
    };
    Ok(ok(
        req_id.0,
        FilterData {
            url: summary.url,
            decision,
            reason,
        },
    ))
}

pub(super) async fn post_summary(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(summary): Json<Summary>,
) -> Result<impl IntoResponse, ApiError> {
    let cancel = state.shutdown.child_token();
    let channels = state
        .pipeline
        .post
        .handle(&summary, &cancel)
        .await
        .map_err(|e| map_stage_error(req_id.0.clone(), POST_SUMMARY_STAGE, &e))?;

    Ok(ok(
        req_id.0,
        PostData {
            url: summary.url,
            channels,
        },
    ))
}
