//! Stage drivers for the feedwire pipeline and the clients they call.
//!
//! Work moves fetch → build-summary → filter-summary → post-summary, each
//! hop a queued HTTP task. The [`collaborators`] traits are the seams; the
//! client modules implement them against real services and [`memory`]
//! implements them in-process.

pub mod app;
pub mod cloud_tasks;
pub mod collaborators;
pub mod dedup;
pub mod delivery;
pub mod error;
pub mod memory;
pub mod openai;
pub mod publisher;
pub mod stages;
pub mod store;
pub mod summarize;
pub mod tei;
pub mod telegram;

pub use app::{
    Pipeline, BUILD_SUMMARY_STAGE, FETCH_ARTICLES_STAGE, FILTER_SUMMARY_STAGE, POST_SUMMARY_STAGE,
};
pub use collaborators::{
    ArticleSource, ChannelPoster, Embedder, RunStore, SimilarityIndex, TaskQueue, TextGenerator,
};
pub use dedup::{cosine_similarity, DedupDecision, SimilarityFilter, DEFAULT_SIMILARITY_THRESHOLD};
pub use delivery::{format_message, route, Deliverer, Language};
pub use error::PipelineError;
pub use publisher::TaskPublisher;
pub use stages::{BuildSummaryStage, FetchReport, FetchStage, FilterStage, PostStage};
pub use summarize::Summarizer;
