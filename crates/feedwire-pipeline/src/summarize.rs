//! Article to bilingual [`Summary`] through the generation collaborator.

use std::sync::{Arc, LazyLock};

use chrono::SecondsFormat;
use feedwire_core::{cancellable, Article, GeneratedSummary, Summary};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::collaborators::TextGenerator;
use crate::error::PipelineError;

const SYSTEM_PROMPT: &str = include_str!("../prompts/build-summary-system.prompt");
const REQUEST_TEMPLATE: &str = include_str!("../prompts/build-summary-request.prompt");
const SCHEMA_JSON: &str = include_str!("../prompts/build-summary.json");

static RESPONSE_SCHEMA: LazyLock<Value> =
    LazyLock::new(|| serde_json::from_str(SCHEMA_JSON).expect("valid build-summary schema"));

#[derive(Clone)]
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
}

impl Summarizer {
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// # Errors
    ///
    /// Returns the generator's error, [`PipelineError::MalformedGeneration`]
    /// when the answer does not match the schema, or
    /// [`PipelineError::Cancelled`].
    pub async fn build_summary(
        &self,
        article: &Article,
        cancel: &CancellationToken,
    ) -> Result<Summary, PipelineError> {
        tracing::info!(url = %article.url, source = %article.source, "building summary");

        let request = request_prompt(article);
        let raw = cancellable(
            cancel,
            self.generator.generate(SYSTEM_PROMPT, &request, &RESPONSE_SCHEMA),
        )
        .await??;

        let generated = parse_generated(&raw)?;
        tracing::debug!(url = %article.url, tags = ?generated.tags, "summary generated");
        Ok(Summary::from_article(article, generated))
    }
}

/// Fill the request template in one pass so article text containing
/// `{placeholder}` sequences is never expanded.
#[must_use]
pub fn request_prompt(article: &Article) -> String {
    let published_at = article.published_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut out = String::with_capacity(REQUEST_TEMPLATE.len() + article.content.len());
    let mut rest = REQUEST_TEMPLATE;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find('}') else {
            out.push_str(tail);
            return out;
        };
        let value = match &tail[1..end] {
            "title" => Some(article.title.as_str()),
            "published_at" => Some(published_at.as_str()),
            "description" => Some(article.description.as_str()),
            "content" => Some(article.content.as_str()),
            "source" => Some(article.source.as_str()),
            _ => None,
        };
        match value {
            Some(v) => out.push_str(v),
            None => out.push_str(&tail[..=end]),
        }
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    out
}

/// Parse the model's answer, tolerating a Markdown code fence around it.
///
/// # Errors
///
/// Returns [`PipelineError::MalformedGeneration`] with the raw text attached.
pub fn parse_generated(raw: &str) -> Result<GeneratedSummary, PipelineError> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(body).map_err(|source| PipelineError::MalformedGeneration {
        raw: raw.to_string(),
        source,
    })
}
