//! Pipeline payloads and store records.
//!
//! [`Article`] and [`Summary`] travel between stages as JSON message bodies.
//! Their PascalCase keys are a wire contract: a message enqueued by one
//! deployment must deserialize in the next, so renames here are breaking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A feed entry that survived windowing and per-run URL dedup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Article {
    pub source: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub media: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub media_type: Option<String>,
}

/// The generation collaborator's structured answer for one article.
///
/// Field names mirror the keys of the response schema sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSummary {
    #[serde(rename = "03_rewritten_english_summary")]
    pub english: String,
    #[serde(rename = "05_rewritten_russian_translation")]
    pub russian: String,
    #[serde(rename = "06_tags", default)]
    pub tags: Vec<String>,
    #[serde(rename = "08_publish_in_good_vibe_news_channel")]
    pub publish_in_good_vibe_news_channel: bool,
    #[serde(rename = "10_publish_in_news_highlights_channel")]
    pub publish_in_news_highlights_channel: bool,
}

/// A bilingual rewrite of one [`Article`], ready for dedup and delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Summary {
    pub source: String,
    pub english: String,
    pub russian: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub media: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub media_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub publish_in_good_vibe_news_channel: bool,
    pub publish_in_news_highlights_channel: bool,
}

impl Summary {
    /// Combine an article with the model's rewrite of it.
    #[must_use]
    pub fn from_article(article: &Article, generated: GeneratedSummary) -> Self {
        Self {
            source: article.source.clone(),
            english: generated.english,
            russian: generated.russian,
            published_at: article.published_at,
            url: article.url.clone(),
            media: article.media.clone(),
            media_type: article.media_type.clone(),
            tags: generated.tags,
            publish_in_good_vibe_news_channel: generated.publish_in_good_vibe_news_channel,
            publish_in_news_highlights_channel: generated.publish_in_news_highlights_channel,
        }
    }
}

/// One successful fetch run. The newest `ran_at` is the ingestion watermark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub run_id: String,
    pub ran_at: DateTime<Utc>,
}

/// An accepted summary as stored in the similarity index.
#[derive(Debug, Clone, PartialEq)]
pub struct DedupRecord {
    /// Canonical article URL.
    pub id: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
    pub embedding: Vec<f32>,
    pub created_at: DateTime<Utc>,
}

/// Older producers wrote `""` for "no media"; treat it the same as absent.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
