//! Channel routing and message layout for accepted summaries.

use std::sync::Arc;

use feedwire_core::{cancellable, DeliveryConfig, Summary};
use tokio_util::sync::CancellationToken;

use crate::collaborators::ChannelPoster;
use crate::error::PipelineError;

const AI_NOTICE_EN: &str = "This text was automatically generated using AI technologies.";
const AI_NOTICE_RU: &str =
    "Этот текст был автоматически сгенерирован с использованием технологий ИИ.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Russian,
}

/// Escape text for Telegram's HTML parse mode.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Hashtag line, body, source link, AI notice; blank line between each.
#[must_use]
pub fn format_message(summary: &Summary, language: Language) -> String {
    let (body, notice) = match language {
        Language::English => (&summary.english, AI_NOTICE_EN),
        Language::Russian => (&summary.russian, AI_NOTICE_RU),
    };

    let tags = summary
        .tags
        .iter()
        .map(|t| t.trim().trim_start_matches('#'))
        .filter(|t| !t.is_empty())
        .map(|t| format!("#{}", escape_html(&t.replace(' ', "_"))))
        .collect::<Vec<_>>()
        .join(" ");

    let mut parts = Vec::with_capacity(4);
    if !tags.is_empty() {
        parts.push(tags);
    }
    parts.push(escape_html(body.trim()));
    parts.push(format!(
        "🔗 <a href=\"{}\">{}</a>",
        escape_html(&summary.url),
        escape_html(&summary.source)
    ));
    parts.push(format!("<i>{notice}</i>"));
    parts.join("\n\n")
}

/// Channels a summary goes to, in posting order, with the language of each.
#[must_use]
pub fn route(summary: &Summary, channels: &DeliveryConfig) -> Vec<(String, Language)> {
    let mut out = vec![
        (channels.all_news_english.clone(), Language::English),
        (channels.all_news_russian.clone(), Language::Russian),
    ];
    if summary.publish_in_news_highlights_channel {
        out.push((channels.highlights_english.clone(), Language::English));
        out.push((channels.highlights_russian.clone(), Language::Russian));
    }
    if summary.publish_in_good_vibe_news_channel {
        out.push((channels.good_vibe_english.clone(), Language::English));
        out.push((channels.good_vibe_russian.clone(), Language::Russian));
    }
    out
}

#[derive(Clone)]
pub struct Deliverer {
    poster: Arc<dyn ChannelPoster>,
    channels: DeliveryConfig,
}

impl Deliverer {
    #[must_use]
    pub fn new(poster: Arc<dyn ChannelPoster>, channels: DeliveryConfig) -> Self {
        Self { poster, channels }
    }

    /// Post `summary` to every routed channel in order.
    ///
    /// Stops at the first failing channel. A redelivered message posts again
    /// to the channels that had already succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Delivery`] for the failing channel, or
    /// [`PipelineError::Cancelled`].
    pub async fn deliver(
        &self,
        summary: &Summary,
        cancel: &CancellationToken,
    ) -> Result<usize, PipelineError> {
        let english = format_message(summary, Language::English);
        let russian = format_message(summary, Language::Russian);
        let targets = route(summary, &self.channels);

        for (channel, language) in &targets {
            let text = match language {
                Language::English => &english,
                Language::Russian => &russian,
            };
            if let Err(e) = cancellable(cancel, self.poster.send_message(channel, text)).await? {
                tracing::error!(channel = %channel, url = %summary.url, error = %e, "channel post failed");
                return Err(e);
            }
            tracing::debug!(channel = %channel, url = %summary.url, "posted");
        }

        tracing::info!(url = %summary.url, channels = targets.len(), "summary delivered");
        Ok(targets.len())
    }
}
