use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use feedwire_core::{cancellable, retry_fixed, Article, RetryPolicy, SourceConfig};
use reqwest::Client;
use scraper::Selector;
use tokio_util::sync::CancellationToken;

use crate::dates::parse_entry_date;
use crate::error::{EntryError, IngestError};
use crate::feed::{parse_feed, RawEntry};
use crate::html::{extract_selected_text, strip_html};
use crate::media::resolve_media;

/// What happened to one source during an ingestion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// The feed was read. `accepted` counts entries that were in the window
    /// and not already seen under the same URL.
    Fetched { entries: usize, accepted: usize },
    /// Every attempt failed; the source contributed nothing this call.
    Failed { attempts: u32, error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source: String,
    pub outcome: SourceOutcome,
}

/// Result of one ingestion call.
#[derive(Debug, Clone, Default)]
pub struct IngestBatch {
    /// Ascending by `published_at`; ties keep source iteration order.
    pub articles: Vec<Article>,
    pub reports: Vec<SourceReport>,
}

impl IngestBatch {
    #[must_use]
    pub fn failed_sources(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| matches!(r.outcome, SourceOutcome::Failed { .. }))
            .count()
    }
}

/// `after < published_at <= before`
#[must_use]
pub fn in_window(published_at: DateTime<Utc>, after: DateTime<Utc>, before: DateTime<Utc>) -> bool {
    published_at > after && published_at <= before
}

struct Source {
    config: SourceConfig,
    selector: Option<Selector>,
}

/// Reads the configured feeds and merges them into one windowed,
/// URL-deduplicated, time-ordered batch.
///
/// Holds no state between calls; every call re-fetches every feed.
pub struct FeedIngestor {
    client: Client,
    sources: Vec<Source>,
    retry: RetryPolicy,
}

impl FeedIngestor {
    /// # Errors
    ///
    /// Returns [`IngestError::Http`] if the HTTP client cannot be built, or
    /// [`IngestError::InvalidSelector`] if a source selector does not parse.
    pub fn new(
        sources: Vec<SourceConfig>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, IngestError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let sources = sources
            .into_iter()
            .map(|config| {
                let selector = config
                    .selector
                    .as_deref()
                    .map(|raw| {
                        Selector::parse(raw).map_err(|_| IngestError::InvalidSelector {
                            source_name: config.name.clone(),
                            selector: raw.to_string(),
                        })
                    })
                    .transpose()?;
                Ok(Source { config, selector })
            })
            .collect::<Result<Vec<_>, IngestError>>()?;

        Ok(Self {
            client,
            sources,
            retry: RetryPolicy::STANDARD,
        })
    }

    /// Override the feed-fetch retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Fetch every source and return the articles published in
    /// `(after, before]`.
    ///
    /// Sources are read one at a time in configuration order. A source whose
    /// feed cannot be fetched after all retries is reported as
    /// [`SourceOutcome::Failed`] and skipped. Page enrichment failures keep
    /// the feed-supplied body.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Cancelled`] if `cancel` fires. No other error
    /// aborts the call.
    pub async fn fetch_articles(
        &self,
        after: DateTime<Utc>,
        before: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<IngestBatch, IngestError> {
        tracing::info!(%after, %before, sources = self.sources.len(), "fetching articles");

        let mut seen_urls = HashSet::new();
        let mut batch = IngestBatch::default();

        for source in &self.sources {
            let name = source.config.name.as_str();
            let what = format!("fetch feed {name}");
            let fetched = retry_fixed(self.retry, cancel, &what, |attempt| {
                tracing::debug!(source = %name, attempt, "fetching feed");
                self.fetch_feed(&source.config.feed_url)
            })
            .await;

            let entries = match fetched {
                Ok(entries) => entries,
                Err(IngestError::Cancelled(c)) => return Err(c.into()),
                Err(e) => {
                    tracing::warn!(source = %name, error = %e, "skipping source for this run");
                    batch.reports.push(SourceReport {
                        source: name.to_string(),
                        outcome: SourceOutcome::Failed {
                            attempts: self.retry.max_attempts.max(1),
                            error: e.to_string(),
                        },
                    });
                    continue;
                }
            };

            let entry_count = entries.len();
            let mut accepted = 0usize;
            for entry in entries {
                let article = match build_article(entry, &source.config) {
                    Ok(article) => article,
                    Err(e) => {
                        tracing::debug!(source = %name, error = %e, "dropping feed entry");
                        continue;
                    }
                };
                if !in_window(article.published_at, after, before) {
                    tracing::debug!(
                        source = %name,
                        url = %article.url,
                        published_at = %article.published_at,
                        "entry outside window"
                    );
                    continue;
                }
                if !seen_urls.insert(article.url.clone()) {
                    tracing::debug!(source = %name, url = %article.url, "duplicate article URL skipped");
                    continue;
                }
                let article = match &source.selector {
                    Some(selector) => {
                        cancellable(cancel, self.enrich(article, selector, name)).await?
                    }
                    None => article,
                };
                batch.articles.push(article);
                accepted += 1;
            }

            tracing::info!(source = %name, entries = entry_count, accepted, "source fetched");
            batch.reports.push(SourceReport {
                source: name.to_string(),
                outcome: SourceOutcome::Fetched {
                    entries: entry_count,
                    accepted,
                },
            });
        }

        batch.articles.sort_by_key(|a| a.published_at);

        tracing::info!(
            articles = batch.articles.len(),
            failed_sources = batch.failed_sources(),
            "articles fetched"
        );
        Ok(batch)
    }

    async fn fetch_feed(&self, url: &str) -> Result<Vec<RawEntry>, IngestError> {
        let body = self.get_text(url).await?;
        parse_feed(&body)
    }

    async fn get_text(&self, url: &str) -> Result<String, IngestError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }

    /// Replace the body with the selected part of the article page, keeping
    /// the feed body on any failure.
    async fn enrich(&self, article: Article, selector: &Selector, source: &str) -> Article {
        let page = match self.get_text(&article.url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(source = %source, url = %article.url, error = %e, "article page fetch failed; keeping feed content");
                return article;
            }
        };

        match extract_selected_text(&page, selector) {
            Some(content) => {
                tracing::debug!(source = %source, url = %article.url, "article content enriched");
                Article { content, ..article }
            }
            None => {
                tracing::warn!(source = %source, url = %article.url, "content selector matched nothing; keeping feed content");
                article
            }
        }
    }
}

/// Turn a raw feed entry into an [`Article`] stamped with the source name.
///
/// # Errors
///
/// Returns [`EntryError`] when the entry has no link or its date cannot be
/// normalised.
pub fn build_article(entry: RawEntry, source: &SourceConfig) -> Result<Article, EntryError> {
    let url = entry.link.trim().to_string();
    if url.is_empty() {
        return Err(EntryError::MissingLink);
    }
    let published_at = parse_entry_date(entry.date_text(), source.time_zone)?;
    let media = resolve_media(&entry);

    Ok(Article {
        source: source.name.clone(),
        title: strip_html(&entry.title),
        description: strip_html(&entry.description),
        content: strip_html(&entry.content),
        published_at,
        url,
        media_type: media.as_ref().and_then(|m| m.media_type.clone()),
        media: media.map(|m| m.url),
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::Tz;

    use super::*;
    use crate::feed::MediaRef;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
    }

    fn source(time_zone: Option<Tz>) -> SourceConfig {
        SourceConfig {
            name: "NOS".to_string(),
            feed_url: "https://feeds.nos.nl/nosnieuwsalgemeen".to_string(),
            selector: None,
            time_zone,
        }
    }

    #[test]
    fn window_excludes_lower_bound_and_includes_upper_bound() {
        let (after, before) = (at(9, 0), at(11, 0));
        assert!(!in_window(at(9, 0), after, before));
        assert!(in_window(at(9, 1), after, before));
        assert!(in_window(at(11, 0), after, before));
        assert!(!in_window(at(11, 1), after, before));
        assert!(!in_window(at(8, 0), after, before));
    }

    #[test]
    fn build_article_strips_markup_and_resolves_media() {
        let entry = RawEntry {
            title: "Dijken &amp; duinen".to_string(),
            link: " https://nos.nl/artikel/1 ".to_string(),
            description: "<p>Korte <b>tekst</b></p>".to_string(),
            content: "<p>Lange tekst</p>".to_string(),
            published: Some("2024-03-01T10:00:00Z".to_string()),
            media_thumbnail: Some(MediaRef {
                url: "https://nos.nl/thumb.jpg".to_string(),
                media_type: Some("image".to_string()),
            }),
            ..RawEntry::default()
        };
        let article = build_article(entry, &source(None)).unwrap();
        assert_eq!(article.source, "NOS");
        assert_eq!(article.title, "Dijken & duinen");
        assert_eq!(article.url, "https://nos.nl/artikel/1");
        assert_eq!(article.description, "Korte tekst");
        assert_eq!(article.content, "Lange tekst");
        assert_eq!(article.published_at, at(10, 0));
        assert_eq!(article.media.as_deref(), Some("https://nos.nl/thumb.jpg"));
        assert_eq!(article.media_type.as_deref(), Some("image"));
    }

    #[test]
    fn build_article_uses_source_zone() {
        let entry = RawEntry {
            link: "https://www.nd.nl/1".to_string(),
            published: Some("Fri, 01 Mar 2024 10:00:00 +0000".to_string()),
            ..RawEntry::default()
        };
        let article = build_article(entry, &source(Some(Tz::Europe__Amsterdam))).unwrap();
        assert_eq!(article.published_at, at(9, 0));
    }

    #[test]
    fn build_article_rejects_missing_date_and_link() {
        let no_date = RawEntry {
            link: "https://nos.nl/x".to_string(),
            ..RawEntry::default()
        };
        assert_eq!(
            build_article(no_date, &source(None)),
            Err(EntryError::MissingDate)
        );

        let no_link = RawEntry {
            published: Some("2024-03-01T10:00:00Z".to_string()),
            ..RawEntry::default()
        };
        assert_eq!(
            build_article(no_link, &source(None)),
            Err(EntryError::MissingLink)
        );
    }

    #[test]
    fn invalid_selector_is_rejected_at_construction() {
        let mut bad = source(None);
        bad.selector = Some("div[[".to_string());
        let err = FeedIngestor::new(vec![bad], 5, "test-agent").err().unwrap();
        assert!(matches!(err, IngestError::InvalidSelector { .. }));
    }
}
