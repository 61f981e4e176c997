use std::collections::HashSet;
use std::path::Path;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One syndicated feed in the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Display name, stamped onto every article from this feed.
    pub name: String,
    pub feed_url: String,
    /// CSS selector for the article body on the linked page. When set, the
    /// page is fetched and the selected node replaces the feed-supplied body.
    #[serde(default)]
    pub selector: Option<String>,
    /// IANA zone the feed's timestamps are really written in. Set this for
    /// feeds that label local wall-clock time as UTC or omit the offset.
    #[serde(default)]
    pub time_zone: Option<Tz>,
}

impl SourceConfig {
    /// Zone used to read wall-clock timestamps from this feed.
    #[must_use]
    pub fn zone(&self) -> Tz {
        self.time_zone.unwrap_or(Tz::UTC)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesFile {
    pub sources: Vec<SourceConfig>,
}

/// Load and validate the source catalogue from a YAML file.
///
/// Order is preserved; it decides which source wins when two feeds carry
/// the same article URL.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sources(path: &Path) -> Result<SourcesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourcesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let sources_file: SourcesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::SourcesFileParse)?;

    validate_sources(&sources_file)?;

    Ok(sources_file)
}

fn validate_sources(sources_file: &SourcesFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for source in &sources_file.sources {
        if source.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source name must be non-empty".to_string(),
            ));
        }

        if !seen_names.insert(source.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source name: '{}'",
                source.name
            )));
        }

        if !(source.feed_url.starts_with("http://") || source.feed_url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "source '{}' has feed_url '{}'; must start with http:// or https://",
                source.name, source.feed_url
            )));
        }

        if let Some(selector) = &source.selector {
            if scraper::Selector::parse(selector).is_err() {
                return Err(ConfigError::Validation(format!(
                    "source '{}' has invalid CSS selector '{selector}'",
                    source.name
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "sources_test.rs"]
mod tests;
