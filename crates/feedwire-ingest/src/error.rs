use feedwire_core::Cancelled;
use thiserror::Error;

/// Failures of a feed fetch or of the ingestion call as a whole.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("malformed feed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("source '{source_name}' has invalid CSS selector '{selector}'")]
    InvalidSelector {
        source_name: String,
        selector: String,
    },

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// Why a single feed entry could not become an article. The entry is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("entry has no publication date")]
    MissingDate,

    #[error("unparsable publication date '{0}'")]
    InvalidDate(String),

    #[error("local time '{raw}' does not exist in {zone}")]
    NonexistentLocalTime { raw: String, zone: String },

    #[error("entry has no link")]
    MissingLink,
}
