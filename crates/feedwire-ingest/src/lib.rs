//! Feed ingestion: fetch each configured RSS/Atom source, keep entries in the
//! requested window, drop repeated URLs, optionally pull the full article body
//! from the linked page, and hand back one batch ordered by publication time.

pub mod dates;
pub mod engine;
pub mod error;
pub mod feed;
pub mod html;
pub mod media;

pub use engine::{build_article, in_window, FeedIngestor, IngestBatch, SourceOutcome, SourceReport};
pub use error::{EntryError, IngestError};
pub use feed::{parse_feed, MediaRef, RawEntry};
