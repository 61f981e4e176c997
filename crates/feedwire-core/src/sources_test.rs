use std::path::Path;

use super::*;

fn source(name: &str, feed_url: &str) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        feed_url: feed_url.to_string(),
        selector: None,
        time_zone: None,
    }
}

#[test]
fn zone_defaults_to_utc() {
    let src = source("NOS", "https://feeds.nos.nl/nosnieuwsalgemeen");
    assert_eq!(src.zone(), Tz::UTC);
}

#[test]
fn time_zone_parses_from_iana_name() {
    let yaml = r#"
sources:
  - name: Nederlands Dagblad
    feed_url: https://www.nd.nl/rss
    time_zone: Europe/Amsterdam
"#;
    let file: SourcesFile = serde_yaml::from_str(yaml).expect("parse");
    assert_eq!(file.sources[0].zone(), Tz::Europe__Amsterdam);
    assert!(file.sources[0].selector.is_none());
}

#[test]
fn unknown_time_zone_fails_to_parse() {
    let yaml = r"
sources:
  - name: Broken
    feed_url: https://example.com/rss
    time_zone: Mars/Olympus_Mons
";
    assert!(serde_yaml::from_str::<SourcesFile>(yaml).is_err());
}

#[test]
fn validate_rejects_empty_name() {
    let file = SourcesFile {
        sources: vec![source("  ", "https://example.com/rss")],
    };
    let err = validate_sources(&file).unwrap_err();
    assert!(err.to_string().contains("non-empty"));
}

#[test]
fn validate_rejects_duplicate_name_case_insensitive() {
    let file = SourcesFile {
        sources: vec![
            source("NU.nl", "https://www.nu.nl/rss"),
            source("nu.NL", "https://www.nu.nl/rss/Algemeen"),
        ],
    };
    let err = validate_sources(&file).unwrap_err();
    assert!(err.to_string().contains("duplicate source name"));
}

#[test]
fn validate_rejects_non_http_feed_url() {
    let file = SourcesFile {
        sources: vec![source("Local", "file:///tmp/feed.xml")],
    };
    let err = validate_sources(&file).unwrap_err();
    assert!(err.to_string().contains("must start with http"));
}

#[test]
fn validate_rejects_unparseable_selector() {
    let mut src = source("DutchNews", "https://www.dutchnews.nl/feed/");
    src.selector = Some("div[[".to_string());
    let file = SourcesFile { sources: vec![src] };
    let err = validate_sources(&file).unwrap_err();
    assert!(err.to_string().contains("invalid CSS selector"));
}

#[test]
fn validate_accepts_valid_sources() {
    let mut with_selector = source("DutchNews", "https://www.dutchnews.nl/feed/");
    with_selector.selector = Some("div.entry-content".to_string());
    let file = SourcesFile {
        sources: vec![source("NOS", "https://feeds.nos.nl/nosnieuwsalgemeen"), with_selector],
    };
    assert!(validate_sources(&file).is_ok());
}

#[test]
fn load_sources_reports_missing_file() {
    let err = load_sources(Path::new("/definitely/not/here/sources.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::SourcesFileIo { .. }));
}

#[test]
fn load_sources_from_real_file() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config")
        .join("sources.yaml");
    assert!(path.exists(), "sources.yaml missing at {path:?}");
    let result = load_sources(&path);
    assert!(result.is_ok(), "failed to load sources.yaml: {result:?}");
    assert!(!result.unwrap().sources.is_empty());
}
