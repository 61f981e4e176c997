//! Offline tests for feedwire-db pool configuration.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use feedwire_core::{AppConfig, Environment, GenerationConfig, QueueConfig};
use feedwire_db::{DbError, PoolConfig};

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080),
        log_level: "info".to_string(),
        sources_path: PathBuf::from("./config/sources.yaml"),
        public_url: "https://feedwire.example.com".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        http_timeout_secs: 30,
        user_agent: "ua".to_string(),
        lookback_minutes: 60,
        tei_url: "http://localhost:8081".to_string(),
        embedding_dim: 768,
        similarity_threshold: 0.8,
        retention_days: 30,
        retention_cron: "0 0 3 * * *".to_string(),
        fetch_cron: None,
        queue: QueueConfig {
            project: "p".to_string(),
            region: "r".to_string(),
            api_base_url: "http://localhost".to_string(),
            access_token: None,
            build_summary_queue: "buildSummary".to_string(),
            filter_summary_queue: "filterSummary".to_string(),
            post_summary_queue: "postSummary".to_string(),
        },
        generation: GenerationConfig {
            base_url: "http://localhost".to_string(),
            api_key: None,
            model: "m".to_string(),
        },
        delivery: None,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn dimension_mismatch_message_names_both_widths() {
    let err = DbError::DimensionMismatch {
        expected: 768,
        actual: 1024,
    };
    assert_eq!(err.to_string(), "embedding has 1024 dimensions, expected 768");
}
