use crate::app_config::{AppConfig, DeliveryConfig, Environment, GenerationConfig, QueueConfig};
use crate::ConfigError;

/// Upper bound for `FEEDWIRE_LOOKBACK_MINUTES` (30 days).
pub const MAX_LOOKBACK_MINUTES: i64 = 43_200;

/// Upper bound for `FEEDWIRE_RETENTION_DAYS` (ten years).
pub const MAX_RETENTION_DAYS: i64 = 3_650;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can feed a `HashMap`.
#[allow(clippy::too_many_lines)]
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> { lookup(var).ok().filter(|v| !v.trim().is_empty()) };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bounded_i64 = |var: &str, default: &str, max: i64| -> Result<i64, ConfigError> {
        let value = or_default(var, default)
            .parse::<i64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if !(1..=max).contains(&value) {
            return Err(invalid(var, format!("{value} is outside 1..={max}")));
        }
        Ok(value)
    };

    let database_url = require("DATABASE_URL")?;
    let public_url = require("FEEDWIRE_PUBLIC_URL")?;
    if !(public_url.starts_with("http://") || public_url.starts_with("https://")) {
        return Err(invalid(
            "FEEDWIRE_PUBLIC_URL",
            "must start with http:// or https://".to_string(),
        ));
    }
    let tei_url = require("FEEDWIRE_TEI_URL")?;

    let env = parse_environment(&or_default("FEEDWIRE_ENV", "development"));
    let bind_addr = parse_addr("FEEDWIRE_BIND_ADDR", "0.0.0.0:8080")?;
    let log_level = or_default("FEEDWIRE_LOG_LEVEL", "info");
    let sources_path = PathBuf::from(or_default("FEEDWIRE_SOURCES_PATH", "./config/sources.yaml"));

    let db_max_connections = parse_u32("FEEDWIRE_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("FEEDWIRE_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("FEEDWIRE_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let http_timeout_secs = parse_u64("FEEDWIRE_HTTP_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("FEEDWIRE_USER_AGENT", "feedwire/0.1 (news-relay)");
    let lookback_minutes = parse_bounded_i64("FEEDWIRE_LOOKBACK_MINUTES", "60", MAX_LOOKBACK_MINUTES)?;

    let embedding_dim = or_default("FEEDWIRE_EMBEDDING_DIM", "768")
        .parse::<usize>()
        .map_err(|e| invalid("FEEDWIRE_EMBEDDING_DIM", e.to_string()))?;
    if embedding_dim == 0 {
        return Err(invalid(
            "FEEDWIRE_EMBEDDING_DIM",
            "must be greater than zero".to_string(),
        ));
    }

    let similarity_threshold = or_default("FEEDWIRE_SIMILARITY_THRESHOLD", "0.8")
        .parse::<f64>()
        .map_err(|e| invalid("FEEDWIRE_SIMILARITY_THRESHOLD", e.to_string()))?;
    if !(similarity_threshold > 0.0 && similarity_threshold <= 1.0) {
        return Err(invalid(
            "FEEDWIRE_SIMILARITY_THRESHOLD",
            format!("{similarity_threshold} is outside (0, 1]"),
        ));
    }

    let retention_days = parse_bounded_i64("FEEDWIRE_RETENTION_DAYS", "30", MAX_RETENTION_DAYS)?;
    let retention_cron = or_default("FEEDWIRE_RETENTION_CRON", "0 0 3 * * *");
    let fetch_cron = optional("FEEDWIRE_FETCH_CRON");

    let queue = QueueConfig {
        project: require("FEEDWIRE_GCP_PROJECT")?,
        region: require("FEEDWIRE_GCP_REGION")?,
        api_base_url: or_default(
            "FEEDWIRE_CLOUD_TASKS_URL",
            "https://cloudtasks.googleapis.com/v2",
        ),
        access_token: optional("FEEDWIRE_CLOUD_TASKS_TOKEN"),
        build_summary_queue: or_default("FEEDWIRE_QUEUE_BUILD_SUMMARY", "buildSummary"),
        filter_summary_queue: or_default("FEEDWIRE_QUEUE_FILTER_SUMMARY", "filterSummary"),
        post_summary_queue: or_default("FEEDWIRE_QUEUE_POST_SUMMARY", "postSummary"),
    };

    let generation = GenerationConfig {
        base_url: or_default("FEEDWIRE_GENERATION_URL", "https://api.openai.com/v1"),
        api_key: optional("FEEDWIRE_GENERATION_API_KEY"),
        model: or_default("FEEDWIRE_GENERATION_MODEL", "gpt-4o-mini"),
    };

    // Delivery is opt-in: once a bot token is present every channel id is required.
    let delivery = match optional("FEEDWIRE_TELEGRAM_BOT_TOKEN") {
        Some(bot_token) => Some(DeliveryConfig {
            api_base_url: or_default("FEEDWIRE_TELEGRAM_API_URL", "https://api.telegram.org"),
            bot_token,
            all_news_english: require("FEEDWIRE_CHANNEL_ALL_EN")?,
            all_news_russian: require("FEEDWIRE_CHANNEL_ALL_RU")?,
            highlights_english: require("FEEDWIRE_CHANNEL_HIGHLIGHTS_EN")?,
            highlights_russian: require("FEEDWIRE_CHANNEL_HIGHLIGHTS_RU")?,
            good_vibe_english: require("FEEDWIRE_CHANNEL_GOOD_VIBE_EN")?,
            good_vibe_russian: require("FEEDWIRE_CHANNEL_GOOD_VIBE_RU")?,
        }),
        None => None,
    };

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        sources_path,
        public_url,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        http_timeout_secs,
        user_agent,
        lookback_minutes,
        tei_url,
        embedding_dim,
        similarity_threshold,
        retention_days,
        retention_cron,
        fetch_cron,
        queue,
        generation,
        delivery,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
