use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Where tasks are created and which stage endpoints they target.
#[derive(Clone)]
pub struct QueueConfig {
    pub project: String,
    pub region: String,
    /// Base URL of the Cloud Tasks REST API (overridable for tests).
    pub api_base_url: String,
    /// Bearer token for the Cloud Tasks API, if the environment needs one.
    pub access_token: Option<String>,
    pub build_summary_queue: String,
    pub filter_summary_queue: String,
    pub post_summary_queue: String,
}

/// OpenAI-compatible chat-completions endpoint used for summaries.
#[derive(Clone)]
pub struct GenerationConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

/// Telegram bot credentials and channel ids.
#[derive(Clone)]
pub struct DeliveryConfig {
    pub api_base_url: String,
    pub bot_token: String,
    pub all_news_english: String,
    pub all_news_russian: String,
    pub highlights_english: String,
    pub highlights_russian: String,
    pub good_vibe_english: String,
    pub good_vibe_russian: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub sources_path: PathBuf,
    /// Externally reachable base URL of this service; stage callbacks hang off it.
    pub public_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub lookback_minutes: i64,
    pub tei_url: String,
    pub embedding_dim: usize,
    pub similarity_threshold: f64,
    pub retention_days: i64,
    pub retention_cron: String,
    pub fetch_cron: Option<String>,
    pub queue: QueueConfig,
    pub generation: GenerationConfig,
    pub delivery: Option<DeliveryConfig>,
}

impl AppConfig {
    /// Callback URL for a stage endpoint, e.g. `stage_url("build-summary")`.
    #[must_use]
    pub fn stage_url(&self, stage: &str) -> String {
        format!("{}/stages/{stage}", self.public_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for QueueConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueConfig")
            .field("project", &self.project)
            .field("region", &self.region)
            .field("api_base_url", &self.api_base_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("build_summary_queue", &self.build_summary_queue)
            .field("filter_summary_queue", &self.filter_summary_queue)
            .field("post_summary_queue", &self.post_summary_queue)
            .finish()
    }
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("model", &self.model)
            .finish()
    }
}

impl std::fmt::Debug for DeliveryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryConfig")
            .field("api_base_url", &self.api_base_url)
            .field("bot_token", &"[redacted]")
            .field("all_news_english", &self.all_news_english)
            .field("all_news_russian", &self.all_news_russian)
            .field("highlights_english", &self.highlights_english)
            .field("highlights_russian", &self.highlights_russian)
            .field("good_vibe_english", &self.good_vibe_english)
            .field("good_vibe_russian", &self.good_vibe_russian)
            .finish()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("sources_path", &self.sources_path)
            .field("public_url", &self.public_url)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("lookback_minutes", &self.lookback_minutes)
            .field("tei_url", &self.tei_url)
            .field("embedding_dim", &self.embedding_dim)
            .field("similarity_threshold", &self.similarity_threshold)
            .field("retention_days", &self.retention_days)
            .field("retention_cron", &self.retention_cron)
            .field("fetch_cron", &self.fetch_cron)
            .field("queue", &self.queue)
            .field("generation", &self.generation)
            .field("delivery", &self.delivery)
            .finish()
    }
}
