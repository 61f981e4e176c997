//! Telegram Bot API client for channel delivery.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::collaborators::ChannelPoster;
use crate::error::PipelineError;

pub struct TelegramClient {
    client: reqwest::Client,
    send_url: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Deserialize)]
struct BotResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramClient {
    /// # Errors
    ///
    /// Returns [`PipelineError::Http`] if the HTTP client cannot be built.
    pub fn new(api_base_url: &str, bot_token: &str, timeout_secs: u64) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            send_url: format!(
                "{}/bot{bot_token}/sendMessage",
                api_base_url.trim_end_matches('/')
            ),
        })
    }
}

#[async_trait]
impl ChannelPoster for TelegramClient {
    async fn send_message(&self, channel: &str, html: &str) -> Result<(), PipelineError> {
        let response = self
            .client
            .post(&self.send_url)
            .json(&SendMessage {
                chat_id: channel,
                text: html,
                parse_mode: "HTML",
            })
            .send()
            .await
            .map_err(|e| PipelineError::Delivery {
                channel: channel.to_string(),
                reason: format!("request failed: {}", e.without_url()),
            })?;

        let status = response.status();
        let body: BotResponse = response.json().await.map_err(|e| PipelineError::Delivery {
            channel: channel.to_string(),
            reason: format!("status {status}, unreadable body: {}", e.without_url()),
        })?;

        if !status.is_success() || !body.ok {
            return Err(PipelineError::Delivery {
                channel: channel.to_string(),
                reason: format!(
                    "status {status}: {}",
                    body.description.unwrap_or_else(|| "no description".to_string())
                ),
            });
        }
        Ok(())
    }
}
