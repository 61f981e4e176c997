//! OpenAI-compatible chat-completions client used for summary generation.

use std::time::Duration;

use async_trait::async_trait;
use feedwire_core::GenerationConfig;
use serde_json::{json, Value};

use crate::collaborators::TextGenerator;
use crate::error::PipelineError;

pub struct OpenAiClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiClient {
    /// # Errors
    ///
    /// Returns [`PipelineError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &GenerationConfig, timeout_secs: u64) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        response_schema: &Value,
    ) -> Result<String, PipelineError> {
        let req_body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt }
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "build_summary",
                    "schema": response_schema
                }
            },
            "temperature": 0.2
        });

        let mut request = self.client.post(&self.url).json(&req_body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Generation(format!(
                "status {status}: {}",
                body.chars().take(300).collect::<String>()
            )));
        }

        let body: Value = response.json().await?;
        body.get("choices")
            .and_then(Value::as_array)
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|msg| msg.get("content"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| PipelineError::Generation("response has no message content".to_string()))
    }
}
