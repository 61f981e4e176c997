//! TEI (Text Embeddings Inference) client for summary embeddings.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::collaborators::Embedder;
use crate::error::PipelineError;

/// TEI HTTP client.
///
/// Every returned vector is checked against `dim`; a model swap that changes
/// the width is reported as an error rather than written to the index.
pub struct TeiClient {
    client: reqwest::Client,
    url: String,
    dim: usize,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    inputs: &'a [&'a str],
    truncate: bool,
}

impl TeiClient {
    /// # Errors
    ///
    /// Returns [`PipelineError::Http`] if the HTTP client cannot be built.
    pub fn new(tei_url: &str, dim: usize, timeout_secs: u64) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/embed", tei_url.trim_end_matches('/')),
            dim,
        })
    }
}

#[async_trait]
impl Embedder for TeiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        let inputs = [text];
        let request = EmbedRequest {
            inputs: &inputs,
            truncate: true,
        };
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Tei(format!("TEI request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PipelineError::Tei(format!(
                "TEI returned status {}",
                response.status()
            )));
        }

        let embeddings: Vec<Vec<f32>> = response
            .json()
            .await
            .map_err(|e| PipelineError::Tei(format!("TEI response parse error: {e}")))?;

        let Some(embedding) = embeddings.into_iter().next() else {
            return Err(PipelineError::Tei("TEI returned no embeddings".to_string()));
        };

        if embedding.len() != self.dim {
            return Err(PipelineError::Tei(format!(
                "TEI returned {} dimensions, expected {}",
                embedding.len(),
                self.dim
            )));
        }

        Ok(embedding)
    }
}
