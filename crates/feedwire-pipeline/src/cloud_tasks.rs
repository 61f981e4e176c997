//! Cloud Tasks REST client: each publish becomes one HTTP-target task.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::SecondsFormat;
use feedwire_core::{QueueConfig, QueueId, TaskEnvelope};
use serde_json::json;

use crate::collaborators::TaskQueue;
use crate::error::PipelineError;

pub struct CloudTasksClient {
    client: reqwest::Client,
    config: QueueConfig,
}

impl CloudTasksClient {
    /// # Errors
    ///
    /// Returns [`PipelineError::Http`] if the HTTP client cannot be built.
    pub fn new(config: QueueConfig, timeout_secs: u64) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, config })
    }

    fn queue_name(&self, queue: QueueId) -> &str {
        match queue {
            QueueId::BuildSummary => &self.config.build_summary_queue,
            QueueId::FilterSummary => &self.config.filter_summary_queue,
            QueueId::PostSummary => &self.config.post_summary_queue,
        }
    }

    /// `{base}/projects/{project}/locations/{region}/queues/{queue}/tasks`
    #[must_use]
    pub fn tasks_url(&self, queue: QueueId) -> String {
        format!(
            "{}/projects/{}/locations/{}/queues/{}/tasks",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.project,
            self.config.region,
            self.queue_name(queue)
        )
    }
}

fn task_body(envelope: &TaskEnvelope) -> serde_json::Value {
    json!({
        "task": {
            "httpRequest": {
                "httpMethod": "POST",
                "url": envelope.destination_url,
                "headers": { "Content-Type": "application/json" },
                "body": BASE64.encode(envelope.body.as_bytes())
            },
            "scheduleTime": envelope.schedule_time.to_rfc3339_opts(SecondsFormat::Millis, true)
        }
    })
}

#[async_trait]
impl TaskQueue for CloudTasksClient {
    async fn create_task(&self, envelope: &TaskEnvelope) -> Result<(), PipelineError> {
        let mut request = self
            .client
            .post(self.tasks_url(envelope.queue))
            .json(&task_body(envelope));
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Queue(format!(
                "create task in {} returned {status}: {}",
                envelope.queue,
                body.chars().take(300).collect::<String>()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(base: String, token: Option<&str>) -> QueueConfig {
        QueueConfig {
            project: "feedwire-prod".to_string(),
            region: "europe-west1".to_string(),
            api_base_url: base,
            access_token: token.map(str::to_string),
            build_summary_queue: "buildSummary".to_string(),
            filter_summary_queue: "filterSummary".to_string(),
            post_summary_queue: "postSummary".to_string(),
        }
    }

    fn envelope() -> TaskEnvelope {
        TaskEnvelope {
            queue: QueueId::FilterSummary,
            destination_url: "https://feedwire.example.com/stages/filter-summary".to_string(),
            body: "{\"Url\":\"u\"}".to_string(),
            schedule_time: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn tasks_url_uses_configured_queue_name() {
        let mut cfg = config("https://cloudtasks.googleapis.com/v2/".to_string(), None);
        cfg.post_summary_queue = "post-prod".to_string();
        let client = CloudTasksClient::new(cfg, 5).unwrap();
        assert_eq!(
            client.tasks_url(QueueId::PostSummary),
            "https://cloudtasks.googleapis.com/v2/projects/feedwire-prod/locations/europe-west1/queues/post-prod/tasks"
        );
    }

    #[test]
    fn task_body_base64_encodes_payload() {
        let body = task_body(&envelope());
        assert_eq!(body["task"]["httpRequest"]["body"], "eyJVcmwiOiJ1In0=");
        assert_eq!(body["task"]["scheduleTime"], "2024-03-01T10:00:00.000Z");
        assert_eq!(
            body["task"]["httpRequest"]["headers"]["Content-Type"],
            "application/json"
        );
    }

    #[tokio::test]
    async fn create_task_posts_to_queue_with_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(
                "/projects/feedwire-prod/locations/europe-west1/queues/filterSummary/tasks",
            ))
            .and(header("authorization", "Bearer ya29.token"))
            .and(body_json(task_body(&envelope())))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "t1" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = CloudTasksClient::new(config(server.uri(), Some("ya29.token")), 5).unwrap();
        client.create_task(&envelope()).await.expect("create should succeed");
    }

    #[tokio::test]
    async fn create_task_surfaces_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
            .mount(&server)
            .await;

        let client = CloudTasksClient::new(config(server.uri(), None), 5).unwrap();
        let err = client.create_task(&envelope()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Queue(ref m) if m.contains("403")));
    }
}
