//! Message publishing.

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use tracing::debug;

use arena_core::config::{BackfillConfig, duration_or};

use crate::error::{BackfillError, BackfillResult, PublishError, PublishResult};

/// Publishes raw message payloads to a topic.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish `messages` in one request. Returns the server-assigned ids in
    /// message order.
    async fn publish_batch(&self, messages: &[Vec<u8>]) -> PublishResult<Vec<String>>;
}

#[derive(Serialize)]
struct PublishRequest {
    messages: Vec<PubsubMessage>,
}

#[derive(Serialize)]
struct PubsubMessage {
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Vec<String>,
}

/// Google Cloud Pub/Sub over its REST API.
pub struct PubSubPublisher {
    url: String,
    access_token: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for PubSubPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PubSubPublisher")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl PubSubPublisher {
    /// Build from `[backfill]`. The project and access token are required.
    pub fn from_config(config: &BackfillConfig) -> BackfillResult<Self> {
        let project = config
            .project
            .as_deref()
            .ok_or(BackfillError::MissingCredentials("backfill.project"))?;
        let token = config
            .access_token
            .as_deref()
            .ok_or(BackfillError::MissingCredentials("backfill.access_token"))?;
        let timeout = duration_or(&config.request_timeout, Duration::from_secs(30));
        Ok(Self::new(
            &config.endpoint,
            project,
            &config.topic,
            token,
            timeout,
        )?)
    }

    pub fn new(
        endpoint: &str,
        project: &str,
        topic: &str,
        access_token: &str,
        timeout: Duration,
    ) -> PublishResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("arena-backfill/0.1")
            .build()?;
        Ok(Self {
            url: publish_url(endpoint, project, topic),
            access_token: access_token.to_string(),
            http_client,
        })
    }
}

fn publish_url(endpoint: &str, project: &str, topic: &str) -> String {
    format!(
        "{}/v1/projects/{project}/topics/{topic}:publish",
        endpoint.trim_end_matches('/')
    )
}

#[async_trait]
impl MessagePublisher for PubSubPublisher {
    async fn publish_batch(&self, messages: &[Vec<u8>]) -> PublishResult<Vec<String>> {
        let request = PublishRequest {
            messages: messages
                .iter()
                .map(|data| PubsubMessage {
                    data: general_purpose::STANDARD.encode(data),
                })
                .collect(),
        };

        let resp = self
            .http_client
            .post(&self.url)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PublishError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: PublishResponse = resp
            .json()
            .await
            .map_err(|e| PublishError::Decode(e.to_string()))?;
        if body.message_ids.len() != messages.len() {
            return Err(PublishError::Decode(format!(
                "sent {} messages, got {} ids",
                messages.len(),
                body.message_ids.len()
            )));
        }

        debug!(count = messages.len(), "published batch");
        Ok(body.message_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_endpoint_project_and_topic() {
        assert_eq!(
            publish_url("https://pubsub.googleapis.com/", "moj", "recordings"),
            "https://pubsub.googleapis.com/v1/projects/moj/topics/recordings:publish"
        );
    }

    #[test]
    fn missing_project_or_token_is_fatal() {
        let mut config = BackfillConfig {
            access_token: Some("t".to_string()),
            ..BackfillConfig::default()
        };
        assert!(matches!(
            PubSubPublisher::from_config(&config),
            Err(BackfillError::MissingCredentials("backfill.project"))
        ));

        config.project = Some("p".to_string());
        config.access_token = None;
        assert!(matches!(
            PubSubPublisher::from_config(&config),
            Err(BackfillError::MissingCredentials("backfill.access_token"))
        ));

        config.access_token = Some("t".to_string());
        assert!(PubSubPublisher::from_config(&config).is_ok());
    }

    #[test]
    fn debug_hides_token() {
        let publisher = PubSubPublisher::new(
            "http://localhost",
            "p",
            "t",
            "secret-token",
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(!format!("{publisher:?}").contains("secret-token"));
    }
}
