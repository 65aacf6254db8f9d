//! arena-trigger — start a battle between two rooms.
//!
//! A single JSON POST per pair. Success means a 2xx status; the response
//! body is never inspected and nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use arena_core::BattlePair;
use arena_core::config::{BattleConfig, duration_or};

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("battle endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("battle endpoint returned {status}")]
    Failed { status: u16 },
}

pub type TriggerResult<T> = Result<T, TriggerError>;

/// Body of the battle start request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleRequest {
    pub room_a: String,
    pub room_b: String,
    pub host_a: String,
    pub host_b: String,
    /// `{room_a}_{room_b}`.
    pub entity_id: String,
}

impl From<&BattlePair> for BattleRequest {
    fn from(pair: &BattlePair) -> Self {
        Self {
            room_a: pair.room_a.clone(),
            room_b: pair.room_b.clone(),
            host_a: pair.host_a.clone(),
            host_b: pair.host_b.clone(),
            entity_id: pair.entity_id(),
        }
    }
}

#[async_trait]
pub trait BattleTrigger: Send + Sync {
    async fn trigger(&self, pair: &BattlePair) -> TriggerResult<()>;
}

pub struct HttpBattleTrigger {
    endpoint: String,
    http_client: reqwest::Client,
}

impl HttpBattleTrigger {
    pub fn from_config(config: &BattleConfig) -> TriggerResult<Self> {
        let timeout = duration_or(&config.request_timeout, Duration::from_secs(30));
        Self::new(&config.endpoint, timeout)
    }

    pub fn new(endpoint: &str, timeout: Duration) -> TriggerResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("arena-trigger/0.1")
            .build()?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            http_client,
        })
    }
}

#[async_trait]
impl BattleTrigger for HttpBattleTrigger {
    async fn trigger(&self, pair: &BattlePair) -> TriggerResult<()> {
        let request = BattleRequest::from(pair);
        let resp = self
            .http_client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TriggerError::Failed {
                status: status.as_u16(),
            });
        }

        debug!(entity_id = %request.entity_id, %status, "battle triggered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn pair() -> BattlePair {
        BattlePair {
            room_a: "d1-1-podA".to_string(),
            room_b: "d2-1-podB".to_string(),
            host_a: "podA_pub_0".to_string(),
            host_b: "podB_pub_0".to_string(),
        }
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(BattleRequest::from(&pair())).unwrap();
        assert_eq!(
            body,
            json!({
                "roomA": "d1-1-podA",
                "roomB": "d2-1-podB",
                "hostA": "podA_pub_0",
                "hostB": "podB_pub_0",
                "entityId": "d1-1-podA_d2-1-podB"
            })
        );
    }

    #[tokio::test]
    async fn posts_json_to_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/internal/startBattle")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({"entityId": "d1-1-podA_d2-1-podB"})))
            .with_status(200)
            .create_async()
            .await;

        let trigger = HttpBattleTrigger::new(
            &format!("{}/v1/internal/startBattle", server.url()),
            Duration::from_secs(5),
        )
        .unwrap();
        trigger.trigger(&pair()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_2xx_is_failed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/start")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let trigger =
            HttpBattleTrigger::new(&format!("{}/start", server.url()), Duration::from_secs(5))
                .unwrap();
        let err = trigger.trigger(&pair()).await.unwrap_err();
        assert!(matches!(err, TriggerError::Failed { status: 503 }));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport() {
        // Grab a free port and close it again so the connect is refused.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let trigger = HttpBattleTrigger::new(
            &format!("http://127.0.0.1:{port}/start"),
            Duration::from_secs(2),
        )
        .unwrap();
        let err = trigger.trigger(&pair()).await.unwrap_err();
        assert!(matches!(err, TriggerError::Transport(_)));
    }
}
