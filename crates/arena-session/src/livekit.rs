//! LiveKit RoomService client (Twirp over JSON).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use arena_core::config::{SessionConfig, duration_or};

use crate::error::{SessionError, SessionResult};
use crate::resolver::SessionService;
use crate::token::TokenSigner;

const LIST_PARTICIPANTS_PATH: &str = "/twirp/livekit.RoomService/ListParticipants";

#[derive(Debug, Serialize)]
struct ListParticipantsRequest<'a> {
    room: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ListParticipantsResponse {
    #[serde(default)]
    participants: Vec<ParticipantInfo>,
}

#[derive(Debug, Deserialize)]
struct ParticipantInfo {
    #[serde(default)]
    identity: String,
}

pub struct LiveKitRoomService {
    base_url: String,
    signer: TokenSigner,
    http_client: reqwest::Client,
}

impl LiveKitRoomService {
    /// Build a client from `[session]`. Fails without an API key and secret.
    pub fn from_config(config: &SessionConfig) -> SessionResult<Self> {
        let (Some(key), Some(secret)) = (&config.api_key, &config.api_secret) else {
            return Err(SessionError::MissingCredentials);
        };
        let ttl = duration_or(&config.token_ttl, Duration::from_secs(600));
        let timeout = duration_or(&config.request_timeout, Duration::from_secs(30));
        Self::new(&config.host, TokenSigner::new(key, secret, ttl), timeout)
    }

    pub fn new(host: &str, signer: TokenSigner, timeout: Duration) -> SessionResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("arena-session/0.1")
            .build()?;
        Ok(Self {
            base_url: http_base(host),
            signer,
            http_client,
        })
    }
}

#[async_trait]
impl SessionService for LiveKitRoomService {
    async fn list_participants(&self, room: &str) -> SessionResult<Vec<String>> {
        let url = format!("{}{LIST_PARTICIPANTS_PATH}", self.base_url);
        let token = self.signer.room_admin(room)?;

        let resp = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .json(&ListParticipantsRequest { room })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SessionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ListParticipantsResponse = resp
            .json()
            .await
            .map_err(|e| SessionError::Decode(e.to_string()))?;

        debug!(%room, count = body.participants.len(), "listed participants");
        Ok(body.participants.into_iter().map(|p| p.identity).collect())
    }
}

/// Map a LiveKit server URL onto its HTTP API base.
pub fn http_base(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if let Some(rest) = host.strip_prefix("wss://") {
        format!("https://{rest}")
    } else if let Some(rest) = host.strip_prefix("ws://") {
        format!("http://{rest}")
    } else {
        host.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_base_rewrites_websocket_schemes() {
        assert_eq!(http_base("wss://live.example.com"), "https://live.example.com");
        assert_eq!(http_base("ws://localhost:7880/"), "http://localhost:7880");
        assert_eq!(http_base("https://live.example.com"), "https://live.example.com");
    }

    #[test]
    fn from_config_requires_credentials() {
        let config = SessionConfig::default();
        assert!(matches!(
            LiveKitRoomService::from_config(&config),
            Err(SessionError::MissingCredentials)
        ));
    }

    #[test]
    fn empty_response_has_no_participants() {
        let body: ListParticipantsResponse = serde_json::from_str("{}").unwrap();
        assert!(body.participants.is_empty());
    }
}
