//! Server API access tokens.
//!
//! LiveKit authenticates RoomService calls with an HS256 JWT signed by the
//! API secret. The issuer is the API key and a `video` grant scopes the
//! token to administering a single room.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};

use crate::error::SessionResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    pub room_admin: bool,
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub nbf: u64,
    pub exp: u64,
    pub video: VideoGrant,
}

/// Mints short-lived room admin tokens.
#[derive(Clone)]
pub struct TokenSigner {
    api_key: String,
    key: EncodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("api_key", &self.api_key)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(api_key: &str, api_secret: &str, ttl: Duration) -> Self {
        Self {
            api_key: api_key.to_string(),
            key: EncodingKey::from_secret(api_secret.as_bytes()),
            ttl,
        }
    }

    /// A token allowing room administration of `room`.
    pub fn room_admin(&self, room: &str) -> SessionResult<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let claims = Claims {
            iss: self.api_key.clone(),
            nbf: now,
            exp: now + self.ttl.as_secs(),
            video: VideoGrant {
                room_admin: true,
                room: room.to_string(),
            },
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.key)?)
    }
}
