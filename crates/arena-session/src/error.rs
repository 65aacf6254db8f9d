//! Session lookup error types.

use thiserror::Error;

pub type SessionResult<T> = Result<T, SessionError>;

/// Failures talking to the session service.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("session service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected session service response: {0}")]
    Decode(String),

    #[error("failed to sign access token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("session api key and secret are required")]
    MissingCredentials,
}

/// Why a room produced no host.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no remote participants found in {0}")]
    NoParticipants(String),

    #[error("no host found in {0}")]
    NoHostFound(String),

    #[error("listing participants of {room} failed: {source}")]
    Session {
        room: String,
        #[source]
        source: SessionError,
    },
}
