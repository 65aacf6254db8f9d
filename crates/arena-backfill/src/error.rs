use std::num::ParseIntError;

use thiserror::Error;

/// Fatal backfill errors. Per-record and per-batch problems are logged and
/// counted instead.
#[derive(Debug, Error)]
pub enum BackfillError {
    #[error("reading input: {0}")]
    Io(#[from] std::io::Error),

    #[error("publisher setup failed: {0}")]
    Publish(#[from] PublishError),

    #[error("missing backfill setting: {0}")]
    MissingCredentials(&'static str),
}

/// Why a single input line was skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("expected 3 fields, got {found}")]
    FieldCount { found: usize },

    #[error("bad {field} {value:?}: {source}")]
    Timestamp {
        field: &'static str,
        value: String,
        source: ParseIntError,
    },
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("pubsub unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("pubsub returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected pubsub response: {0}")]
    Decode(String),
}

pub type BackfillResult<T> = Result<T, BackfillError>;
pub type PublishResult<T> = Result<T, PublishError>;
