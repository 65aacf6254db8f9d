//! Cluster control error types.

use thiserror::Error;

/// Errors that can occur while driving a pool.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("kubernetes api error: {0}")]
    Api(#[from] kube::Error),

    #[error("failed to configure cluster client: {0}")]
    Connect(String),

    #[error("pool not found: {0}")]
    PoolNotFound(String),

    #[error("pool unavailable: {0}")]
    Unavailable(String),
}

pub type ClusterResult<T> = Result<T, ClusterError>;
