//! Orchestrator error types.

use thiserror::Error;

/// Errors that end an orchestration run.
///
/// Everything else (failed reads, scale requests, lookups, triggers) is
/// logged and skipped.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("pools did not settle after {polls} polls")]
    ScalingTimedOut { polls: u32 },
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
