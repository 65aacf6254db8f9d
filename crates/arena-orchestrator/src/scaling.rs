//! Scale-up loop — ramps both pools toward the target one member at a time.
//!
//! Each poll reads both pool sizes, asks for one more member in every pool
//! still below target, then checks the exit rule. Between polls it sleeps
//! the poll interval. Failed reads and scale requests are logged and
//! retried on the next poll.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use arena_cluster::ClusterControl;
use arena_core::config::ExitRule;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::settings::OrchestratorSettings;
use crate::sleep::Sleeper;

/// A scaling decision for a single pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaleDecision {
    /// Request this size.
    ScaleTo(u32),
    /// No change needed.
    NoChange,
}

/// One step of the ramp: never more than +1, never down.
pub fn evaluate(current: u32, target: u32) -> ScaleDecision {
    if current < target {
        ScaleDecision::ScaleTo(current + 1)
    } else {
        ScaleDecision::NoChange
    }
}

/// What a single poll observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    /// Sizes read this poll; `None` where the read failed.
    pub sizes: [Option<u32>; 2],
    pub settled: bool,
}

pub struct ScaleController {
    cluster: Arc<dyn ClusterControl>,
    sleeper: Arc<dyn Sleeper>,
    pools: [String; 2],
    target: u32,
    exit_rule: ExitRule,
    poll_interval: Duration,
    max_polls: Option<u32>,
}

impl ScaleController {
    pub fn new(
        cluster: Arc<dyn ClusterControl>,
        sleeper: Arc<dyn Sleeper>,
        settings: &OrchestratorSettings,
    ) -> Self {
        Self {
            cluster,
            sleeper,
            pools: settings.pools.clone(),
            target: settings.target,
            exit_rule: settings.exit_rule,
            poll_interval: settings.poll_interval,
            max_polls: settings.max_scale_polls,
        }
    }

    /// Read, ramp, and check the exit rule once.
    pub async fn poll_once(&self) -> PollOutcome {
        let mut sizes = [None, None];
        for (slot, pool) in sizes.iter_mut().zip(&self.pools) {
            match self.cluster.pool_size(pool).await {
                Ok(current) => *slot = Some(current),
                Err(e) => warn!(%pool, error = %e, "failed to read pool size"),
            }
        }

        for (size, pool) in sizes.iter().zip(&self.pools) {
            let Some(current) = *size else { continue };
            if let ScaleDecision::ScaleTo(next) = evaluate(current, self.target) {
                info!(%pool, from = current, to = next, "scaling pool");
                if let Err(e) = self.cluster.set_pool_size(pool, next).await {
                    warn!(%pool, to = next, error = %e, "scale request failed");
                }
            }
        }

        let settle = self.exit_rule.settle_size(self.target);
        let settled = sizes.iter().all(|size| *size == Some(settle));
        PollOutcome { sizes, settled }
    }

    /// Poll until the exit rule holds. Returns the number of polls taken.
    ///
    /// Unbounded unless `max_scale_polls` is set.
    pub async fn converge(&self) -> OrchestratorResult<u32> {
        let mut polls = 0;
        loop {
            polls += 1;
            let outcome = self.poll_once().await;
            if outcome.settled {
                info!(polls, sizes = ?outcome.sizes, "pools settled");
                return Ok(polls);
            }

            if let Some(max) = self.max_polls
                && polls >= max
            {
                warn!(polls, sizes = ?outcome.sizes, "giving up on scaling");
                return Err(OrchestratorError::ScalingTimedOut { polls });
            }

            debug!(
                polls,
                sizes = ?outcome.sizes,
                wait_secs = self.poll_interval.as_secs(),
                "pools not settled yet"
            );
            self.sleeper.sleep(self.poll_interval).await;
        }
    }
}
