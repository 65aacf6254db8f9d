//! Resolved orchestrator parameters.

use std::time::Duration;

use arena_core::config::{ArenaConfig, ExitRule, duration_or};

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Pool names; index 0 renders as pool 1 in room names.
    pub pools: [String; 2],
    pub target: u32,
    pub fan_out: u32,
    pub poll_interval: Duration,
    pub trigger_pause: Duration,
    pub exit_rule: ExitRule,
    pub concurrency: usize,
    pub max_scale_polls: Option<u32>,
    pub room_template: String,
}

impl OrchestratorSettings {
    pub fn from_config(config: &ArenaConfig) -> Self {
        let orch = &config.orchestrator;
        Self {
            pools: [config.cluster.pool_a.clone(), config.cluster.pool_b.clone()],
            target: orch.target,
            fan_out: orch.fan_out,
            poll_interval: duration_or(&orch.poll_interval, Duration::from_secs(60)),
            trigger_pause: duration_or(&orch.trigger_pause, Duration::from_secs(1)),
            exit_rule: orch.exit_rule,
            concurrency: orch.concurrency.max(1),
            max_scale_polls: orch.max_scale_polls,
            room_template: orch.room_template.clone(),
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&ArenaConfig::default())
    }
}
