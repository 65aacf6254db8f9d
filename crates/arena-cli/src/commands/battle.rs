use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, ValueEnum};
use tracing::info;

use arena_core::ArenaConfig;
use arena_core::config::ExitRule;
use arena_orchestrator::{Orchestrator, OrchestratorSettings};
use arena_session::{LiveKitRoomService, ParticipantResolver};
use arena_trigger::HttpBattleTrigger;

#[derive(Debug, Args)]
pub struct BattleArgs {
    /// Path to arena.toml (default: ./arena.toml if present).
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Desired size of each pool.
    #[arg(long)]
    pub target: Option<u32>,
    /// Rooms derived per pool member.
    #[arg(long)]
    pub fan_out: Option<u32>,
    /// Pairs processed at once.
    #[arg(long)]
    pub concurrency: Option<usize>,
    /// Kubeconfig context.
    #[arg(long)]
    pub context: Option<String>,
    #[arg(long)]
    pub namespace: Option<String>,
    /// When scaling counts as done.
    #[arg(long, value_enum)]
    pub exit_rule: Option<ExitRuleArg>,
    /// Give up after this many scale polls.
    #[arg(long)]
    pub max_scale_polls: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExitRuleArg {
    OneBelowTarget,
    AtTarget,
}

impl From<ExitRuleArg> for ExitRule {
    fn from(arg: ExitRuleArg) -> Self {
        match arg {
            ExitRuleArg::OneBelowTarget => ExitRule::OneBelowTarget,
            ExitRuleArg::AtTarget => ExitRule::AtTarget,
        }
    }
}

impl BattleArgs {
    /// Flags win over file and environment values.
    pub fn apply(&self, config: &mut ArenaConfig) {
        let orch = &mut config.orchestrator;
        if let Some(target) = self.target {
            orch.target = target;
        }
        if let Some(fan_out) = self.fan_out {
            orch.fan_out = fan_out;
        }
        if let Some(concurrency) = self.concurrency {
            orch.concurrency = concurrency;
        }
        if let Some(rule) = self.exit_rule {
            orch.exit_rule = rule.into();
        }
        if let Some(max) = self.max_scale_polls {
            orch.max_scale_polls = Some(max);
        }
        if let Some(context) = &self.context {
            config.cluster.context = Some(context.clone());
        }
        if let Some(namespace) = &self.namespace {
            config.cluster.namespace = namespace.clone();
        }
    }
}

pub async fn run(args: BattleArgs) -> anyhow::Result<()> {
    let mut config = super::load_config(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let cluster = arena_cluster::connect(&config.cluster)
        .await
        .context("connecting to the cluster")?;
    let service = LiveKitRoomService::from_config(&config.session)
        .context("building the session client")?;
    let resolver = ParticipantResolver::new(Arc::new(service), &config.session.publisher_suffix);
    let trigger =
        HttpBattleTrigger::from_config(&config.battle).context("building the battle client")?;

    let settings = OrchestratorSettings::from_config(&config);
    info!(
        namespace = %config.cluster.namespace,
        pool_a = %settings.pools[0],
        pool_b = %settings.pools[1],
        target_size = settings.target,
        fan_out = settings.fan_out,
        concurrency = settings.concurrency,
        "starting battle run"
    );

    let mut orchestrator = Orchestrator::new(settings, cluster, resolver, Arc::new(trigger));
    let report = orchestrator.run().await?;

    println!(
        "✓ {} battles started ({} pairs, {} unresolved, {} failed)",
        report.triggered(),
        report.attempted(),
        report.unresolved(),
        report.failed()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> BattleArgs {
        BattleArgs {
            config: None,
            target: None,
            fan_out: None,
            concurrency: None,
            context: None,
            namespace: None,
            exit_rule: None,
            max_scale_polls: None,
        }
    }

    #[test]
    fn no_flags_leave_config_untouched() {
        let mut config = ArenaConfig::default();
        args().apply(&mut config);

        assert_eq!(config.orchestrator.target, 2);
        assert_eq!(config.cluster.namespace, "live-kit");
        assert_eq!(config.cluster.context, None);
    }

    #[test]
    fn flags_override_config() {
        let mut config = ArenaConfig::default();
        let args = BattleArgs {
            target: Some(6),
            fan_out: Some(1),
            concurrency: Some(4),
            context: Some("staging".to_string()),
            namespace: Some("load".to_string()),
            exit_rule: Some(ExitRuleArg::AtTarget),
            max_scale_polls: Some(30),
            ..args()
        };
        args.apply(&mut config);

        assert_eq!(config.orchestrator.target, 6);
        assert_eq!(config.orchestrator.fan_out, 1);
        assert_eq!(config.orchestrator.concurrency, 4);
        assert_eq!(config.orchestrator.exit_rule, ExitRule::AtTarget);
        assert_eq!(config.orchestrator.max_scale_polls, Some(30));
        assert_eq!(config.cluster.context.as_deref(), Some("staging"));
        assert_eq!(config.cluster.namespace, "load");
    }

    #[test]
    fn zero_target_from_flags_fails_validation() {
        let mut config = ArenaConfig::default();
        BattleArgs {
            target: Some(0),
            ..args()
        }
        .apply(&mut config);
        assert!(config.validate().is_err());
    }
}
