//! arena.toml configuration parser.
//!
//! Every section and field is optional; missing values fall back to the
//! defaults documented on each field. Secrets are normally supplied through
//! the environment (see [`ArenaConfig::apply_env`]) rather than the file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Environment variable holding the LiveKit API key.
pub const ENV_LIVEKIT_API_KEY: &str = "ARENA_LIVEKIT_API_KEY";
/// Environment variable holding the LiveKit API secret.
pub const ENV_LIVEKIT_API_SECRET: &str = "ARENA_LIVEKIT_API_SECRET";
/// Environment variable holding a Pub/Sub OAuth access token.
pub const ENV_PUBSUB_TOKEN: &str = "ARENA_PUBSUB_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub cluster: ClusterConfig,
    pub session: SessionConfig,
    pub battle: BattleConfig,
    pub orchestrator: OrchestratorConfig,
    pub backfill: BackfillConfig,
}

/// Which cluster control implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClusterBackend {
    /// Shell out to `kubectl`.
    #[default]
    Kubectl,
    /// Talk to the API server directly.
    Kube,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Default: `kubectl`.
    pub backend: ClusterBackend,
    /// Path or name of the kubectl binary. Default: `kubectl`.
    pub kubectl_path: String,
    /// Kubeconfig context. Default: the current context.
    pub context: Option<String>,
    /// Default: `live-kit`.
    pub namespace: String,
    /// First pool (pool index 1). Default: `livekit-loadtest-battle-1`.
    pub pool_a: String,
    /// Second pool (pool index 2). Default: `livekit-loadtest-battle-2`.
    pub pool_b: String,
    /// Member label selector; `{pool}` is replaced with the pool name.
    /// Default: `app.kubernetes.io/instance={pool}`.
    pub selector: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            backend: ClusterBackend::Kubectl,
            kubectl_path: "kubectl".to_string(),
            context: None,
            namespace: "live-kit".to_string(),
            pool_a: "livekit-loadtest-battle-1".to_string(),
            pool_b: "livekit-loadtest-battle-2".to_string(),
            selector: "app.kubernetes.io/instance={pool}".to_string(),
        }
    }
}

impl ClusterConfig {
    /// Label selector matching the members of `pool`.
    pub fn selector_for(&self, pool: &str) -> String {
        self.selector.replace("{pool}", pool)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// LiveKit server URL (`ws`, `wss`, `http` or `https`).
    pub host: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    /// Identity suffix marking a room's publisher. Default: `_pub_0`.
    pub publisher_suffix: String,
    /// Lifetime of the access tokens minted per request. Default: `10m`.
    pub token_ttl: String,
    /// Default: `30s`.
    pub request_timeout: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "ws://localhost:7880".to_string(),
            api_key: None,
            api_secret: None,
            publisher_suffix: "_pub_0".to_string(),
            token_ttl: "10m".to_string(),
            request_timeout: "30s".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Endpoint receiving the battle start request.
    pub endpoint: String,
    /// Default: `30s`.
    pub request_timeout: String,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/livestream-service/v1/internal/startBattle"
                .to_string(),
            request_timeout: "30s".to_string(),
        }
    }
}

/// When the scale-up loop considers the pools settled.
///
/// `OneBelowTarget` is the historical behaviour: the loop exits as soon as
/// both pools report `target - 1`, right after requesting the final
/// increment, so listing usually runs before the last members exist. A pool
/// that already sits at `target` never satisfies it. `AtTarget` waits for
/// both pools to report `target`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitRule {
    #[default]
    OneBelowTarget,
    AtTarget,
}

impl ExitRule {
    /// The size both pools must report for the loop to exit.
    pub fn settle_size(self, target: u32) -> u32 {
        match self {
            ExitRule::OneBelowTarget => target.saturating_sub(1),
            ExitRule::AtTarget => target,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Desired size of each pool. Default: 2.
    pub target: u32,
    /// Rooms derived per pool member. Default: 2.
    pub fan_out: u32,
    /// Pause between scale polls. Default: `60s`.
    pub poll_interval: String,
    /// Pause after each battle trigger. Default: `1s`.
    pub trigger_pause: String,
    /// Default: `one-below-target`.
    pub exit_rule: ExitRule,
    /// Pairs processed at once. Default: 1.
    pub concurrency: usize,
    /// Give up scaling after this many polls. Default: unbounded.
    pub max_scale_polls: Option<u32>,
    /// Room naming template with `{pool}`, `{slot}` and `{member}`
    /// placeholders. Default: `d{pool}-{slot}-{member}`.
    pub room_template: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            target: 2,
            fan_out: 2,
            poll_interval: "60s".to_string(),
            trigger_pause: "1s".to_string(),
            exit_rule: ExitRule::OneBelowTarget,
            concurrency: 1,
            max_scale_polls: None,
            room_template: "d{pool}-{slot}-{member}".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackfillConfig {
    /// Cloud project owning the topic.
    pub project: Option<String>,
    /// Default: `complete-livestream-recording-topic`.
    pub topic: String,
    /// Pub/Sub API base URL. Default: `https://pubsub.googleapis.com`.
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Messages per publish request. Default: 100.
    pub batch_size: usize,
    /// Default: `30s`.
    pub request_timeout: String,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            project: None,
            topic: "complete-livestream-recording-topic".to_string(),
            endpoint: "https://pubsub.googleapis.com".to_string(),
            access_token: None,
            batch_size: 100,
            request_timeout: "30s".to_string(),
        }
    }
}

impl ArenaConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Fill secrets from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Fill secrets using `lookup`. Values already present are overwritten
    /// by non-empty variables.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(key) = get(ENV_LIVEKIT_API_KEY) {
            self.session.api_key = Some(key);
        }
        if let Some(secret) = get(ENV_LIVEKIT_API_SECRET) {
            self.session.api_secret = Some(secret);
        }
        if let Some(token) = get(ENV_PUBSUB_TOKEN) {
            self.backfill.access_token = Some(token);
        }
    }

    /// Reject values the orchestrator cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        let orch = &self.orchestrator;
        if orch.target == 0 {
            return Err(ConfigError::Invalid("orchestrator.target must be at least 1".into()));
        }
        if orch.fan_out == 0 {
            return Err(ConfigError::Invalid("orchestrator.fan_out must be at least 1".into()));
        }
        if orch.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "orchestrator.concurrency must be at least 1".into(),
            ));
        }
        for placeholder in ["{slot}", "{member}"] {
            if !orch.room_template.contains(placeholder) {
                return Err(ConfigError::Invalid(format!(
                    "orchestrator.room_template must contain {placeholder}"
                )));
            }
        }
        if self.cluster.pool_a == self.cluster.pool_b {
            return Err(ConfigError::Invalid(
                "cluster.pool_a and cluster.pool_b must differ".into(),
            ));
        }
        if self.backfill.batch_size == 0 {
            return Err(ConfigError::Invalid("backfill.batch_size must be at least 1".into()));
        }

        for (field, value) in [
            ("orchestrator.poll_interval", &orch.poll_interval),
            ("orchestrator.trigger_pause", &orch.trigger_pause),
            ("session.token_ttl", &self.session.token_ttl),
            ("session.request_timeout", &self.session.request_timeout),
            ("battle.request_timeout", &self.battle.request_timeout),
            ("backfill.request_timeout", &self.backfill.request_timeout),
        ] {
            if parse_duration(value).is_none() {
                return Err(ConfigError::Invalid(format!("{field}: bad duration {value:?}")));
            }
        }
        Ok(())
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
///
/// A bare number is read as seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

/// Like [`parse_duration`], falling back to `default` on garbage.
pub fn duration_or(s: &str, default: Duration) -> Duration {
    parse_duration(s).unwrap_or(default)
}
