//! Cluster control by shelling out to `kubectl`.
//!
//! Commands issued, with `--context <ctx>` prepended when a context is set:
//!
//! ```text
//! kubectl scale deployment <pool> --replicas=<n> -n <ns>
//! kubectl get deployment <pool> -n <ns> -o jsonpath={.spec.replicas}
//! kubectl get pods -n <ns> -l <selector> -o jsonpath={.items[*].metadata.name}
//! ```

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use arena_core::config::ClusterConfig;

use crate::control::ClusterControl;
use crate::error::{ClusterError, ClusterResult};

pub struct KubectlCluster {
    config: ClusterConfig,
}

impl KubectlCluster {
    pub fn new(config: &ClusterConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn base_args(&self) -> Vec<String> {
        match &self.config.context {
            Some(ctx) => vec!["--context".to_string(), ctx.clone()],
            None => Vec::new(),
        }
    }

    fn scale_args(&self, pool: &str, replicas: u32) -> Vec<String> {
        let mut args = self.base_args();
        args.extend([
            "scale".to_string(),
            "deployment".to_string(),
            pool.to_string(),
            format!("--replicas={replicas}"),
            "-n".to_string(),
            self.config.namespace.clone(),
        ]);
        args
    }

    fn size_args(&self, pool: &str) -> Vec<String> {
        let mut args = self.base_args();
        args.extend([
            "get".to_string(),
            "deployment".to_string(),
            pool.to_string(),
            "-n".to_string(),
            self.config.namespace.clone(),
            "-o".to_string(),
            "jsonpath={.spec.replicas}".to_string(),
        ]);
        args
    }

    fn members_args(&self, pool: &str) -> Vec<String> {
        let mut args = self.base_args();
        args.extend([
            "get".to_string(),
            "pods".to_string(),
            "-n".to_string(),
            self.config.namespace.clone(),
            "-l".to_string(),
            self.config.selector_for(pool),
            "-o".to_string(),
            "jsonpath={.items[*].metadata.name}".to_string(),
        ]);
        args
    }

    /// Run kubectl and return its trimmed stdout.
    async fn run(&self, args: &[String]) -> ClusterResult<String> {
        debug!(program = %self.config.kubectl_path, ?args, "running kubectl");
        let output = Command::new(&self.config.kubectl_path)
            .args(args)
            .output()
            .await
            .map_err(|source| ClusterError::Spawn {
                program: self.config.kubectl_path.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ClusterError::CommandFailed {
                command: format!("{} {}", self.config.kubectl_path, args.join(" ")),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl ClusterControl for KubectlCluster {
    async fn set_pool_size(&self, pool: &str, replicas: u32) -> ClusterResult<()> {
        self.run(&self.scale_args(pool, replicas)).await?;
        Ok(())
    }

    async fn pool_size(&self, pool: &str) -> ClusterResult<u32> {
        let output = self.run(&self.size_args(pool)).await?;
        Ok(parse_replicas(pool, &output))
    }

    async fn list_members(&self, pool: &str) -> ClusterResult<Vec<String>> {
        let output = self.run(&self.members_args(pool)).await?;
        Ok(output.split_whitespace().map(str::to_string).collect())
    }
}

/// Read the leading integer of kubectl's output; anything else is zero.
pub(crate) fn parse_replicas(pool: &str, output: &str) -> u32 {
    let field = output.split_whitespace().next().unwrap_or_default();
    match field.parse::<u32>() {
        Ok(n) => n,
        Err(_) => {
            debug!(%pool, %output, "unreadable replica count, treating as 0");
            0
        }
    }
}
