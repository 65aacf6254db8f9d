//! Cluster control through the Kubernetes API.
//!
//! Reads and patches the `scale` subresource of each pool's `Deployment`
//! and lists its `Pod`s by label selector.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::config::KubeConfigOptions;
use kube::{Client, Config};
use tracing::{debug, info};

use arena_core::config::ClusterConfig;

use crate::control::ClusterControl;
use crate::error::{ClusterError, ClusterResult};

pub struct KubeCluster {
    deployments: Api<Deployment>,
    pods: Api<Pod>,
    config: ClusterConfig,
}

impl KubeCluster {
    /// Build a client from the local kubeconfig (or in-cluster config when
    /// no context is named).
    pub async fn connect(config: &ClusterConfig) -> ClusterResult<Self> {
        let kube_config = match &config.context {
            Some(context) => {
                let options = KubeConfigOptions {
                    context: Some(context.clone()),
                    ..Default::default()
                };
                Config::from_kubeconfig(&options)
                    .await
                    .map_err(|e| ClusterError::Connect(e.to_string()))?
            }
            None => Config::infer()
                .await
                .map_err(|e| ClusterError::Connect(e.to_string()))?,
        };

        let client = Client::try_from(kube_config)?;
        info!(
            namespace = %config.namespace,
            context = config.context.as_deref().unwrap_or("<default>"),
            "kubernetes client ready"
        );

        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &ClusterConfig) -> Self {
        Self {
            deployments: Api::namespaced(client.clone(), &config.namespace),
            pods: Api::namespaced(client, &config.namespace),
            config: config.clone(),
        }
    }
}

#[async_trait]
impl ClusterControl for KubeCluster {
    async fn set_pool_size(&self, pool: &str, replicas: u32) -> ClusterResult<()> {
        let patch = serde_json::json!({ "spec": { "replicas": replicas } });
        self.deployments
            .patch_scale(pool, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn pool_size(&self, pool: &str) -> ClusterResult<u32> {
        let scale = self.deployments.get_scale(pool).await?;
        let replicas = scale.spec.and_then(|spec| spec.replicas);
        match replicas.and_then(|r| u32::try_from(r).ok()) {
            Some(n) => Ok(n),
            None => {
                debug!(%pool, ?replicas, "unreadable replica count, treating as 0");
                Ok(0)
            }
        }
    }

    async fn list_members(&self, pool: &str) -> ClusterResult<Vec<String>> {
        let selector = self.config.selector_for(pool);
        let pods = self.pods.list(&ListParams::default().labels(&selector)).await?;
        Ok(pods
            .items
            .into_iter()
            .filter_map(|pod| pod.metadata.name)
            .collect())
    }
}
