//! arena-cluster — scale pools and list their members.
//!
//! Everything above this crate talks to a `dyn ClusterControl`; which
//! backend sits behind it is decided once at start-up by [`connect`].
//!
//! ```text
//! ClusterControl
//!   ├── KubectlCluster  (child `kubectl` processes)
//!   ├── KubeCluster     (Kubernetes API, scale subresource)
//!   └── InMemoryCluster (tests, dry runs)
//! ```

pub mod api;
pub mod control;
pub mod error;
pub mod kubectl;
pub mod memory;

use std::sync::Arc;

use arena_core::config::{ClusterBackend, ClusterConfig};

pub use api::KubeCluster;
pub use control::ClusterControl;
pub use error::{ClusterError, ClusterResult};
pub use kubectl::KubectlCluster;
pub use memory::InMemoryCluster;

/// Build the backend selected by `config.backend`.
pub async fn connect(config: &ClusterConfig) -> ClusterResult<Arc<dyn ClusterControl>> {
    Ok(match config.backend {
        ClusterBackend::Kubectl => Arc::new(KubectlCluster::new(config)),
        ClusterBackend::Kube => Arc::new(KubeCluster::connect(config).await?),
    })
}
