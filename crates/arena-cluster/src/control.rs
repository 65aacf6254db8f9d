//! The capability every cluster backend provides.

use async_trait::async_trait;

use crate::error::ClusterResult;

/// Scale and inspect named pools in one namespace.
///
/// Implementations never retry and never wait for a scale request to
/// converge; callers poll [`ClusterControl::pool_size`] instead.
#[async_trait]
pub trait ClusterControl: Send + Sync {
    /// Request that `pool` run `replicas` members.
    async fn set_pool_size(&self, pool: &str, replicas: u32) -> ClusterResult<()>;

    /// Desired size of `pool`. Unreadable size fields count as zero.
    async fn pool_size(&self, pool: &str) -> ClusterResult<u32>;

    /// Names of the members currently matching the pool's selector.
    async fn list_members(&self, pool: &str) -> ClusterResult<Vec<String>>;
}
