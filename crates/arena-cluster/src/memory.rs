//! In-memory cluster used by tests and dry runs.
//!
//! Scale requests apply immediately unless the pool is frozen. Members are
//! either set explicitly or generated as `{pool}-{i}` from the current size.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::control::ClusterControl;
use crate::error::{ClusterError, ClusterResult};

#[derive(Debug, Default, Clone)]
struct PoolState {
    size: u32,
    members: Option<Vec<String>>,
    frozen: bool,
    fail_reads: bool,
    fail_scales: bool,
    fail_listing: bool,
}

#[derive(Debug, Default)]
pub struct InMemoryCluster {
    pools: Mutex<HashMap<String, PoolState>>,
    scale_requests: Mutex<Vec<(String, u32)>>,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pool at `size`.
    pub fn with_pool(self, pool: &str, size: u32) -> Self {
        self.update(pool, |state| state.size = size);
        self
    }

    /// Pin the member list of `pool`, regardless of its size.
    pub fn set_members(&self, pool: &str, members: &[&str]) {
        let members = members.iter().map(|m| m.to_string()).collect();
        self.update(pool, |state| state.members = Some(members));
    }

    /// Record scale requests for `pool` without applying them.
    pub fn freeze(&self, pool: &str) {
        self.update(pool, |state| state.frozen = true);
    }

    pub fn fail_reads(&self, pool: &str, fail: bool) {
        self.update(pool, |state| state.fail_reads = fail);
    }

    pub fn fail_scales(&self, pool: &str, fail: bool) {
        self.update(pool, |state| state.fail_scales = fail);
    }

    pub fn fail_listing(&self, pool: &str, fail: bool) {
        self.update(pool, |state| state.fail_listing = fail);
    }

    pub fn size(&self, pool: &str) -> Option<u32> {
        self.lock_pools().get(pool).map(|state| state.size)
    }

    /// Every scale request received, in order, including frozen ones.
    pub fn scale_requests(&self) -> Vec<(String, u32)> {
        self.scale_requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn lock_pools(&self) -> std::sync::MutexGuard<'_, HashMap<String, PoolState>> {
        self.pools.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update(&self, pool: &str, f: impl FnOnce(&mut PoolState)) {
        f(self.lock_pools().entry(pool.to_string()).or_default());
    }

    fn get(&self, pool: &str) -> ClusterResult<PoolState> {
        self.lock_pools()
            .get(pool)
            .cloned()
            .ok_or_else(|| ClusterError::PoolNotFound(pool.to_string()))
    }
}

#[async_trait]
impl ClusterControl for InMemoryCluster {
    async fn set_pool_size(&self, pool: &str, replicas: u32) -> ClusterResult<()> {
        let state = self.get(pool)?;
        if state.fail_scales {
            return Err(ClusterError::Unavailable(pool.to_string()));
        }
        self.scale_requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((pool.to_string(), replicas));
        if !state.frozen {
            self.update(pool, |state| state.size = replicas);
        }
        Ok(())
    }

    async fn pool_size(&self, pool: &str) -> ClusterResult<u32> {
        let state = self.get(pool)?;
        if state.fail_reads {
            return Err(ClusterError::Unavailable(pool.to_string()));
        }
        Ok(state.size)
    }

    async fn list_members(&self, pool: &str) -> ClusterResult<Vec<String>> {
        let state = self.get(pool)?;
        if state.fail_listing {
            return Err(ClusterError::Unavailable(pool.to_string()));
        }
        Ok(state
            .members
            .unwrap_or_else(|| (0..state.size).map(|i| format!("{pool}-{i}")).collect()))
    }
}
