//! The battle run: Scaling → Listing → Pairing → Done.

use std::sync::Arc;

use tracing::{info, warn};

use arena_cluster::ClusterControl;
use arena_core::config::ExitRule;
use arena_core::{Room, derive_rooms};
use arena_session::ParticipantResolver;
use arena_trigger::BattleTrigger;

use crate::error::OrchestratorResult;
use crate::pairing::{Pairing, PairingReport};
use crate::scaling::ScaleController;
use crate::settings::OrchestratorSettings;
use crate::sleep::{Sleeper, TokioSleeper};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Scaling,
    Listing,
    Pairing,
    Done,
}

pub struct Orchestrator {
    settings: OrchestratorSettings,
    cluster: Arc<dyn ClusterControl>,
    resolver: ParticipantResolver,
    trigger: Arc<dyn BattleTrigger>,
    sleeper: Arc<dyn Sleeper>,
    phase: Phase,
}

impl Orchestrator {
    pub fn new(
        settings: OrchestratorSettings,
        cluster: Arc<dyn ClusterControl>,
        resolver: ParticipantResolver,
        trigger: Arc<dyn BattleTrigger>,
    ) -> Self {
        Self {
            settings,
            cluster,
            resolver,
            trigger,
            sleeper: Arc::new(TokioSleeper),
            phase: Phase::Scaling,
        }
    }

    /// Replace the sleeper used for poll and pacing delays.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Drive one run to completion.
    ///
    /// Only the scaling phase can fail (when `max_scale_polls` is set);
    /// everything after it logs errors and carries on.
    pub async fn run(&mut self) -> OrchestratorResult<PairingReport> {
        self.enter(Phase::Scaling);
        if self.settings.exit_rule == ExitRule::OneBelowTarget {
            warn!(
                target_size = self.settings.target,
                "exit rule one-below-target: members are listed before the final increment lands"
            );
        }
        ScaleController::new(self.cluster.clone(), self.sleeper.clone(), &self.settings)
            .converge()
            .await?;

        self.enter(Phase::Listing);
        let (rooms_a, rooms_b) = self.list_rooms().await;

        self.enter(Phase::Pairing);
        let pairing = Pairing::new(
            self.resolver.clone(),
            self.trigger.clone(),
            self.sleeper.clone(),
            self.settings.trigger_pause,
            self.settings.concurrency,
        );
        let report = pairing.run(&rooms_a, &rooms_b).await;

        self.enter(Phase::Done);
        info!(
            attempted = report.attempted(),
            triggered = report.triggered(),
            unresolved = report.unresolved(),
            failed = report.failed(),
            "battle setup completed"
        );
        Ok(report)
    }

    /// List both pools and expand their members into rooms.
    ///
    /// A failed listing yields no rooms for that pool.
    pub async fn list_rooms(&self) -> (Vec<Room>, Vec<Room>) {
        let [pool_a, pool_b] = &self.settings.pools;
        (self.rooms_for(1, pool_a).await, self.rooms_for(2, pool_b).await)
    }

    async fn rooms_for(&self, index: u32, pool: &str) -> Vec<Room> {
        let members = match self.cluster.list_members(pool).await {
            Ok(members) => members,
            Err(e) => {
                warn!(%pool, error = %e, "failed to list pool members");
                Vec::new()
            }
        };
        let rooms = derive_rooms(
            &self.settings.room_template,
            index,
            &members,
            self.settings.fan_out,
        );
        info!(%pool, members = members.len(), rooms = rooms.len(), "derived rooms");
        rooms
    }

    fn enter(&mut self, phase: Phase) {
        info!(from = ?self.phase, to = ?phase, "phase transition");
        self.phase = phase;
    }
}
