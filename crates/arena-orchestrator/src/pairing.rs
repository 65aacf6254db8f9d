//! Pairing — match rooms positionally and start a battle per pair.
//!
//! Pair `i` is `rooms_a[i]` against `rooms_b[i]`; the longer list's tail is
//! ignored. Pairs run on a worker pool bounded by `concurrency`. A worker
//! holds its permit through the post-trigger pause, so the pause paces each
//! worker. Every failure is captured in the pair's outcome; nothing aborts
//! the batch and nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use arena_core::{BattlePair, Room};
use arena_session::{ParticipantResolver, ResolveError};
use arena_trigger::{BattleTrigger, TriggerError};

use crate::sleep::Sleeper;

/// How one pair ended.
#[derive(Debug)]
pub enum PairOutcome {
    Triggered {
        index: usize,
        entity_id: String,
    },
    /// At least one room had no host; no battle was attempted.
    Unresolved {
        index: usize,
        room_a: String,
        room_b: String,
        error_a: Option<ResolveError>,
        error_b: Option<ResolveError>,
    },
    TriggerFailed {
        index: usize,
        entity_id: String,
        error: TriggerError,
    },
}

impl PairOutcome {
    pub fn index(&self) -> usize {
        match self {
            PairOutcome::Triggered { index, .. }
            | PairOutcome::Unresolved { index, .. }
            | PairOutcome::TriggerFailed { index, .. } => *index,
        }
    }

    pub fn is_triggered(&self) -> bool {
        matches!(self, PairOutcome::Triggered { .. })
    }
}

/// Per-pair outcomes of one pairing pass, in pair order.
#[derive(Debug, Default)]
pub struct PairingReport {
    pub outcomes: Vec<PairOutcome>,
}

impl PairingReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn triggered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_triggered()).count()
    }

    pub fn unresolved(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, PairOutcome::Unresolved { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, PairOutcome::TriggerFailed { .. }))
            .count()
    }
}

pub struct Pairing {
    resolver: ParticipantResolver,
    trigger: Arc<dyn BattleTrigger>,
    sleeper: Arc<dyn Sleeper>,
    pause: Duration,
    concurrency: usize,
}

impl Pairing {
    pub fn new(
        resolver: ParticipantResolver,
        trigger: Arc<dyn BattleTrigger>,
        sleeper: Arc<dyn Sleeper>,
        pause: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            resolver,
            trigger,
            sleeper,
            pause,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn run(&self, rooms_a: &[Room], rooms_b: &[Room]) -> PairingReport {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, (room_a, room_b)) in rooms_a.iter().zip(rooms_b).enumerate() {
            // Taking the permit before spawning dispatches pairs in order.
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                break;
            };

            let resolver = self.resolver.clone();
            let trigger = self.trigger.clone();
            let sleeper = self.sleeper.clone();
            let pause = self.pause;
            let room_a = room_a.name().to_string();
            let room_b = room_b.name().to_string();

            tasks.spawn(async move {
                let outcome = attempt(index, room_a, room_b, &resolver, trigger.as_ref()).await;
                if !matches!(outcome, PairOutcome::Unresolved { .. }) {
                    sleeper.sleep(pause).await;
                }
                drop(permit);
                outcome
            });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!(error = %e, "pairing task panicked"),
            }
        }
        outcomes.sort_by_key(PairOutcome::index);

        PairingReport { outcomes }
    }
}

async fn attempt(
    index: usize,
    room_a: String,
    room_b: String,
    resolver: &ParticipantResolver,
    trigger: &dyn BattleTrigger,
) -> PairOutcome {
    let (host_a, host_b) = tokio::join!(resolver.resolve(&room_a), resolver.resolve(&room_b));

    let (host_a, host_b) = match (host_a, host_b) {
        (Ok(a), Ok(b)) => (a, b),
        (a, b) => {
            let error_a = a.err();
            let error_b = b.err();
            warn!(
                index,
                %room_a,
                %room_b,
                error_a = %describe(&error_a),
                error_b = %describe(&error_b),
                "error getting participants"
            );
            return PairOutcome::Unresolved {
                index,
                room_a,
                room_b,
                error_a,
                error_b,
            };
        }
    };

    let pair = BattlePair {
        room_a,
        room_b,
        host_a,
        host_b,
    };
    let entity_id = pair.entity_id();

    match trigger.trigger(&pair).await {
        Ok(()) => {
            info!(index, %entity_id, host_a = %pair.host_a, host_b = %pair.host_b, "battle started");
            PairOutcome::Triggered { index, entity_id }
        }
        Err(error) => {
            warn!(index, %entity_id, error = %error, "error starting battle");
            PairOutcome::TriggerFailed {
                index,
                entity_id,
                error,
            }
        }
    }
}

fn describe(error: &Option<ResolveError>) -> String {
    match error {
        Some(e) => e.to_string(),
        None => "ok".to_string(),
    }
}
