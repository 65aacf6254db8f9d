//! arena-orchestrator — scale two pools, derive rooms, start battles.
//!
//! # Run
//!
//! ```text
//! Scaling   poll sizes; +1 on every pool below target; sleep; repeat
//!           until the exit rule holds
//! Listing   list members of both pools; fan each member out into rooms
//! Pairing   rooms_a[i] vs rooms_b[i] for i < min(len_a, len_b):
//!           resolve both hosts → trigger battle → pause
//! Done      log the summary, return the PairingReport
//! ```
//!
//! All delays go through an injected [`Sleeper`], all cluster access
//! through a `dyn ClusterControl`, so tests drive the loop with fakes and
//! no wall-clock waits.

pub mod error;
pub mod orchestrator;
pub mod pairing;
pub mod scaling;
pub mod settings;
pub mod sleep;

pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::{Orchestrator, Phase};
pub use pairing::{PairOutcome, Pairing, PairingReport};
pub use scaling::{ScaleController, ScaleDecision};
pub use settings::OrchestratorSettings;
pub use sleep::{RecordingSleeper, Sleeper, TokioSleeper};
