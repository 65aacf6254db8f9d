//! arena-core — configuration and shared domain types.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ArenaConfig, ClusterBackend, ExitRule, parse_duration};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
