//! Stochastic simulation of microtubule dynamics in a mitotic spindle.
//!
//! Nine antiparallel microtubules grow, undergo catastrophe, shrink and are
//! either rescued or lost at the pole. A rescue-probability field and a fixed
//! neighbor grid couple them together.
//!
//! Main components:
//! - [`config`] - validated simulation parameters.
//! - [`filament`] - per-microtubule state machine and catastrophe sampling.
//! - [`topology`] - 3×3 neighbor grid and loss-triggered rearrangement.
//! - [`rescue`] - rescue probability field for each mode.
//! - [`recorder`] - line-oriented event records.
//! - [`engine`] - the tick loop tying everything together.
//! - [`error`] / [`types`] - shared errors, ids and orientation.

pub mod config;
pub mod engine;
pub mod error;
pub mod filament;
pub mod recorder;
pub mod rescue;
pub mod topology;
pub mod types;

pub use config::{Config, RescueMode};
pub use engine::{RunSummary, Simulation, Termination, Tick};
pub use error::{ConfigError, ParseRecordError};
pub use recorder::{EventKind, EventRecorder, Record};
