#![forbid(unsafe_code)]

//! Runtime layer: cooperative schedules, animators, and configuration.
//!
//! # Role in Diagonal
//! `diagonal-runtime` wires a [`Window`](diagonal_core::Window) and a
//! [`Reconciler`](diagonal_render::Reconciler) into a timed loop. Each
//! viewport becomes one [`Schedule`]; a [`Driver`] multiplexes them on one
//! thread until a [`StopHandle`] fires.
//!
//! # Primary responsibilities
//! - **Schedule**: a payload threaded through a cyclic list of operations.
//! - **Driver**: per-schedule deadlines on one thread, driven by a [`Clock`].
//! - **Animator**: the advance and exhaustion-check operations.
//! - **Config**: [`DiagonalConfig`] with validation and optional TOML
//!   loading (`config` feature).

pub mod animator;
pub mod config;
pub mod driver;
pub mod schedule;
pub mod stop;

pub use animator::{
    AnimatorError, AnimatorOptions, AnimatorSchedule, AnimatorState, Cadence, animator,
};
pub use config::{BudgetConfig, ConfigError, DiagonalConfig, ViewportConfig};
pub use driver::{Clock, Driver, ManualClock, SystemClock};
pub use schedule::{Operation, Schedule, ScheduleError, Scheduled};
pub use stop::{StopHandle, StopToken};
