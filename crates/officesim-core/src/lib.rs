//! Time control, scheduling, and tick orchestration for the office simulation.
//!
//! This crate owns simulated time and the per-frame order of work: advance
//! the clock, run due tasks, announce minute and hour boundaries, move the
//! agents, then update registered collaborators.
//!
//! # Modules
//!
//! - [`bus`] -- Topic-keyed publish/subscribe with per-listener isolation.
//! - [`clock`] -- [`SimClock`], time-scale clamping, and clock formatting.
//! - [`config`] -- Configuration loading from `officesim-config.yaml`.
//! - [`control`] -- [`RunControl`], shared pause/stop/pacing state.
//! - [`events`] -- [`SimEvent`] and [`Topic`].
//! - [`fault`] -- Fault isolation for tasks, listeners, and collaborators.
//! - [`orchestrator`] -- [`Simulation`], the tick pipeline.
//! - [`persistence`] -- [`SaveData`] and the [`SaveStore`] backends.
//! - [`runner`] -- [`run_simulation`], the async frame loop.
//! - [`scheduler`] -- One-shot and recurring game-time tasks.
//! - [`subsystem`] -- The [`Subsystem`] contract for collaborators.
//! - [`time`] -- [`TimeController`]: clock, scheduler, and bus together.

pub mod bus;
pub mod clock;
pub mod config;
pub mod control;
pub mod events;
pub mod fault;
pub mod orchestrator;
pub mod persistence;
pub mod runner;
pub mod scheduler;
pub mod subsystem;
pub mod time;

pub use bus::{Delivery, EventBus, Listener};
pub use clock::SimClock;
pub use config::{ConfigError, SimulationConfig};
pub use control::{RunControl, SimulationEndReason};
pub use events::{SimEvent, Topic};
pub use fault::{Fault, ListenerFault, TaskFault};
pub use orchestrator::{SetupError, Simulation, TickSummary};
pub use persistence::{JsonFileStore, MemoryStore, PersistenceError, SaveData, SaveStore};
pub use runner::{NoOpCallback, SimulationResult, TickCallback, log_simulation_end, run_simulation};
pub use scheduler::{SchedulingError, TaskContext};
pub use subsystem::{Subsystem, SubsystemContext, SubsystemError};
pub use time::{TimeController, TimeSnapshot, TimeSnapshotPatch};
