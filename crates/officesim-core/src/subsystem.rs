//! The collaborator contract.
//!
//! Anything that reacts to simulated time without being part of the core
//! (statistics, autosave, complaint relief, ...) implements [`Subsystem`]
//! and is registered with the [`Simulation`](crate::Simulation). Once per
//! tick, after the agents have moved, every subsystem is updated in
//! registration order with the tick's game delta.
//!
//! # Integration
//!
//! A subsystem registers its recurring tasks and subscriptions on its first
//! update, guarded by its own `integrated` flag. Recurring task
//! registration is idempotent by name, so integrating twice by mistake is
//! harmless for tasks, but subscriptions would be doubled.

use officesim_agents::{AgentError, AgentSimulator};

use crate::persistence::PersistenceError;
use crate::scheduler::SchedulingError;
use crate::time::TimeController;

/// Errors a subsystem update can report. The orchestrator logs them and
/// carries on with the next subsystem.
#[derive(Debug, thiserror::Error)]
pub enum SubsystemError {
    /// Registering a task failed.
    #[error("scheduling failed: {0}")]
    Scheduling(#[from] SchedulingError),

    /// A population operation failed.
    #[error("agent operation failed: {0}")]
    Agent(#[from] AgentError),

    /// Saving or loading failed.
    #[error("persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    /// Anything else.
    #[error("{message}")]
    Other {
        /// What went wrong.
        message: String,
    },
}

/// What a subsystem can reach during its update.
pub struct SubsystemContext<'a> {
    /// Clock, scheduler and event bus.
    pub time: &'a mut TimeController,
    /// The agent population.
    pub agents: &'a mut AgentSimulator,
}

/// An external collaborator driven by the tick loop.
pub trait Subsystem {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Advance by `game_delta` game seconds.
    ///
    /// Not called while the clock is paused.
    ///
    /// # Errors
    ///
    /// Returns a [`SubsystemError`] when the update could not complete. The
    /// error is logged; it does not stop the simulation.
    fn update(
        &mut self,
        ctx: &mut SubsystemContext<'_>,
        game_delta: f64,
    ) -> Result<(), SubsystemError>;
}
