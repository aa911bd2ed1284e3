//! Error types for the officesim-agents crate.
//!
//! Behaviour steps never fail; these errors come from population management
//! and from the desk bookkeeping that backs the occupancy invariant.

use officesim_types::{AgentId, DeskId};
use officesim_world::WorldError;

/// Errors that can occur during agent population operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Agent with the given ID is not in the population.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// The agent does not hold the desk it tried to release.
    #[error("agent {agent} does not hold desk {desk}")]
    DeskNotHeld {
        /// The agent attempting the release.
        agent: AgentId,
        /// The desk in question.
        desk: DeskId,
    },

    /// No safe floor position could be found for a new agent.
    #[error("no free placement for a new agent after {attempts} attempts")]
    NoFreePlacement {
        /// Total sampling attempts made.
        attempts: u32,
    },

    /// A layout operation failed.
    #[error(transparent)]
    World(#[from] WorldError),
}
