//! Error types for the `officesim-world` crate.

use officesim_types::{AreaId, DeskId};

/// Errors that can occur during layout operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The world extents cannot hold a single agent.
    #[error("invalid world dimensions {width}x{height} for agent size {agent_size}")]
    InvalidDimensions {
        /// Requested world width.
        width: f64,
        /// Requested world height.
        height: f64,
        /// Edge length of an agent's bounding box.
        agent_size: f64,
    },

    /// A desk id does not exist in the arena.
    #[error("desk not found: {0}")]
    DeskNotFound(DeskId),

    /// An activity area id does not exist in the layout.
    #[error("activity area not found: {0}")]
    AreaNotFound(AreaId),

    /// Tried to occupy a desk that is already held.
    #[error("desk {0} is already occupied")]
    DeskOccupied(DeskId),

    /// Tried to vacate a desk that nobody holds.
    #[error("desk {0} is not occupied")]
    DeskVacant(DeskId),

    /// The arena has more entries than an index id can address.
    #[error("layout arena is full")]
    ArenaFull,
}
