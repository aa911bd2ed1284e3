//! Read-only snapshots handed to the render collaborator once per tick.
//!
//! Snapshots are detached copies: nothing a renderer does with them can
//! reach back into simulation state.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{AgentStatus, ComplaintCategory};
use crate::ids::{AgentId, DeskId};

/// An agent's active complaint as shown in its speech bubble.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ComplaintSnapshot {
    /// Complaint category.
    pub category: ComplaintCategory,
    /// Bubble text.
    pub message: String,
    /// Ticks left before the bubble disappears.
    pub remaining_ticks: u32,
}

/// Per-agent view for drawing a single worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentSnapshot {
    /// Agent identifier.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Top-left x coordinate of the agent's bounding box.
    pub x: f64,
    /// Top-left y coordinate of the agent's bounding box.
    pub y: f64,
    /// Current behaviour state.
    pub status: AgentStatus,
    /// Desk held by the agent, if any.
    pub desk: Option<DeskId>,
    /// Active complaint, if any.
    pub complaint: Option<ComplaintSnapshot>,
    /// Ticks left on the name label.
    pub name_timer: u32,
}

impl AgentSnapshot {
    /// Whether the renderer should draw the name label this tick.
    pub const fn name_visible(&self) -> bool {
        self.name_timer > 0
    }
}

/// Per-desk view: position, size, and occupancy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DeskSnapshot {
    /// Desk identifier.
    pub id: DeskId,
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
    /// Whether an agent currently holds this desk.
    pub occupied: bool,
}

/// The complete per-tick view of the office floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OfficeSnapshot {
    /// Game time in seconds at which the snapshot was taken.
    pub game_time: f64,
    /// Every agent, in population order.
    pub agents: Vec<AgentSnapshot>,
    /// Every desk, in arena order.
    pub desks: Vec<DeskSnapshot>,
}

impl OfficeSnapshot {
    /// Number of agents currently showing a complaint bubble.
    pub fn complaining_count(&self) -> usize {
        self.agents.iter().filter(|a| a.complaint.is_some()).count()
    }
}
