//! Per-agent state.
//!
//! An [`Agent`] stores its own position, behaviour state, planned path and
//! tick timers. The desk it holds is recorded as a [`DeskId`]; the desk
//! itself only carries an occupied flag. Only the simulator in this crate
//! can change which desk an agent holds.

use std::collections::VecDeque;

use officesim_types::{AgentId, AgentSnapshot, AgentStatus, AreaId, ComplaintCategory, ComplaintSnapshot, DeskId};
use officesim_world::{Body, Mover, Point, Rect};

/// What a moving agent does once its path runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveGoal {
    /// Sit down at the held desk and start working.
    Desk,
    /// Start the activity at the given area.
    Activity(AreaId),
    /// Nothing in particular; rest on arrival.
    Spot,
}

/// Tick counters driving state transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentTimers {
    /// Steps left before a working agent reconsiders.
    pub work: u32,
    /// Steps left before a wandering or resting agent reconsiders.
    pub rest: u32,
    /// Steps left in the current activity.
    pub activity: u32,
    /// Steps left on the name label.
    pub name: u32,
}

/// A complaint currently shown above an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveComplaint {
    /// What the agent is complaining about.
    pub category: ComplaintCategory,
    /// Steps left before the bubble disappears.
    pub remaining_ticks: u32,
}

/// A simulated office worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub(crate) id: AgentId,
    pub(crate) name: String,
    pub(crate) position: Point,
    pub(crate) speed: f64,
    pub(crate) status: AgentStatus,
    pub(crate) path: VecDeque<Point>,
    pub(crate) goal: MoveGoal,
    pub(crate) desk: Option<DeskId>,
    pub(crate) activity: Option<AreaId>,
    pub(crate) timers: AgentTimers,
    pub(crate) complaint: Option<ActiveComplaint>,
    pub(crate) next_complaint_in: u32,
}

impl Agent {
    /// Unique identifier.
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Top-left corner of the bounding box.
    pub const fn position(&self) -> Point {
        self.position
    }

    /// Walking speed in pixels per step.
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// Current behaviour state.
    pub const fn status(&self) -> AgentStatus {
        self.status
    }

    /// Remaining waypoints.
    pub const fn path(&self) -> &VecDeque<Point> {
        &self.path
    }

    /// Arrival goal of the current or most recent move.
    pub const fn goal(&self) -> MoveGoal {
        self.goal
    }

    /// Desk held by the agent.
    pub const fn desk(&self) -> Option<DeskId> {
        self.desk
    }

    /// Activity area the agent is heading to or occupying.
    pub const fn activity(&self) -> Option<AreaId> {
        self.activity
    }

    /// Tick counters.
    pub const fn timers(&self) -> AgentTimers {
        self.timers
    }

    /// Active complaint, if any.
    pub const fn complaint(&self) -> Option<ActiveComplaint> {
        self.complaint
    }

    /// Steps until the next complaint attempt.
    pub const fn next_complaint_in(&self) -> u32 {
        self.next_complaint_in
    }

    /// Whether the agent is currently occupying the given area.
    pub fn is_doing_activity_at(&self, area: AreaId) -> bool {
        self.status == AgentStatus::Activity && self.activity == Some(area)
    }

    pub(crate) fn bounds(&self, size: f64) -> Rect {
        Rect::square(self.position, size)
    }

    pub(crate) fn body(&self, size: f64) -> Body {
        Body {
            id: self.id,
            rect: self.bounds(size),
        }
    }

    pub(crate) const fn mover(&self) -> Mover {
        Mover::new(self.id, self.desk)
    }

    /// Read-only view for the renderer.
    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id,
            name: self.name.clone(),
            x: self.position.x,
            y: self.position.y,
            status: self.status,
            desk: self.desk,
            complaint: self.complaint.map(|c| ComplaintSnapshot {
                category: c.category,
                message: c.category.message().to_owned(),
                remaining_ticks: c.remaining_ticks,
            }),
            name_timer: self.timers.name,
        }
    }
}
