//! Tick callback that renders the office to the log.
//!
//! Every `report_every` ticks it takes an [`OfficeSnapshot`] and logs a
//! status line: clock, scale, how many workers are in each state, and the
//! speech bubbles currently showing. New bubbles are logged as they appear.

use std::collections::BTreeSet;

use officesim_core::clock::format_clock;
use officesim_core::{Simulation, TickCallback, TickSummary};
use officesim_types::{AgentId, AgentStatus, OfficeSnapshot};
use tracing::{debug, info};

/// Ticks between status lines by default (5 s at 60 fps).
pub const DEFAULT_REPORT_EVERY: u64 = 300;

/// Per-state head count from one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// At a desk.
    pub working: usize,
    /// Walking somewhere.
    pub moving: usize,
    /// Idle on the floor.
    pub wandering: usize,
    /// At an activity area.
    pub activity: usize,
    /// Resting after a stroll.
    pub resting: usize,
}

impl StatusCounts {
    /// Count agents per state.
    pub fn from_snapshot(snapshot: &OfficeSnapshot) -> Self {
        let mut counts = Self::default();
        for agent in &snapshot.agents {
            let slot = match agent.status {
                AgentStatus::Working => &mut counts.working,
                AgentStatus::Moving => &mut counts.moving,
                AgentStatus::Wandering => &mut counts.wandering,
                AgentStatus::Activity => &mut counts.activity,
                AgentStatus::Resting => &mut counts.resting,
            };
            *slot = slot.saturating_add(1);
        }
        counts
    }
}

/// Logs the office state as the run goes.
#[derive(Debug)]
pub struct ConsoleCallback {
    report_every: u64,
    bubbles: BTreeSet<AgentId>,
    reports: u64,
}

impl ConsoleCallback {
    /// Report every `report_every` ticks (at least every tick).
    pub fn new(report_every: u64) -> Self {
        Self {
            report_every: report_every.max(1),
            bubbles: BTreeSet::new(),
            reports: 0,
        }
    }

    fn track_bubbles(&mut self, snapshot: &OfficeSnapshot) {
        let mut showing = BTreeSet::new();
        for agent in &snapshot.agents {
            let Some(complaint) = &agent.complaint else {
                continue;
            };
            showing.insert(agent.id);
            if !self.bubbles.contains(&agent.id) {
                info!(
                    name = agent.name.as_str(),
                    category = complaint.category.key(),
                    message = complaint.message.as_str(),
                    "complaint bubble"
                );
            }
        }
        self.bubbles = showing;
    }
}

impl Default for ConsoleCallback {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_EVERY)
    }
}

impl TickCallback for ConsoleCallback {
    fn on_tick(&mut self, summary: &TickSummary, sim: &Simulation) {
        if summary.complaints_raised == 0
            && summary.complaining == self.bubbles.len()
            && summary.tick % self.report_every != 0
        {
            return;
        }

        let snapshot = sim.snapshot();
        self.track_bubbles(&snapshot);

        if summary.tick % self.report_every != 0 {
            return;
        }
        let counts = StatusCounts::from_snapshot(&snapshot);
        self.reports = self.reports.saturating_add(1);
        info!(
            clock = format_clock(summary.game_time),
            scale = summary.time_scale,
            paused = summary.paused,
            population = summary.population,
            working = counts.working,
            moving = counts.moving,
            wandering = counts.wandering,
            activity = counts.activity,
            resting = counts.resting,
            complaining = summary.complaining,
            "office status"
        );
        debug!(
            tick = summary.tick,
            reports = self.reports,
            free_desks = snapshot.desks.iter().filter(|d| !d.occupied).count(),
            "office detail"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use officesim_agents::TickRange;
    use officesim_core::SimulationConfig;

    use super::*;

    #[test]
    fn counts_cover_the_population() {
        let mut config = SimulationConfig::default();
        config.population.initial_agents = 7;
        let mut sim = Simulation::from_config(&config).unwrap();
        for _ in 0..50 {
            sim.run_tick(0.1);
        }
        let counts = StatusCounts::from_snapshot(&sim.snapshot());
        let total =
            counts.working + counts.moving + counts.wandering + counts.activity + counts.resting;
        assert_eq!(total, 7);
    }

    #[test]
    fn tracks_showing_bubbles() {
        let mut config = SimulationConfig::default();
        config.population.initial_agents = 4;
        config.complaints.first_delay = TickRange::new(1, 1);
        let mut sim = Simulation::from_config(&config).unwrap();
        let mut callback = ConsoleCallback::new(1_000);

        let summary = sim.run_tick(1.0 / 60.0);
        callback.on_tick(&summary, &sim);
        assert_eq!(callback.bubbles.len(), 2);
        assert_eq!(callback.reports, 0);
    }

    #[test]
    fn reports_on_its_cadence() {
        let mut sim = Simulation::from_config(&SimulationConfig::default()).unwrap();
        let mut callback = ConsoleCallback::new(3);
        for _ in 0..9 {
            let summary = sim.run_tick(1.0 / 60.0);
            callback.on_tick(&summary, &sim);
        }
        assert_eq!(callback.reports, 3);
    }

    #[test]
    fn zero_cadence_reports_every_tick() {
        assert_eq!(ConsoleCallback::new(0).report_every, 1);
    }
}
