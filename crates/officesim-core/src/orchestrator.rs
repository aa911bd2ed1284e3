//! The per-tick update sequence.
//!
//! [`Simulation::run_tick`] is the only place that drives the core. Each
//! tick runs, in order:
//!
//! 1. [`TimeController::tick`]: clock, due one-shot tasks, due recurring
//!    tasks, queued events, minute and hour boundary events.
//! 2. [`AgentSimulator::update`] with the game delta, agents in population
//!    order.
//! 3. Publication of the complaints raised during the agent update.
//! 4. Every registered [`Subsystem`], in registration order.
//!
//! While the clock is paused, steps 2 to 4 are skipped.

use std::time::Instant;

use officesim_agents::{AgentEvent, AgentSimulator};
use officesim_types::OfficeSnapshot;
use officesim_world::{OfficeLayout, WorldError};
use serde::Serialize;
use tracing::{info, trace, warn};

use crate::config::SimulationConfig;
use crate::events::SimEvent;
use crate::fault;
use crate::persistence::SaveData;
use crate::scheduler::SchedulingError;
use crate::subsystem::{Subsystem, SubsystemContext};
use crate::time::TimeController;

/// Errors building a simulation from configuration.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// The configured floor is unusable.
    #[error("invalid office layout: {0}")]
    World(#[from] WorldError),

    /// A built-in task could not be registered.
    #[error("invalid time configuration: {0}")]
    Scheduling(#[from] SchedulingError),
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSummary {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Game time after the tick.
    pub game_time: f64,
    /// Real time after the tick.
    pub real_time: f64,
    /// Game seconds applied by this tick.
    pub game_delta: f64,
    /// Time scale during the tick.
    pub time_scale: f64,
    /// Whether the clock was paused (nothing moved).
    pub paused: bool,
    /// Agent behaviour steps run.
    pub agent_steps: u32,
    /// Complaints raised during the tick.
    pub complaints_raised: usize,
    /// Agents showing a complaint after the tick.
    pub complaining: usize,
    /// Agents on the floor.
    pub population: usize,
    /// Subsystem updates that failed or panicked.
    pub subsystem_faults: usize,
}

/// The simulation context: time, agents and collaborators.
pub struct Simulation {
    time: TimeController,
    agents: AgentSimulator,
    subsystems: Vec<Box<dyn Subsystem>>,
    ticks: u64,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("time", &self.time)
            .field("population", &self.agents.agents().len())
            .field("subsystems", &self.subsystem_names())
            .field("ticks", &self.ticks)
            .finish()
    }
}

impl Simulation {
    /// Wire an existing controller and population together.
    pub fn new(time: TimeController, agents: AgentSimulator) -> Self {
        Self {
            time,
            agents,
            subsystems: Vec::new(),
            ticks: 0,
        }
    }

    /// Build the standard office described by `config`: layout, initial
    /// population, initial time scale and built-in tasks.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if the floor dimensions are unusable or a
    /// built-in task interval is not positive.
    pub fn from_config(config: &SimulationConfig) -> Result<Self, SetupError> {
        let layout = OfficeLayout::standard(config.world.width, config.world.height)?;
        let mut agents = AgentSimulator::new(
            layout,
            config.behavior.clone(),
            config.complaints.clone(),
            config.world.seed,
        )
        .with_frame_rate(config.world.frame_rate, config.world.max_steps_per_update);
        let placed = agents.reset_population(config.population.initial_agents);

        let mut time = TimeController::new();
        time.set_time_scale(config.time.initial_scale);
        time.install_builtin_tasks(
            config.time.system_check_interval_secs,
            config.time.autosave_interval_secs,
        )?;

        info!(
            office = config.world.name.as_str(),
            seed = config.world.seed,
            agents = placed,
            desks = agents.layout().desks().len(),
            time_scale = time.time_scale(),
            "simulation built"
        );
        Ok(Self::new(time, agents))
    }

    /// Add a collaborator. It is updated after those registered before it.
    pub fn register(&mut self, subsystem: Box<dyn Subsystem>) {
        info!(subsystem = subsystem.name(), "subsystem registered");
        self.subsystems.push(subsystem);
    }

    /// Run one tick with an explicit real delta in seconds.
    pub fn run_tick(&mut self, real_delta: f64) -> TickSummary {
        let game_delta = self.time.tick(real_delta);
        self.finish_tick(game_delta)
    }

    /// Run one tick, measuring the real delta from the wall clock.
    pub fn run_tick_at(&mut self, now: Instant) -> TickSummary {
        let game_delta = self.time.tick_at(now);
        self.finish_tick(game_delta)
    }

    fn finish_tick(&mut self, game_delta: f64) -> TickSummary {
        self.ticks = self.ticks.saturating_add(1);
        let paused = self.time.is_paused();

        let mut agent_steps = 0;
        let mut complaints_raised = 0_usize;
        let mut subsystem_faults = 0_usize;

        if !paused {
            agent_steps = self.agents.update(game_delta);

            for event in self.agents.drain_events() {
                let AgentEvent::ComplaintRaised {
                    agent,
                    name,
                    category,
                } = event;
                complaints_raised = complaints_raised.saturating_add(1);
                self.time.publish(&SimEvent::ComplaintRaised {
                    agent,
                    name,
                    category,
                });
            }

            for subsystem in &mut self.subsystems {
                let mut ctx = SubsystemContext {
                    time: &mut self.time,
                    agents: &mut self.agents,
                };
                if let Err(fault) = fault::isolate(|| subsystem.update(&mut ctx, game_delta)) {
                    subsystem_faults = subsystem_faults.saturating_add(1);
                    warn!(subsystem = subsystem.name(), error = %fault, "subsystem fault");
                }
            }
        }

        let summary = TickSummary {
            tick: self.ticks,
            game_time: self.time.game_time(),
            real_time: self.time.real_time(),
            game_delta,
            time_scale: self.time.time_scale(),
            paused,
            agent_steps,
            complaints_raised,
            complaining: self.agents.complaining_count(),
            population: self.agents.agents().len(),
            subsystem_faults,
        };
        trace!(
            tick = summary.tick,
            game_time = summary.game_time,
            steps = summary.agent_steps,
            complaining = summary.complaining,
            "tick complete"
        );
        summary
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Capture a save of the current state.
    pub fn save_data(&self) -> SaveData {
        SaveData::capture(&self.time, &self.agents)
    }

    /// Apply a save. Register and integrate collaborators first so their
    /// recurring task records can be restored.
    pub fn restore(&mut self, data: &SaveData) {
        data.apply(&mut self.time, &mut self.agents);
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The time controller.
    pub const fn time(&self) -> &TimeController {
        &self.time
    }

    /// The time controller, mutably (pause, scale, scheduling).
    pub const fn time_mut(&mut self) -> &mut TimeController {
        &mut self.time
    }

    /// The agent population.
    pub const fn agents(&self) -> &AgentSimulator {
        &self.agents
    }

    /// The agent population, mutably (spawn, remove, relief operations).
    pub const fn agents_mut(&mut self) -> &mut AgentSimulator {
        &mut self.agents
    }

    /// Ticks run so far, paused ones included.
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Registered collaborator names, in update order.
    pub fn subsystem_names(&self) -> Vec<&str> {
        self.subsystems.iter().map(|s| s.name()).collect()
    }

    /// Read-only view for the renderer.
    pub fn snapshot(&self) -> OfficeSnapshot {
        self.agents.snapshot(self.time.game_time())
    }
}
