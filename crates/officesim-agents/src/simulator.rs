//! The agent simulator: population, desk assignment, and the per-agent
//! behaviour state machine.
//!
//! The simulator is the single writer of agent state and desk occupancy.
//! Agents are advanced one at a time in population order; each sees the
//! up-to-date positions and complaint state of every agent processed before
//! it in the same step.
//!
//! Time enters through [`AgentSimulator::update`], which turns game seconds
//! into whole behaviour steps at the configured frame rate. Timers are
//! counted in steps, so a higher time scale makes agents act faster.

use officesim_types::{AgentId, AgentStatus, AreaId, ComplaintCategory, DeskId, OfficeSnapshot};
use officesim_world::{Body, MotionPlanner, Mover, Obstacles, OfficeLayout, Point, StepOutcome, WorldError};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::agent::{Agent, AgentTimers, MoveGoal};
use crate::complaint::{ComplaintStats, ComplaintThrottler};
use crate::config::{BehaviorConfig, ComplaintConfig};
use crate::error::AgentError;
use crate::names::NamePool;

/// Behaviour steps per game second.
pub const DEFAULT_FRAME_RATE: f64 = 60.0;

/// Upper bound on steps run by a single [`AgentSimulator::update`] call.
pub const DEFAULT_MAX_STEPS_PER_UPDATE: u32 = 30;

/// Attempts made inside the desk zone when placing an agent without a desk.
const DESK_ZONE_ATTEMPTS: u32 = 100;

/// Attempts made across the open floor after the desk zone is exhausted.
const FLOOR_ATTEMPTS: u32 = 50;

/// Notable things that happened during a step, drained by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// An agent started showing a complaint.
    ComplaintRaised {
        /// The complaining agent.
        agent: AgentId,
        /// Its display name.
        name: String,
        /// What it complained about.
        category: ComplaintCategory,
    },
}

/// Owns the agent population and advances it.
#[derive(Debug)]
pub struct AgentSimulator {
    layout: OfficeLayout,
    agents: Vec<Agent>,
    bodies: Vec<Body>,
    planner: MotionPlanner,
    behavior: BehaviorConfig,
    throttler: ComplaintThrottler,
    names: NamePool,
    rng: StdRng,
    frame_rate: f64,
    max_steps_per_update: u32,
    step_debt: f64,
    steps: u64,
    events: Vec<AgentEvent>,
}

impl AgentSimulator {
    /// Create an empty office. `seed` makes every random draw reproducible.
    pub fn new(
        layout: OfficeLayout,
        behavior: BehaviorConfig,
        complaints: ComplaintConfig,
        seed: u64,
    ) -> Self {
        Self {
            layout,
            agents: Vec::new(),
            bodies: Vec::new(),
            planner: MotionPlanner::default(),
            behavior,
            throttler: ComplaintThrottler::new(complaints),
            names: NamePool::new(),
            rng: StdRng::seed_from_u64(seed),
            frame_rate: DEFAULT_FRAME_RATE,
            max_steps_per_update: DEFAULT_MAX_STEPS_PER_UPDATE,
            step_debt: 0.0,
            steps: 0,
            events: Vec::new(),
        }
    }

    /// Set how many behaviour steps one game second is worth, and the most
    /// steps one update may run. Non-positive or non-finite rates are ignored.
    #[must_use]
    pub fn with_frame_rate(mut self, frame_rate: f64, max_steps_per_update: u32) -> Self {
        if frame_rate.is_finite() && frame_rate > 0.0 {
            self.frame_rate = frame_rate;
        }
        self.max_steps_per_update = max_steps_per_update.max(1);
        self
    }

    /// Replace the motion planner parameters.
    #[must_use]
    pub fn with_planner(mut self, planner: MotionPlanner) -> Self {
        self.planner = planner;
        self
    }

    // -----------------------------------------------------------------------
    // Stepping
    // -----------------------------------------------------------------------

    /// Advance by `game_delta` seconds of game time.
    ///
    /// Whole steps are run; the fractional remainder carries over to the
    /// next call. Steps beyond the per-update cap are dropped rather than
    /// queued. Returns the number of steps run.
    pub fn update(&mut self, game_delta: f64) -> u32 {
        if !game_delta.is_finite() || game_delta <= 0.0 {
            return 0;
        }

        // Absorb rounding so that 60 deltas of 1/60 s give exactly 60 steps.
        self.step_debt = game_delta.mul_add(self.frame_rate, self.step_debt) + 1e-9;
        let whole = self.step_debt.floor();
        self.step_debt = (self.step_debt - whole - 1e-9).max(0.0);

        let cap = f64::from(self.max_steps_per_update);
        if whole > cap {
            debug!(requested = whole, cap, "dropping excess agent steps");
        }
        let steps = steps_from(whole.min(cap));

        for _ in 0..steps {
            self.step();
        }
        steps
    }

    /// Run exactly one behaviour step for every agent, in population order.
    pub fn step(&mut self) {
        let size = self.layout.agent_size();
        self.bodies = self.agents.iter().map(|a| a.body(size)).collect();

        for i in 0..self.agents.len() {
            let (before, rest) = self.agents.split_at_mut(i);
            let Some((agent, after)) = rest.split_first_mut() else {
                break;
            };

            let mut ctx = StepContext {
                layout: &mut self.layout,
                bodies: &self.bodies,
                others: [&*before, &*after],
                planner: self.planner,
                behavior: &self.behavior,
                throttler: &mut self.throttler,
                rng: &mut self.rng,
                events: &mut self.events,
            };
            ctx.advance(agent);

            if let Some(body) = self.bodies.get_mut(i) {
                *body = agent.body(size);
            }
        }

        self.steps = self.steps.saturating_add(1);
    }

    /// Take every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<AgentEvent> {
        std::mem::take(&mut self.events)
    }

    // -----------------------------------------------------------------------
    // Population
    // -----------------------------------------------------------------------

    /// Add a new agent.
    ///
    /// With probability `desk_preference` the agent is seated at a random
    /// free desk and starts working. Otherwise, or when every desk is taken,
    /// it is placed on a random safe floor spot and starts wandering.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::NoFreePlacement`] if no safe spot was found.
    pub fn spawn_agent(&mut self) -> Result<AgentId, AgentError> {
        let name = self.names.acquire(&mut self.rng);
        let speed = self.behavior.sample_speed(&mut self.rng);

        let wants_desk = self.rng.random::<f64>() < self.behavior.desk_preference;
        let free = if wants_desk { self.layout.free_desks() } else { Vec::new() };

        let (position, desk, status, timers) = if let Some(&desk_id) = free.choose(&mut self.rng) {
            let desk = self
                .layout
                .desk_mut(desk_id)
                .ok_or(WorldError::DeskNotFound(desk_id))?;
            desk.occupy()?;
            let timers = AgentTimers {
                work: self.behavior.work_ticks.sample(&mut self.rng),
                ..AgentTimers::default()
            };
            (desk.work_position, Some(desk_id), AgentStatus::Working, timers)
        } else if let Some(spot) = self.find_empty_position() {
            (spot, None, AgentStatus::Wandering, AgentTimers::default())
        } else {
            self.names.release(&name);
            return Err(AgentError::NoFreePlacement {
                attempts: DESK_ZONE_ATTEMPTS.saturating_add(FLOOR_ATTEMPTS),
            });
        };

        let agent = Agent {
            id: AgentId::new(),
            name,
            position,
            speed,
            status,
            path: std::collections::VecDeque::new(),
            goal: MoveGoal::Spot,
            desk,
            activity: None,
            timers,
            complaint: None,
            next_complaint_in: self.throttler.first_delay(&mut self.rng),
        };
        let id = agent.id;

        info!(agent_id = %id, name = %agent.name, desk = ?desk, "agent joined the office");
        self.bodies.push(agent.body(self.layout.agent_size()));
        self.agents.push(agent);
        Ok(id)
    }

    /// Remove the most recently added agent, freeing its desk and name.
    pub fn remove_last_agent(&mut self) -> Option<AgentId> {
        let mut agent = self.agents.pop()?;
        self.bodies.truncate(self.agents.len());
        release_desk(&mut self.layout, &mut agent);
        self.names.release(&agent.name);
        info!(agent_id = %agent.id, name = %agent.name, "agent left the office");
        Some(agent.id)
    }

    /// Remove everyone and spawn `count` fresh agents.
    ///
    /// Returns how many agents were actually placed; placement stops at the
    /// first agent that cannot find a spot.
    pub fn reset_population(&mut self, count: usize) -> usize {
        self.agents.clear();
        self.bodies.clear();
        self.layout.vacate_all();
        self.names.clear();
        self.events.clear();
        self.step_debt = 0.0;

        let mut placed = 0_usize;
        for _ in 0..count {
            match self.spawn_agent() {
                Ok(_) => placed = placed.saturating_add(1),
                Err(err) => {
                    warn!(error = %err, placed, requested = count, "population reset stopped early");
                    break;
                }
            }
        }
        placed
    }

    fn find_empty_position(&mut self) -> Option<Point> {
        let obstacles = Obstacles::new(&self.layout, &self.bodies);
        let max_x = self.layout.max_agent_x();
        let max_y = self.layout.max_agent_y();

        let zones = [
            (DESK_ZONE_ATTEMPTS, (260.0, 710.0), (90.0, 340.0)),
            (FLOOR_ATTEMPTS, (220.0, max_x), (0.0, max_y)),
        ];
        for (attempts, (x_lo, x_hi), (y_lo, y_hi)) in zones {
            for _ in 0..attempts {
                let p = Point::new(
                    sample_between(&mut self.rng, x_lo, x_hi),
                    sample_between(&mut self.rng, y_lo, y_hi),
                );
                if self.planner.is_position_safe(obstacles, p, Mover::NOBODY) {
                    return Some(p);
                }
            }
        }
        None
    }

    // -----------------------------------------------------------------------
    // Complaint relief
    // -----------------------------------------------------------------------

    /// Shrink one category's counter by `rate`. Returns the new count.
    pub fn reduce_complaint_stats(&mut self, category: ComplaintCategory, rate: f64) -> u64 {
        let remaining = self.throttler.stats_mut().reduce(category, rate);
        debug!(category = %category, rate, remaining, "complaint counter reduced");
        remaining
    }

    /// Multiply every pending complaint cooldown by `factor`.
    ///
    /// Agents whose cooldown is already zero are left alone. Cooldowns never
    /// drop below one step. Non-finite or negative factors are ignored.
    pub fn scale_complaint_cooldowns(&mut self, factor: f64) {
        if !factor.is_finite() || factor < 0.0 {
            return;
        }
        for agent in &mut self.agents {
            if agent.next_complaint_in > 0 {
                agent.next_complaint_in = ticks_from(f64::from(agent.next_complaint_in) * factor).max(1);
            }
        }
    }

    /// Raise every cooldown to at least `floor` steps.
    pub fn boost_morale(&mut self, floor: u32) {
        for agent in &mut self.agents {
            agent.next_complaint_in = agent.next_complaint_in.max(floor);
        }
    }

    /// Push every cooldown back by `extra` steps.
    ///
    /// Computed as `max(current, current + extra)`, which for the unsigned
    /// counters used here always equals `current + extra` (saturating).
    pub fn defer_complaints(&mut self, extra: u32) {
        for agent in &mut self.agents {
            let current = agent.next_complaint_in;
            agent.next_complaint_in = current.max(current.saturating_add(extra));
        }
    }

    /// Replace the complaint counters (save restore).
    pub fn restore_complaint_stats(&mut self, stats: ComplaintStats) {
        *self.throttler.stats_mut() = stats;
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Every agent, in population order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Look up one agent.
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// The office floor.
    pub const fn layout(&self) -> &OfficeLayout {
        &self.layout
    }

    /// Active behaviour configuration.
    pub const fn behavior(&self) -> &BehaviorConfig {
        &self.behavior
    }

    /// Complaint counters.
    pub const fn complaint_stats(&self) -> &ComplaintStats {
        self.throttler.stats()
    }

    /// The complaint throttle.
    pub const fn throttler(&self) -> &ComplaintThrottler {
        &self.throttler
    }

    /// Number of agents currently showing a complaint.
    pub fn complaining_count(&self) -> usize {
        self.agents.iter().filter(|a| a.complaint.is_some()).count()
    }

    /// Number of agents in `status`.
    pub fn count_in(&self, status: AgentStatus) -> usize {
        self.agents.iter().filter(|a| a.status == status).count()
    }

    /// Behaviour steps run since creation.
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Whether every desk is held by at most one agent, and flagged occupied
    /// exactly when one agent holds it.
    pub fn desk_invariant_holds(&self) -> bool {
        self.layout.desks().iter().all(|desk| {
            let holders = self
                .agents
                .iter()
                .filter(|a| a.desk == Some(desk.id))
                .count();
            holders <= 1 && desk.is_occupied() == (holders == 1)
        })
    }

    /// Read-only view of the floor for the renderer.
    pub fn snapshot(&self, game_time: f64) -> OfficeSnapshot {
        OfficeSnapshot {
            game_time,
            agents: self.agents.iter().map(Agent::snapshot).collect(),
            desks: self.layout.desk_snapshots(),
        }
    }
}

/// Everything one agent's step may touch. Built per agent so that the agent
/// being advanced is borrowed mutably while the rest are visible read-only.
struct StepContext<'a> {
    layout: &'a mut OfficeLayout,
    bodies: &'a [Body],
    others: [&'a [Agent]; 2],
    planner: MotionPlanner,
    behavior: &'a BehaviorConfig,
    throttler: &'a mut ComplaintThrottler,
    rng: &'a mut StdRng,
    events: &'a mut Vec<AgentEvent>,
}

impl StepContext<'_> {
    fn others(&self) -> impl Iterator<Item = &Agent> {
        self.others.iter().flat_map(|s| s.iter())
    }

    fn roll(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn advance(&mut self, agent: &mut Agent) {
        agent.timers.name = agent.timers.name.saturating_sub(1);
        self.update_complaint(agent);

        match agent.status {
            AgentStatus::Working => self.working(agent),
            AgentStatus::Moving => self.moving(agent),
            AgentStatus::Wandering => self.wandering(agent),
            AgentStatus::Activity => self.in_activity(agent),
            AgentStatus::Resting => self.resting(agent),
        }
    }

    fn update_complaint(&mut self, agent: &mut Agent) {
        let others_active = self.others().filter(|a| a.complaint.is_some()).count();
        let raised = self.throttler.advance(
            &mut agent.complaint,
            &mut agent.next_complaint_in,
            others_active,
            &mut *self.rng,
        );
        if let Some(category) = raised {
            info!(agent_id = %agent.id, name = %agent.name, category = %category, "complaint raised");
            self.events.push(AgentEvent::ComplaintRaised {
                agent: agent.id,
                name: agent.name.clone(),
                category,
            });
        }
    }

    fn working(&mut self, agent: &mut Agent) {
        if self.roll() < self.behavior.name_flash_chance {
            agent.timers.name = self.behavior.name_flash_ticks;
        }

        agent.timers.work = agent.timers.work.saturating_sub(1);
        if agent.timers.work > 0 {
            return;
        }

        let r = self.roll();
        if r < self.behavior.work_to_activity {
            self.start_activity(agent);
        } else if r < self.behavior.work_to_activity + self.behavior.work_to_wander {
            self.start_wandering(agent);
        } else {
            agent.timers.work = self.behavior.renew_work_ticks.sample(&mut *self.rng);
        }
    }

    fn moving(&mut self, agent: &mut Agent) {
        if agent.path.is_empty() {
            self.arrive(agent);
            return;
        }

        let obstacles = Obstacles::new(&*self.layout, self.bodies);
        let outcome = self.planner.step_towards(
            obstacles,
            agent.mover(),
            agent.position,
            &mut agent.path,
            agent.speed,
        );
        if let StepOutcome::Advanced(next) = outcome {
            agent.position = next;
        }
    }

    fn arrive(&mut self, agent: &mut Agent) {
        match agent.goal {
            MoveGoal::Activity(area) => {
                agent.status = AgentStatus::Activity;
                agent.activity = Some(area);
                agent.timers.activity = self.behavior.activity_ticks.sample(&mut *self.rng);
            }
            MoveGoal::Desk if agent.desk.is_some() => {
                agent.status = AgentStatus::Working;
                agent.timers.work = self.behavior.work_ticks.sample(&mut *self.rng);
            }
            MoveGoal::Desk | MoveGoal::Spot => {
                agent.status = AgentStatus::Resting;
                agent.timers.rest = self.behavior.rest_ticks.sample(&mut *self.rng);
            }
        }
    }

    fn wandering(&mut self, agent: &mut Agent) {
        if agent.timers.rest > 0 {
            agent.timers.rest = agent.timers.rest.saturating_sub(1);
            return;
        }

        let b = self.behavior;
        let r = self.roll();
        if r < b.wander_to_work {
            self.return_to_work(agent);
        } else if r < b.wander_to_work + b.wander_to_activity {
            self.start_activity(agent);
        } else if r < b.wander_to_work + b.wander_to_activity + b.wander_to_relocate {
            self.relocate(agent);
        } else {
            agent.timers.rest = b.wander_ticks.sample(&mut *self.rng);
        }
    }

    fn in_activity(&mut self, agent: &mut Agent) {
        agent.timers.activity = agent.timers.activity.saturating_sub(1);
        if agent.timers.activity > 0 {
            return;
        }

        agent.activity = None;
        if self.roll() < self.behavior.activity_to_work {
            self.return_to_work(agent);
        } else {
            agent.status = AgentStatus::Wandering;
            agent.timers.rest = self.behavior.rest_ticks.sample(&mut *self.rng);
        }
    }

    fn resting(&mut self, agent: &mut Agent) {
        agent.timers.rest = agent.timers.rest.saturating_sub(1);
        if agent.timers.rest > 0 {
            return;
        }

        let r = self.roll();
        if r < self.behavior.rest_to_work {
            self.return_to_work(agent);
        } else if r < self.behavior.rest_to_work + self.behavior.rest_to_activity {
            self.start_activity(agent);
        } else {
            self.relocate(agent);
        }
    }

    /// Head to an activity area nobody else is using.
    fn start_activity(&mut self, agent: &mut Agent) {
        let size = self.layout.agent_size();
        let free: Vec<(AreaId, Point)> = self
            .layout
            .areas()
            .iter()
            .filter(|area| !self.others().any(|o| o.is_doing_activity_at(area.id)))
            .map(|area| (area.id, area.visit_position(size)))
            .collect();

        let Some(&(area, target)) = free.choose(&mut *self.rng) else {
            agent.status = AgentStatus::Wandering;
            agent.activity = None;
            agent.timers.rest = self.behavior.no_area_retry_ticks;
            return;
        };

        agent.activity = Some(area);
        agent.timers.name = self.behavior.activity_name_ticks;
        self.move_to(agent, target, MoveGoal::Activity(area));
    }

    /// Give up the desk and idle on the spot.
    fn start_wandering(&mut self, agent: &mut Agent) {
        release_desk(self.layout, agent);
        agent.activity = None;
        agent.status = AgentStatus::Wandering;
        agent.timers.rest = self.behavior.wander_ticks.sample(&mut *self.rng);
    }

    /// Walk back to the held desk, or claim a random free one.
    fn return_to_work(&mut self, agent: &mut Agent) {
        agent.activity = None;

        if let Some(seat) = agent
            .desk
            .and_then(|d| self.layout.desk(d))
            .map(|d| d.work_position)
        {
            self.move_to(agent, seat, MoveGoal::Desk);
            return;
        }

        let free = self.layout.free_desks();
        let Some(&desk_id) = free.choose(&mut *self.rng) else {
            agent.status = AgentStatus::Wandering;
            agent.timers.rest = self.behavior.no_desk_retry_ticks;
            return;
        };

        match claim_desk(self.layout, agent, desk_id) {
            Ok(seat) => self.move_to(agent, seat, MoveGoal::Desk),
            Err(err) => {
                warn!(agent_id = %agent.id, error = %err, "desk claim failed");
                agent.status = AgentStatus::Wandering;
                agent.timers.rest = self.behavior.no_desk_retry_ticks;
            }
        }
    }

    /// Walk to a random point on the floor.
    fn relocate(&mut self, agent: &mut Agent) {
        let target = Point::new(
            sample_between(&mut *self.rng, 0.0, self.layout.max_agent_x()),
            sample_between(&mut *self.rng, 0.0, self.layout.max_agent_y()),
        );
        self.move_to(agent, target, MoveGoal::Spot);
    }

    fn move_to(&mut self, agent: &mut Agent, target: Point, goal: MoveGoal) {
        let obstacles = Obstacles::new(&*self.layout, self.bodies);
        agent.path = self.planner.find_path(
            obstacles,
            agent.position,
            target,
            agent.mover(),
            &mut *self.rng,
        );
        agent.status = AgentStatus::Moving;
        agent.goal = goal;
    }
}

/// Mark `desk_id` occupied and record it on the agent. Returns the seat.
fn claim_desk(layout: &mut OfficeLayout, agent: &mut Agent, desk_id: DeskId) -> Result<Point, AgentError> {
    let desk = layout
        .desk_mut(desk_id)
        .ok_or(WorldError::DeskNotFound(desk_id))?;
    desk.occupy()?;
    agent.desk = Some(desk_id);
    Ok(desk.work_position)
}

/// Clear the agent's desk reference and the desk's occupied flag together.
fn release_desk(layout: &mut OfficeLayout, agent: &mut Agent) {
    let Some(desk_id) = agent.desk.take() else {
        return;
    };
    match layout.desk_mut(desk_id) {
        Some(desk) => {
            if let Err(err) = desk.vacate() {
                warn!(agent_id = %agent.id, error = %err, "desk was already free");
            }
        }
        None => warn!(agent_id = %agent.id, desk = %desk_id, "released unknown desk"),
    }
}

fn sample_between<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn ticks_from(v: f64) -> u32 {
    v.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn steps_from(v: f64) -> u32 {
    v.max(0.0) as u32
}
