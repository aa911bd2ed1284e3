//! The time controller: clock, scheduler and event bus behind one API.
//!
//! [`TimeController::tick`] is the heartbeat of the simulation. Each call
//! advances the clock by the real delta times the time scale, runs due
//! one-shot tasks, runs due recurring tasks, publishes events those tasks
//! queued, and finally publishes minute and hour boundary events. A paused
//! controller ignores ticks entirely.
//!
//! # Persistence
//!
//! [`TimeController::serialize`] captures the clock and recurring task
//! execution records. [`TimeController::deserialize`] applies a
//! [`TimeSnapshotPatch`], keeping current values for absent fields. Task
//! closures and subscriptions are never persisted; collaborators
//! re-register them on integration.

use std::time::Instant;

use officesim_types::{SubscriptionId, TaskId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bus::{Delivery, EventBus, Listener};
use crate::clock::{self, SECONDS_PER_HOUR, SECONDS_PER_MINUTE, SimClock};
use crate::events::{SimEvent, Topic};
use crate::fault::{ListenerFault, TaskFault};
use crate::scheduler::{
    LaggingTask, PendingTaskInfo, RecurringTaskInfo, RecurringTaskStats, Scheduler, SchedulingError,
    TaskContext,
};

/// Factor used by [`TimeController::accelerate`] in the default controls.
pub const DEFAULT_ACCELERATION: f64 = 2.0;

/// Factor used by [`TimeController::decelerate`] in the default controls.
pub const DEFAULT_DECELERATION: f64 = 0.5;

/// Name of the built-in health check task.
pub const SYSTEM_CHECK_TASK: &str = "system_check";

/// Name of the built-in autosave reminder task.
pub const AUTOSAVE_REMINDER_TASK: &str = "autosave_reminder";

/// Pending one-shot tasks above which the health check warns.
pub const PENDING_TASK_WARNING: usize = 100;

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Persisted controller state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSnapshot {
    /// Game seconds elapsed.
    pub game_time: f64,
    /// Real seconds elapsed while running.
    pub real_time: f64,
    /// Time scale.
    pub time_scale: f64,
    /// Whether the clock was paused.
    pub paused: bool,
    /// Execution records for recurring tasks.
    pub recurring_task_stats: Vec<RecurringTaskStats>,
}

/// Partial controller state. Absent fields leave current values alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeSnapshotPatch {
    /// Game seconds elapsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_time: Option<f64>,
    /// Real seconds elapsed while running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_time: Option<f64>,
    /// Time scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_scale: Option<f64>,
    /// Whether the clock was paused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    /// Execution records for recurring tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurring_task_stats: Option<Vec<RecurringTaskStats>>,
}

impl From<TimeSnapshot> for TimeSnapshotPatch {
    fn from(s: TimeSnapshot) -> Self {
        Self {
            game_time: Some(s.game_time),
            real_time: Some(s.real_time),
            time_scale: Some(s.time_scale),
            paused: Some(s.paused),
            recurring_task_stats: Some(s.recurring_task_stats),
        }
    }
}

/// Point-in-time summary for status displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeStatus {
    /// Game seconds elapsed.
    pub game_time: f64,
    /// Real seconds elapsed while running.
    pub real_time: f64,
    /// Time scale.
    pub time_scale: f64,
    /// Whether the clock is paused.
    pub paused: bool,
    /// Pending one-shot tasks.
    pub pending_tasks: usize,
    /// Registered recurring tasks.
    pub recurring_tasks: usize,
    /// Ticks applied while running.
    pub frames: u64,
    /// Game time as a clock string.
    pub game_clock: String,
    /// Real time as a clock string.
    pub real_clock: String,
    /// Game time in words.
    pub play_time: String,
}

/// Detailed scheduler and bus state for debugging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeDiagnostics {
    /// Game seconds elapsed.
    pub game_time: f64,
    /// Pending one-shot tasks.
    pub pending: Vec<PendingTaskInfo>,
    /// Registered recurring tasks.
    pub recurring: Vec<RecurringTaskInfo>,
    /// Recurring tasks idle for more than twice their interval.
    pub lagging: Vec<LaggingTask>,
    /// `(topic, listener count)` pairs.
    pub topics: Vec<(String, usize)>,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Owns the virtual clock, the task tables and the event bus.
#[derive(Debug, Default)]
pub struct TimeController {
    clock: SimClock,
    scheduler: Scheduler,
    bus: EventBus,
    wall_reference: Option<Instant>,
    frames: u64,
}

impl TimeController {
    /// A running controller at game time zero.
    pub const fn new() -> Self {
        Self {
            clock: SimClock::new(),
            scheduler: Scheduler::new(),
            bus: EventBus::new(),
            wall_reference: None,
            frames: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Ticking
    // -----------------------------------------------------------------------

    /// Advance by `real_delta` wall-clock seconds and return the game delta.
    ///
    /// Returns `0.0` and does nothing while paused. A negative or NaN delta
    /// is treated as zero.
    pub fn tick(&mut self, real_delta: f64) -> f64 {
        if self.clock.is_paused() {
            return 0.0;
        }
        let real_delta = if real_delta.is_finite() && real_delta >= 0.0 {
            real_delta
        } else {
            warn!(real_delta, "ignoring invalid real delta");
            0.0
        };

        let previous = self.clock.game_time();
        let game_delta = self.clock.advance(real_delta);
        let now = self.clock.game_time();
        self.frames = self.frames.saturating_add(1);

        let pass = self.scheduler.run_due(now, game_delta);
        if pass.once_run > 0 || pass.recurring_run > 0 {
            debug!(
                game_time = now,
                once = pass.once_run,
                recurring = pass.recurring_run,
                faults = pass.faults,
                "scheduling pass"
            );
        }
        for event in &pass.outbox {
            self.bus.publish(event);
        }

        if let Some(minutes) = clock::boundary_crossed(previous, now, SECONDS_PER_MINUTE) {
            self.bus.publish(&SimEvent::MinutePassed {
                game_time: now,
                minutes,
            });
        }
        if let Some(hours) = clock::boundary_crossed(previous, now, SECONDS_PER_HOUR) {
            info!(hours, "game hour passed");
            self.bus.publish(&SimEvent::HourPassed {
                game_time: now,
                hours,
            });
        }
        game_delta
    }

    /// Advance by the wall-clock time since the previous call.
    ///
    /// The first call, and the first call after [`resume`](Self::resume)
    /// or a restore, applies zero elapsed time.
    pub fn tick_at(&mut self, now: Instant) -> f64 {
        let real_delta = self
            .wall_reference
            .replace(now)
            .map_or(0.0, |prev| now.saturating_duration_since(prev).as_secs_f64());
        self.tick(real_delta)
    }

    // -----------------------------------------------------------------------
    // Pause and scale
    // -----------------------------------------------------------------------

    /// Freeze the clock. No-op if already paused.
    pub fn pause(&mut self) {
        if self.clock.set_paused(true) {
            let game_time = self.clock.game_time();
            info!(game_time, "time paused");
            self.bus.publish(&SimEvent::TimePaused { game_time });
        }
    }

    /// Unfreeze the clock without catching up on the paused interval.
    /// No-op if already running.
    pub fn resume(&mut self) {
        if self.clock.set_paused(false) {
            self.wall_reference = None;
            let game_time = self.clock.game_time();
            info!(game_time, "time resumed");
            self.bus.publish(&SimEvent::TimeResumed { game_time });
        }
    }

    /// Flip between paused and running. Returns the new paused state.
    pub fn toggle_pause(&mut self) -> bool {
        if self.clock.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
        self.clock.is_paused()
    }

    /// Store `scale` clamped to the accepted range and return the stored
    /// value. Publishes a scale change only when the stored value changed.
    pub fn set_time_scale(&mut self, scale: f64) -> f64 {
        if scale.is_nan() {
            warn!("ignoring NaN time scale");
            return self.clock.time_scale();
        }
        if let Some((old_scale, new_scale)) = self.clock.set_time_scale(scale) {
            info!(old_scale, new_scale, "time scale changed");
            self.bus.publish(&SimEvent::TimeScaleChanged {
                old_scale,
                new_scale,
            });
        }
        self.clock.time_scale()
    }

    /// Multiply the scale by `factor`.
    pub fn accelerate(&mut self, factor: f64) -> f64 {
        self.set_time_scale(self.clock.time_scale() * factor)
    }

    /// Multiply the scale by `factor` (expected below one).
    pub fn decelerate(&mut self, factor: f64) -> f64 {
        self.set_time_scale(self.clock.time_scale() * factor)
    }

    /// Back to real-time speed.
    pub fn reset_time_scale(&mut self) -> f64 {
        self.set_time_scale(clock::DEFAULT_TIME_SCALE)
    }

    // -----------------------------------------------------------------------
    // Scheduling
    // -----------------------------------------------------------------------

    /// Run `action` once, `delay` game seconds from now.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::InvalidDelay`] for a negative or
    /// non-finite delay.
    pub fn schedule_once<F>(
        &mut self,
        delay: f64,
        label: &str,
        action: F,
    ) -> Result<TaskId, SchedulingError>
    where
        F: FnOnce(&mut TaskContext) -> Result<(), TaskFault> + 'static,
    {
        let now = self.clock.game_time();
        self.scheduler
            .schedule_once(now, delay, label, Box::new(action))
    }

    /// Cancel a pending one-shot task.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        self.scheduler.cancel(id)
    }

    /// Run `action` every `interval` game seconds under `name`.
    ///
    /// Returns `Ok(false)` if `name` is already registered; the existing
    /// task is kept.
    ///
    /// # Errors
    ///
    /// Returns a [`SchedulingError`] for an empty name or a non-positive
    /// interval.
    pub fn schedule_recurring<F>(
        &mut self,
        name: &str,
        interval: f64,
        label: &str,
        action: F,
    ) -> Result<bool, SchedulingError>
    where
        F: FnMut(&mut TaskContext) -> Result<(), TaskFault> + 'static,
    {
        let now = self.clock.game_time();
        self.scheduler
            .schedule_recurring(now, name, interval, label, Box::new(action))
    }

    /// Unregister a recurring task.
    pub fn remove_recurring(&mut self, name: &str) -> bool {
        self.scheduler.remove_recurring(name)
    }

    /// Whether a recurring task named `name` is registered.
    pub fn has_recurring(&self, name: &str) -> bool {
        self.scheduler.has_recurring(name)
    }

    /// Whether a one-shot task is still waiting.
    pub fn is_pending(&self, id: TaskId) -> bool {
        self.scheduler.is_pending(id)
    }

    /// Pending one-shot tasks.
    pub fn pending_count(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// Execution records for recurring tasks.
    pub fn recurring_stats(&self) -> Vec<RecurringTaskStats> {
        self.scheduler.stats()
    }

    /// Register the health check and autosave reminder tasks.
    ///
    /// # Errors
    ///
    /// Returns a [`SchedulingError`] if either interval is not positive.
    pub fn install_builtin_tasks(
        &mut self,
        system_check_interval: f64,
        autosave_interval: f64,
    ) -> Result<(), SchedulingError> {
        self.schedule_recurring(
            SYSTEM_CHECK_TASK,
            system_check_interval,
            "scheduler health check",
            |ctx| {
                if ctx.pending_once() > PENDING_TASK_WARNING {
                    warn!(pending = ctx.pending_once(), "too many pending one-shot tasks");
                }
                for task in ctx.lagging() {
                    warn!(
                        name = task.name.as_str(),
                        interval = task.interval,
                        idle = task.idle,
                        "recurring task is lagging"
                    );
                }
                Ok(())
            },
        )?;
        self.schedule_recurring(
            AUTOSAVE_REMINDER_TASK,
            autosave_interval,
            "autosave reminder",
            |ctx| {
                let game_time = ctx.game_time();
                ctx.publish(SimEvent::AutosaveReminder { game_time });
                Ok(())
            },
        )?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Subscribe `listener` to `topic`.
    pub fn subscribe<F>(&mut self, topic: Topic, label: &str, listener: F) -> SubscriptionId
    where
        F: FnMut(&SimEvent) -> Result<(), ListenerFault> + 'static,
    {
        let listener: Listener = Box::new(listener);
        self.bus.subscribe(topic, label, listener)
    }

    /// Remove a subscription.
    pub fn unsubscribe(&mut self, topic: &Topic, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(topic, id)
    }

    /// Deliver `event` to its subscribers now.
    pub fn publish(&mut self, event: &SimEvent) -> Delivery {
        self.bus.publish(event)
    }

    /// Listeners subscribed to `topic`.
    pub fn listener_count(&self, topic: &Topic) -> usize {
        self.bus.listener_count(topic)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Game seconds elapsed.
    pub const fn game_time(&self) -> f64 {
        self.clock.game_time()
    }

    /// Real seconds elapsed while running.
    pub const fn real_time(&self) -> f64 {
        self.clock.real_time()
    }

    /// Current time scale.
    pub const fn time_scale(&self) -> f64 {
        self.clock.time_scale()
    }

    /// Whether the clock is paused.
    pub const fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// Ticks applied while running.
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Summary for status displays.
    pub fn status(&self) -> TimeStatus {
        let game_time = self.clock.game_time();
        let real_time = self.clock.real_time();
        TimeStatus {
            game_time,
            real_time,
            time_scale: self.clock.time_scale(),
            paused: self.clock.is_paused(),
            pending_tasks: self.scheduler.pending_count(),
            recurring_tasks: self.scheduler.recurring_count(),
            frames: self.frames,
            game_clock: clock::format_clock(game_time),
            real_clock: clock::format_clock(real_time),
            play_time: clock::play_time_description(game_time),
        }
    }

    /// Task and subscription details.
    pub fn diagnostics(&self) -> TimeDiagnostics {
        let now = self.clock.game_time();
        TimeDiagnostics {
            game_time: now,
            pending: self.scheduler.pending(now),
            recurring: self.scheduler.recurring(now),
            lagging: self.scheduler.lagging(now),
            topics: self.bus.topic_counts(),
        }
    }

    // -----------------------------------------------------------------------
    // Persistence and lifecycle
    // -----------------------------------------------------------------------

    /// Capture the persistable state.
    pub fn serialize(&self) -> TimeSnapshot {
        TimeSnapshot {
            game_time: self.clock.game_time(),
            real_time: self.clock.real_time(),
            time_scale: self.clock.time_scale(),
            paused: self.clock.is_paused(),
            recurring_task_stats: self.scheduler.stats(),
        }
    }

    /// Apply saved state. Absent or invalid fields keep current values.
    /// Execution records apply only to recurring tasks already registered.
    /// No events are published.
    pub fn deserialize(&mut self, data: &TimeSnapshotPatch) {
        if let Some(game_time) = data.game_time {
            if !self.clock.restore_game_time(game_time) {
                warn!(game_time, "ignoring invalid saved game time");
            }
        }
        if let Some(real_time) = data.real_time {
            if !self.clock.restore_real_time(real_time) {
                warn!(real_time, "ignoring invalid saved real time");
            }
        }
        if let Some(scale) = data.time_scale {
            self.clock.set_time_scale(scale);
        }
        if let Some(paused) = data.paused {
            self.clock.set_paused(paused);
        }
        if let Some(stats) = &data.recurring_task_stats {
            let applied = self.scheduler.restore_stats(stats);
            debug!(applied, saved = stats.len(), "recurring task stats restored");
        }
        self.wall_reference = None;
        info!(
            game_time = self.clock.game_time(),
            time_scale = self.clock.time_scale(),
            paused = self.clock.is_paused(),
            "time state restored"
        );
    }

    /// Return the clock to zero and running at the default scale, drop
    /// pending one-shot tasks and restart recurring tasks. Subscriptions
    /// are kept.
    pub fn reset(&mut self) {
        self.clock.reset();
        self.scheduler.reset(0.0);
        self.wall_reference = None;
        self.frames = 0;
        info!("time controller reset");
    }

    /// Drop every task and subscription.
    pub fn clear(&mut self) {
        self.scheduler.clear();
        self.bus.clear();
        debug!("time controller cleared");
    }
}
