//! One-shot and recurring task scheduling against game time.
//!
//! One-shot tasks are keyed by a monotonically assigned [`TaskId`] in an
//! ordered map, so tasks that come due on the same tick run in the order
//! they were scheduled. Recurring tasks are keyed by name and kept in
//! registration order; registering a name twice keeps the first task.
//!
//! Every action runs under [`fault::isolate`]. A failed one-shot task is
//! still consumed, and a failed recurring task still counts as fired.
//!
//! Actions cannot touch the tables while a pass is running. Scheduling
//! requests made through [`TaskContext`] are queued and applied, in request
//! order, once the pass finishes; a task scheduled that way never runs in the
//! pass that created it.

use std::collections::BTreeMap;

use officesim_types::TaskId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::events::SimEvent;
use crate::fault::{self, TaskFault};

/// Action run once when a one-shot task comes due.
pub type OnceAction = Box<dyn FnOnce(&mut TaskContext) -> Result<(), TaskFault>>;

/// Action run every time a recurring task comes due.
pub type RecurringAction = Box<dyn FnMut(&mut TaskContext) -> Result<(), TaskFault>>;

/// Errors from invalid scheduling requests.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulingError {
    /// Delay was negative or not a number.
    #[error("delay must be a finite, non-negative number of seconds, got {delay}")]
    InvalidDelay {
        /// The rejected delay.
        delay: f64,
    },

    /// Interval was zero, negative, or not a number.
    #[error("interval must be a finite, positive number of seconds, got {interval}")]
    InvalidInterval {
        /// The rejected interval.
        interval: f64,
    },

    /// Recurring task name was empty.
    #[error("recurring task name must not be empty")]
    EmptyName,
}

/// A recurring task whose idle time exceeds twice its interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaggingTask {
    /// Task name.
    pub name: String,
    /// Configured interval in game seconds.
    pub interval: f64,
    /// Game seconds since it last fired.
    pub idle: f64,
}

/// A scheduling request made from inside an action.
enum TaskCommand {
    Once {
        id: TaskId,
        delay: f64,
        label: String,
        action: OnceAction,
    },
    Cancel(TaskId),
    Recurring {
        name: String,
        interval: f64,
        label: String,
        action: RecurringAction,
    },
    RemoveRecurring(String),
}

impl std::fmt::Debug for TaskCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Once { id, delay, label, .. } => f
                .debug_struct("Once")
                .field("id", id)
                .field("delay", delay)
                .field("label", label)
                .finish_non_exhaustive(),
            Self::Cancel(id) => f.debug_tuple("Cancel").field(id).finish(),
            Self::Recurring {
                name,
                interval,
                label,
                ..
            } => f
                .debug_struct("Recurring")
                .field("name", name)
                .field("interval", interval)
                .field("label", label)
                .finish_non_exhaustive(),
            Self::RemoveRecurring(name) => f.debug_tuple("RemoveRecurring").field(name).finish(),
        }
    }
}

/// What an action can see and do while it runs.
#[derive(Debug, Default)]
pub struct TaskContext {
    game_time: f64,
    delta: f64,
    pending_once: usize,
    recurring: usize,
    lagging: Vec<LaggingTask>,
    outbox: Vec<SimEvent>,
    next_id: u64,
    commands: Vec<TaskCommand>,
}

impl TaskContext {
    /// Game time of the scheduling pass.
    pub const fn game_time(&self) -> f64 {
        self.game_time
    }

    /// Game delta of the tick that triggered the pass.
    pub const fn delta(&self) -> f64 {
        self.delta
    }

    /// One-shot tasks still waiting, not counting the one running.
    pub const fn pending_once(&self) -> usize {
        self.pending_once
    }

    /// Registered recurring tasks.
    pub const fn recurring_count(&self) -> usize {
        self.recurring
    }

    /// Recurring tasks that looked stalled at the start of the pass.
    pub fn lagging(&self) -> &[LaggingTask] {
        &self.lagging
    }

    /// Queue an event. Queued events are published once the pass finishes.
    pub fn publish(&mut self, event: SimEvent) {
        self.outbox.push(event);
    }

    /// Request a one-shot task due `delay` seconds after this pass's game
    /// time. The handle is valid at once and can be passed to
    /// [`TaskContext::cancel`] or [`Scheduler::cancel`].
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
        F: FnOnce(&mut Self) -> Result<(), TaskFault> + 'static,
    {
        if !delay.is_finite() || delay < 0.0 {
            return Err(SchedulingError::InvalidDelay { delay });
        }
        self.next_id = self.next_id.saturating_add(1);
        let id = TaskId(self.next_id);
        self.commands.push(TaskCommand::Once {
            id,
            delay,
            label: label.to_owned(),
            action: Box::new(action),
        });
        Ok(id)
    }

    /// Request that a pending one-shot task be dropped. A task that already
    /// ran in this pass is unaffected.
    pub fn cancel(&mut self, id: TaskId) {
        self.commands.push(TaskCommand::Cancel(id));
    }

    /// Request a recurring task, first due one interval after this pass.
    /// A name that is registered by the time the request is applied is
    /// left alone.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::EmptyName`] or
    /// [`SchedulingError::InvalidInterval`] for bad parameters.
    pub fn schedule_recurring<F>(
        &mut self,
        name: &str,
        interval: f64,
        label: &str,
        action: F,
    ) -> Result<(), SchedulingError>
    where
        F: FnMut(&mut Self) -> Result<(), TaskFault> + 'static,
    {
        validate_recurring(name, interval)?;
        self.commands.push(TaskCommand::Recurring {
            name: name.to_owned(),
            interval,
            label: label.to_owned(),
            action: Box::new(action),
        });
        Ok(())
    }

    /// Request that a recurring task be unregistered, including the one
    /// currently running.
    pub fn remove_recurring(&mut self, name: &str) {
        self.commands.push(TaskCommand::RemoveRecurring(name.to_owned()));
    }
}

fn validate_recurring(name: &str, interval: f64) -> Result<(), SchedulingError> {
    if name.is_empty() {
        return Err(SchedulingError::EmptyName);
    }
    if !interval.is_finite() || interval <= 0.0 {
        return Err(SchedulingError::InvalidInterval { interval });
    }
    Ok(())
}

/// Execution record of a recurring task, as persisted in save files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringTaskStats {
    /// Task name.
    pub name: String,
    /// Times the task has fired.
    pub execution_count: u64,
    /// Game time of the last firing.
    pub last_fired_at: f64,
}

/// Diagnostic view of a pending one-shot task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingTaskInfo {
    /// Task handle.
    pub id: TaskId,
    /// Label given at scheduling time.
    pub label: String,
    /// Game seconds until it is due (zero when already due).
    pub remaining: f64,
}

/// Diagnostic view of a recurring task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringTaskInfo {
    /// Task name.
    pub name: String,
    /// Label given at registration.
    pub label: String,
    /// Interval in game seconds.
    pub interval: f64,
    /// Game seconds since the last firing.
    pub since_last: f64,
    /// Times the task has fired.
    pub execution_count: u64,
}

/// Result of one [`Scheduler::run_due`] pass.
#[derive(Debug, Default)]
pub struct SchedulerPass {
    /// One-shot tasks executed (successful or not).
    pub once_run: usize,
    /// Recurring tasks executed (successful or not).
    pub recurring_run: usize,
    /// Actions that failed or panicked.
    pub faults: usize,
    /// Events queued by actions, in the order they were queued.
    pub outbox: Vec<SimEvent>,
}

struct OneShotTask {
    label: String,
    due: f64,
    action: OnceAction,
}

struct RecurringTask {
    name: String,
    label: String,
    interval: f64,
    last_fired_at: f64,
    execution_count: u64,
    action: RecurringAction,
}

/// The task tables.
#[derive(Default)]
pub struct Scheduler {
    once: BTreeMap<TaskId, OneShotTask>,
    recurring: Vec<RecurringTask>,
    next_id: u64,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("once", &self.once.len())
            .field(
                "recurring",
                &self.recurring.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            )
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl Scheduler {
    /// Empty tables.
    pub const fn new() -> Self {
        Self {
            once: BTreeMap::new(),
            recurring: Vec::new(),
            next_id: 0,
        }
    }

    // -----------------------------------------------------------------------
    // One-shot tasks
    // -----------------------------------------------------------------------

    /// Schedule `action` to run once when game time reaches `now + delay`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::InvalidDelay`] for a negative or
    /// non-finite delay.
    pub fn schedule_once(
        &mut self,
        now: f64,
        delay: f64,
        label: &str,
        action: OnceAction,
    ) -> Result<TaskId, SchedulingError> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(SchedulingError::InvalidDelay { delay });
        }
        self.next_id = self.next_id.saturating_add(1);
        let id = TaskId(self.next_id);
        self.insert_once(id, now + delay, label, action);
        Ok(id)
    }

    fn insert_once(&mut self, id: TaskId, due: f64, label: &str, action: OnceAction) {
        debug!(task = %id, label, due, "one-shot task scheduled");
        self.once.insert(
            id,
            OneShotTask {
                label: label.to_owned(),
                due,
                action,
            },
        );
    }

    /// Drop a pending one-shot task. Returns `false` if it already ran or
    /// never existed.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let removed = self.once.remove(&id);
        if let Some(task) = &removed {
            debug!(task = %id, label = task.label.as_str(), "one-shot task cancelled");
        }
        removed.is_some()
    }

    /// Pending one-shot tasks.
    pub fn pending_count(&self) -> usize {
        self.once.len()
    }

    /// Whether `id` is still pending.
    pub fn is_pending(&self, id: TaskId) -> bool {
        self.once.contains_key(&id)
    }

    // -----------------------------------------------------------------------
    // Recurring tasks
    // -----------------------------------------------------------------------

    /// Register a recurring task. Its first firing is one interval after
    /// `now`.
    ///
    /// Returns `Ok(false)` without touching anything when `name` is already
    /// registered.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulingError::EmptyName`] or
    /// [`SchedulingError::InvalidInterval`] for bad parameters.
    pub fn schedule_recurring(
        &mut self,
        now: f64,
        name: &str,
        interval: f64,
        label: &str,
        action: RecurringAction,
    ) -> Result<bool, SchedulingError> {
        validate_recurring(name, interval)?;
        if self.has_recurring(name) {
            debug!(name, "recurring task already registered");
            return Ok(false);
        }
        debug!(name, label, interval, "recurring task registered");
        self.recurring.push(RecurringTask {
            name: name.to_owned(),
            label: label.to_owned(),
            interval,
            last_fired_at: now,
            execution_count: 0,
            action,
        });
        Ok(true)
    }

    /// Unregister a recurring task. Returns `false` if it was not registered.
    pub fn remove_recurring(&mut self, name: &str) -> bool {
        let before = self.recurring.len();
        self.recurring.retain(|t| t.name != name);
        let removed = self.recurring.len() != before;
        if removed {
            debug!(name, "recurring task removed");
        }
        removed
    }

    /// Whether a recurring task is registered under `name`.
    pub fn has_recurring(&self, name: &str) -> bool {
        self.recurring.iter().any(|t| t.name == name)
    }

    /// Registered recurring tasks.
    pub fn recurring_count(&self) -> usize {
        self.recurring.len()
    }

    // -----------------------------------------------------------------------
    // Execution
    // -----------------------------------------------------------------------

    /// Run every due one-shot task, then every due recurring task.
    ///
    /// One-shot tasks are removed before they run. Recurring tasks record
    /// the firing before they run.
    pub fn run_due(&mut self, now: f64, delta: f64) -> SchedulerPass {
        let mut pass = SchedulerPass::default();
        let mut ctx = TaskContext {
            game_time: now,
            delta,
            pending_once: self.once.len(),
            recurring: self.recurring.len(),
            lagging: Vec::new(),
            outbox: Vec::new(),
            next_id: self.next_id,
            commands: Vec::new(),
        };

        let due: Vec<TaskId> = self
            .once
            .iter()
            .filter(|(_, task)| now >= task.due)
            .map(|(id, _)| *id)
            .collect();
        for id in due {
            let Some(task) = self.once.remove(&id) else {
                continue;
            };
            ctx.pending_once = self.once.len();
            pass.once_run = pass.once_run.saturating_add(1);
            let action = task.action;
            if let Err(fault) = fault::isolate(|| action(&mut ctx)) {
                pass.faults = pass.faults.saturating_add(1);
                warn!(task = %id, label = task.label.as_str(), error = %fault, "one-shot task fault");
            }
        }

        ctx.pending_once = self.once.len();
        ctx.lagging = self.lagging(now);
        for task in &mut self.recurring {
            if now - task.last_fired_at < task.interval {
                continue;
            }
            task.last_fired_at = now;
            task.execution_count = task.execution_count.saturating_add(1);
            pass.recurring_run = pass.recurring_run.saturating_add(1);
            if let Err(fault) = fault::isolate(|| (task.action)(&mut ctx)) {
                pass.faults = pass.faults.saturating_add(1);
                warn!(
                    name = task.name.as_str(),
                    label = task.label.as_str(),
                    error = %fault,
                    "recurring task fault"
                );
            }
        }

        self.next_id = self.next_id.max(ctx.next_id);
        self.apply(now, ctx.commands);
        pass.outbox = ctx.outbox;
        pass
    }

    fn apply(&mut self, now: f64, commands: Vec<TaskCommand>) {
        for command in commands {
            match command {
                TaskCommand::Once {
                    id,
                    delay,
                    label,
                    action,
                } => self.insert_once(id, now + delay, &label, action),
                TaskCommand::Cancel(id) => {
                    self.cancel(id);
                }
                TaskCommand::Recurring {
                    name,
                    interval,
                    label,
                    action,
                } => {
                    if let Err(e) = self.schedule_recurring(now, &name, interval, &label, action) {
                        warn!(name = name.as_str(), error = %e, "deferred recurring task rejected");
                    }
                }
                TaskCommand::RemoveRecurring(name) => {
                    self.remove_recurring(&name);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Stats and diagnostics
    // -----------------------------------------------------------------------

    /// Execution records for every recurring task, in registration order.
    pub fn stats(&self) -> Vec<RecurringTaskStats> {
        self.recurring
            .iter()
            .map(|t| RecurringTaskStats {
                name: t.name.clone(),
                execution_count: t.execution_count,
                last_fired_at: t.last_fired_at,
            })
            .collect()
    }

    /// Apply saved execution records to tasks that are registered.
    /// Records for unknown names are skipped. Returns how many applied.
    pub fn restore_stats(&mut self, stats: &[RecurringTaskStats]) -> usize {
        let mut applied = 0_usize;
        for saved in stats {
            let Some(task) = self.recurring.iter_mut().find(|t| t.name == saved.name) else {
                debug!(name = saved.name.as_str(), "no recurring task for saved stats");
                continue;
            };
            task.execution_count = saved.execution_count;
            if saved.last_fired_at.is_finite() {
                task.last_fired_at = saved.last_fired_at;
            }
            applied = applied.saturating_add(1);
        }
        applied
    }

    /// Pending one-shot tasks with the time left until each is due.
    pub fn pending(&self, now: f64) -> Vec<PendingTaskInfo> {
        self.once
            .iter()
            .map(|(id, t)| PendingTaskInfo {
                id: *id,
                label: t.label.clone(),
                remaining: (t.due - now).max(0.0),
            })
            .collect()
    }

    /// Recurring tasks with the time since each last fired.
    pub fn recurring(&self, now: f64) -> Vec<RecurringTaskInfo> {
        self.recurring
            .iter()
            .map(|t| RecurringTaskInfo {
                name: t.name.clone(),
                label: t.label.clone(),
                interval: t.interval,
                since_last: now - t.last_fired_at,
                execution_count: t.execution_count,
            })
            .collect()
    }

    /// Recurring tasks idle for more than twice their interval.
    pub fn lagging(&self, now: f64) -> Vec<LaggingTask> {
        self.recurring
            .iter()
            .filter(|t| now - t.last_fired_at > t.interval * 2.0)
            .map(|t| LaggingTask {
                name: t.name.clone(),
                interval: t.interval,
                idle: now - t.last_fired_at,
            })
            .collect()
    }

    /// Drop pending one-shot tasks and restart every recurring task at
    /// `now` with a zero count.
    pub fn reset(&mut self, now: f64) {
        self.once.clear();
        for task in &mut self.recurring {
            task.last_fired_at = now;
            task.execution_count = 0;
        }
    }

    /// Drop every task.
    pub fn clear(&mut self) {
        self.once.clear();
        self.recurring.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::float_cmp)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, tag: &str) -> OnceAction {
        let log = Rc::clone(log);
        let tag = tag.to_owned();
        Box::new(move |_| {
            log.borrow_mut().push(tag);
            Ok(())
        })
    }

    #[test]
    fn same_tick_tasks_run_in_schedule_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        sched.schedule_once(0.0, 2.0, "c", recorder(&log, "c")).unwrap();
        sched.schedule_once(0.0, 1.0, "a", recorder(&log, "a")).unwrap();
        sched.schedule_once(0.0, 1.5, "b", recorder(&log, "b")).unwrap();

        let pass = sched.run_due(3.0, 3.0);
        assert_eq!(pass.once_run, 3);
        assert_eq!(*log.borrow(), vec!["c", "a", "b"]);
        assert_eq!(sched.pending_count(), 0);
    }

    #[test]
    fn once_fires_exactly_at_due_time() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        let id = sched.schedule_once(10.0, 5.0, "x", recorder(&log, "x")).unwrap();

        sched.run_due(14.9, 4.9);
        assert!(log.borrow().is_empty());
        assert!(sched.is_pending(id));

        sched.run_due(15.0, 0.1);
        assert_eq!(log.borrow().len(), 1);
        assert!(!sched.is_pending(id));

        sched.run_due(16.0, 1.0);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn invalid_delays_are_rejected() {
        let mut sched = Scheduler::new();
        let bad = sched.schedule_once(0.0, -1.0, "neg", Box::new(|_| Ok(())));
        assert_eq!(bad, Err(SchedulingError::InvalidDelay { delay: -1.0 }));
        assert!(sched.schedule_once(0.0, f64::NAN, "nan", Box::new(|_| Ok(()))).is_err());
        assert!(sched.schedule_once(0.0, 0.0, "now", Box::new(|_| Ok(()))).is_ok());
    }

    #[test]
    fn cancel_prevents_execution() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        let id = sched.schedule_once(0.0, 1.0, "x", recorder(&log, "x")).unwrap();
        assert!(sched.cancel(id));
        assert!(!sched.cancel(id));
        sched.run_due(5.0, 5.0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn failing_once_task_is_consumed() {
        let mut sched = Scheduler::new();
        sched
            .schedule_once(0.0, 0.0, "bad", Box::new(|_| Err(TaskFault::new("boom"))))
            .unwrap();
        sched
            .schedule_once(0.0, 0.0, "worse", Box::new(|_| panic!("task bug")))
            .unwrap();
        let pass = sched.run_due(0.0, 0.0);
        assert_eq!(pass.faults, 2);
        assert_eq!(sched.pending_count(), 0);
        assert_eq!(sched.run_due(1.0, 1.0).once_run, 0);
    }

    #[test]
    fn recurring_registration_is_idempotent() {
        let mut sched = Scheduler::new();
        assert_eq!(sched.schedule_recurring(0.0, "x", 5.0, "x", Box::new(|_| Ok(()))), Ok(true));
        assert_eq!(sched.schedule_recurring(0.0, "x", 1.0, "x", Box::new(|_| Ok(()))), Ok(false));
        assert_eq!(sched.recurring_count(), 1);
        assert_eq!(sched.recurring(0.0)[0].interval, 5.0);
    }

    #[test]
    fn recurring_parameters_are_validated() {
        let mut sched = Scheduler::new();
        assert_eq!(
            sched.schedule_recurring(0.0, "", 5.0, "", Box::new(|_| Ok(()))),
            Err(SchedulingError::EmptyName)
        );
        assert_eq!(
            sched.schedule_recurring(0.0, "zero", 0.0, "", Box::new(|_| Ok(()))),
            Err(SchedulingError::InvalidInterval { interval: 0.0 })
        );
    }

    #[test]
    fn recurring_fires_each_interval_and_counts_failures() {
        let mut sched = Scheduler::new();
        sched
            .schedule_recurring(0.0, "flaky", 5.0, "flaky", Box::new(|_| Err(TaskFault::new("always"))))
            .unwrap();

        assert_eq!(sched.run_due(4.9, 4.9).recurring_run, 0);
        let pass = sched.run_due(5.0, 0.1);
        assert_eq!(pass.recurring_run, 1);
        assert_eq!(pass.faults, 1);
        assert_eq!(sched.stats()[0].last_fired_at, 5.0);
        assert_eq!(sched.run_due(9.9, 4.9).recurring_run, 0);
        assert_eq!(sched.run_due(10.0, 0.1).recurring_run, 1);

        let stats = sched.stats();
        assert_eq!(stats[0].execution_count, 2);
        assert_eq!(stats[0].last_fired_at, 10.0);
    }

    #[test]
    fn removed_recurring_task_stops() {
        let mut sched = Scheduler::new();
        sched.schedule_recurring(0.0, "x", 1.0, "x", Box::new(|_| Ok(()))).unwrap();
        assert!(sched.remove_recurring("x"));
        assert!(!sched.remove_recurring("x"));
        assert_eq!(sched.run_due(5.0, 5.0).recurring_run, 0);
    }

    #[test]
    fn actions_can_queue_events() {
        let mut sched = Scheduler::new();
        sched
            .schedule_recurring(
                0.0,
                "reminder",
                1.0,
                "reminder",
                Box::new(|ctx| {
                    ctx.publish(SimEvent::AutosaveReminder {
                        game_time: ctx.game_time(),
                    });
                    Ok(())
                }),
            )
            .unwrap();
        let pass = sched.run_due(1.0, 1.0);
        assert_eq!(pass.outbox, vec![SimEvent::AutosaveReminder { game_time: 1.0 }]);
    }

    #[test]
    fn actions_can_schedule_follow_up_tasks() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        let follow_up = recorder(&log, "follow-up");
        sched
            .schedule_once(
                0.0,
                1.0,
                "first",
                Box::new(move |ctx| {
                    ctx.schedule_once(2.0, "follow-up", follow_up)
                        .map_err(|e| TaskFault::new(e.to_string()))?;
                    Ok(())
                }),
            )
            .unwrap();

        let pass = sched.run_due(1.0, 1.0);
        assert_eq!(pass.once_run, 1);
        assert_eq!(sched.pending_count(), 1);
        assert!(log.borrow().is_empty());

        sched.run_due(2.9, 1.9);
        assert!(log.borrow().is_empty());
        sched.run_due(3.0, 0.1);
        assert_eq!(*log.borrow(), vec!["follow-up"]);
    }

    #[test]
    fn handles_from_actions_do_not_collide() {
        let mut sched = Scheduler::new();
        let inner = Rc::new(RefCell::new(None));
        let seen = Rc::clone(&inner);
        sched
            .schedule_once(
                0.0,
                0.0,
                "spawner",
                Box::new(move |ctx| {
                    let id = ctx.schedule_once(5.0, "child", |_| Ok(())).unwrap();
                    *seen.borrow_mut() = Some(id);
                    Ok(())
                }),
            )
            .unwrap();
        sched.run_due(0.0, 0.0);
        let child = inner.borrow().unwrap();
        assert!(sched.is_pending(child));

        let next = sched.schedule_once(0.0, 5.0, "sibling", Box::new(|_| Ok(()))).unwrap();
        assert_ne!(next, child);
        assert_eq!(sched.pending_count(), 2);
    }

    #[test]
    fn actions_can_cancel_and_unregister() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut sched = Scheduler::new();
        let doomed = sched.schedule_once(0.0, 10.0, "doomed", recorder(&log, "doomed")).unwrap();
        sched
            .schedule_recurring(
                0.0,
                "one_and_done",
                1.0,
                "",
                Box::new(move |ctx| {
                    ctx.cancel(doomed);
                    ctx.remove_recurring("one_and_done");
                    ctx.schedule_recurring("successor", 2.0, "", |_| Ok(()))
                        .map_err(|e| TaskFault::new(e.to_string()))
                }),
            )
            .unwrap();

        let pass = sched.run_due(1.0, 1.0);
        assert_eq!(pass.recurring_run, 1);
        assert_eq!(pass.faults, 0);
        assert!(!sched.is_pending(doomed));
        assert!(!sched.has_recurring("one_and_done"));
        assert!(sched.has_recurring("successor"));
        assert_eq!(sched.run_due(2.9, 1.9).recurring_run, 0);
        assert_eq!(sched.run_due(3.0, 0.1).recurring_run, 1);

        sched.run_due(20.0, 17.0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn deferred_requests_are_validated_up_front() {
        let mut ctx = TaskContext::default();
        assert_eq!(
            ctx.schedule_once(-1.0, "neg", |_| Ok(())),
            Err(SchedulingError::InvalidDelay { delay: -1.0 })
        );
        assert_eq!(
            ctx.schedule_recurring("", 1.0, "", |_| Ok(())),
            Err(SchedulingError::EmptyName)
        );
        assert!(ctx.commands.is_empty());
    }

    #[test]
    fn restore_stats_skips_unknown_names() {
        let mut sched = Scheduler::new();
        sched.schedule_recurring(0.0, "known", 5.0, "", Box::new(|_| Ok(()))).unwrap();
        let applied = sched.restore_stats(&[
            RecurringTaskStats {
                name: String::from("known"),
                execution_count: 7,
                last_fired_at: 35.0,
            },
            RecurringTaskStats {
                name: String::from("gone"),
                execution_count: 3,
                last_fired_at: 1.0,
            },
        ]);
        assert_eq!(applied, 1);
        assert_eq!(sched.stats()[0].execution_count, 7);
        assert_eq!(sched.recurring_count(), 1);
    }

    #[test]
    fn lagging_detects_idle_tasks() {
        let mut sched = Scheduler::new();
        sched.schedule_recurring(0.0, "slow", 5.0, "", Box::new(|_| Ok(()))).unwrap();
        assert!(sched.lagging(10.0).is_empty());
        let lagging = sched.lagging(11.0);
        assert_eq!(lagging.len(), 1);
        assert_eq!(lagging[0].idle, 11.0);
    }

    #[test]
    fn serialized_stats_use_camel_case() {
        let stats = RecurringTaskStats {
            name: String::from("system_check"),
            execution_count: 2,
            last_fired_at: 10.0,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["executionCount"], serde_json::json!(2));
        assert_eq!(json["lastFiredAt"], serde_json::json!(10.0));
    }
}
