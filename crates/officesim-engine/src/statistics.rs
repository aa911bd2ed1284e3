//! Office statistics collaborator.
//!
//! Counts minute and hour boundaries and raised complaints from the event
//! bus, and samples the working population on a recurring task. The
//! numbers live behind a shared [`StatsHandle`] so the binary can still
//! read them after the collector has been handed to the simulation.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use officesim_core::{SimEvent, Subsystem, SubsystemContext, SubsystemError, Topic};
use officesim_types::AgentStatus;
use serde::Serialize;
use tracing::debug;

/// Recurring task name used for population samples.
pub const SAMPLE_TASK: &str = "statistics_sample";

/// Game seconds between population samples.
pub const DEFAULT_SAMPLE_INTERVAL_SECS: f64 = 60.0;

/// Samples kept before the oldest are dropped.
pub const MAX_SAMPLES: usize = 1_440;

/// One population sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSample {
    /// Game time of the sample.
    pub game_time: f64,
    /// Agents at their desks.
    pub working: usize,
    /// Agents on the floor.
    pub population: usize,
}

/// Everything the collector has counted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficeStats {
    /// Minute boundaries seen.
    pub minutes_passed: u64,
    /// Hour boundaries seen.
    pub hours_passed: u64,
    /// Complaints seen on the bus.
    pub complaints_raised: u64,
    /// Complaints seen, keyed by category.
    pub complaints_by_category: BTreeMap<String, u64>,
    /// Population samples, oldest first.
    pub samples: Vec<WorkSample>,
}

impl OfficeStats {
    /// Mean share of the population at work across all samples.
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_working_ratio(&self) -> Option<f64> {
        let ratios: Vec<f64> = self
            .samples
            .iter()
            .filter(|s| s.population > 0)
            .map(|s| s.working as f64 / s.population as f64)
            .collect();
        if ratios.is_empty() {
            None
        } else {
            Some(ratios.iter().sum::<f64>() / ratios.len() as f64)
        }
    }

    fn record(&mut self, event: &SimEvent) {
        match event {
            SimEvent::MinutePassed { .. } => {
                self.minutes_passed = self.minutes_passed.saturating_add(1);
            }
            SimEvent::HourPassed { .. } => {
                self.hours_passed = self.hours_passed.saturating_add(1);
            }
            SimEvent::ComplaintRaised { category, .. } => {
                self.complaints_raised = self.complaints_raised.saturating_add(1);
                let slot = self
                    .complaints_by_category
                    .entry(category.key().to_owned())
                    .or_insert(0);
                *slot = slot.saturating_add(1);
            }
            _ => {}
        }
    }

    fn push_sample(&mut self, sample: WorkSample) {
        self.samples.push(sample);
        if self.samples.len() > MAX_SAMPLES {
            let excess = self.samples.len().saturating_sub(MAX_SAMPLES);
            self.samples.drain(..excess);
        }
    }
}

/// Shared read access to the collected numbers.
pub type StatsHandle = Rc<RefCell<OfficeStats>>;

/// Collects [`OfficeStats`].
#[derive(Debug)]
pub struct StatisticsCollector {
    stats: StatsHandle,
    sample_due: Rc<Cell<bool>>,
    sample_interval: f64,
    integrated: bool,
}

impl StatisticsCollector {
    /// A collector sampling every `sample_interval` game seconds.
    pub fn new(sample_interval: f64) -> Self {
        Self {
            stats: Rc::new(RefCell::new(OfficeStats::default())),
            sample_due: Rc::new(Cell::new(false)),
            sample_interval,
            integrated: false,
        }
    }

    /// Handle to the collected numbers.
    pub fn handle(&self) -> StatsHandle {
        Rc::clone(&self.stats)
    }

    fn integrate(&mut self, ctx: &mut SubsystemContext<'_>) -> Result<(), SubsystemError> {
        for topic in [Topic::MinutePassed, Topic::HourPassed, Topic::ComplaintRaised] {
            let stats = Rc::clone(&self.stats);
            ctx.time.subscribe(topic, "statistics", move |event| {
                stats.borrow_mut().record(event);
                Ok(())
            });
        }
        let due = Rc::clone(&self.sample_due);
        ctx.time
            .schedule_recurring(SAMPLE_TASK, self.sample_interval, "statistics", move |_| {
                due.set(true);
                Ok(())
            })?;
        debug!(interval = self.sample_interval, "statistics collector integrated");
        Ok(())
    }
}

impl Default for StatisticsCollector {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_INTERVAL_SECS)
    }
}

impl Subsystem for StatisticsCollector {
    fn name(&self) -> &str {
        "statistics"
    }

    fn update(
        &mut self,
        ctx: &mut SubsystemContext<'_>,
        _game_delta: f64,
    ) -> Result<(), SubsystemError> {
        if !self.integrated {
            self.integrate(ctx)?;
            self.integrated = true;
        }
        if self.sample_due.replace(false) {
            let sample = WorkSample {
                game_time: ctx.time.game_time(),
                working: ctx.agents.count_in(AgentStatus::Working),
                population: ctx.agents.agents().len(),
            };
            self.stats.borrow_mut().push_sample(sample);
        }
        Ok(())
    }
}
