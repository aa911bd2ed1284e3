//! Frame loop with run controls.
//!
//! [`run_simulation`] drives [`Simulation::run_tick_at`] once per frame,
//! measuring real time from the wall clock, and layers the control plane on
//! top:
//!
//! - **Bounded runs**: stop after `max_ticks` or `max_real_time_seconds`
//! - **Pause/resume**: requests are forwarded to the time controller
//! - **Pacing**: frame interval adjustable at runtime
//! - **Clean stop**: [`RunControl::request_stop`] ends the loop before the
//!   next frame

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::control::{RunControl, SimulationEndReason};
use crate::orchestrator::{Simulation, TickSummary};

/// Result of a run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the run ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// Callback invoked after each tick.
pub trait TickCallback {
    /// Called after a tick completes.
    fn on_tick(&mut self, summary: &TickSummary, sim: &Simulation);
}

/// A callback that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _sim: &Simulation) {}
}

/// Run the frame loop until a bound is hit or a stop is requested.
///
/// The returned future borrows the simulation mutably and is not `Send`;
/// drive it on the current thread (`#[tokio::main]` or a `LocalSet`).
pub async fn run_simulation(
    sim: &mut Simulation,
    control: &Arc<RunControl>,
    callback: &mut dyn TickCallback,
) -> SimulationResult {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks = control.max_ticks(),
        max_real_time_seconds = control.max_real_time_seconds(),
        frame_interval_ms = control.frame_interval_ms(),
        "Simulation starting"
    );

    loop {
        // --- Apply pause requests ---
        sync_pause(sim, control);

        // --- Check stop request (before tick) ---
        if control.is_stop_requested() {
            info!("Stop requested");
            return finish(control, SimulationEndReason::OperatorStop, last_summary, total_ticks)
                .await;
        }

        // --- Check time limit (before tick) ---
        if control.time_limit_reached() {
            info!(
                max_seconds = control.max_real_time_seconds(),
                elapsed = control.elapsed_seconds(),
                "Real-time limit reached"
            );
            return finish(
                control,
                SimulationEndReason::MaxRealTimeReached,
                last_summary,
                total_ticks,
            )
            .await;
        }

        // --- Execute tick ---
        let summary = sim.run_tick_at(Instant::now());
        total_ticks = total_ticks.saturating_add(1);

        callback.on_tick(&summary, sim);

        // --- Check tick limit (after tick) ---
        if control.tick_limit_reached(total_ticks) {
            info!(
                tick = summary.tick,
                max_ticks = control.max_ticks(),
                "Tick limit reached"
            );
            return finish(
                control,
                SimulationEndReason::MaxTicksReached,
                Some(summary),
                total_ticks,
            )
            .await;
        }

        last_summary = Some(summary);

        // --- Wait for the next frame ---
        let interval_ms = control.frame_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
        } else {
            tokio::task::yield_now().await;
        }
    }
}

fn sync_pause(sim: &mut Simulation, control: &RunControl) {
    let wanted = control.is_paused();
    if wanted == sim.time().is_paused() {
        return;
    }
    if wanted {
        sim.time_mut().pause();
        info!("Simulation paused");
    } else {
        sim.time_mut().resume();
        info!("Simulation resumed");
    }
}

async fn finish(
    control: &RunControl,
    reason: SimulationEndReason,
    final_summary: Option<TickSummary>,
    total_ticks: u64,
) -> SimulationResult {
    control.set_end_reason(reason).await;
    SimulationResult {
        end_reason: reason,
        final_summary,
        total_ticks,
    }
}

/// Log how a run ended.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_game_time = result.final_summary.as_ref().map(|s| s.game_time),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            game_time = summary.game_time,
            population = summary.population,
            complaining = summary.complaining,
            "Final tick summary"
        );
    } else {
        warn!("Simulation ended with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{SimulationBoundsConfig, SimulationConfig};

    fn control(max_ticks: u64) -> Arc<RunControl> {
        Arc::new(RunControl::new(
            Duration::ZERO,
            &SimulationBoundsConfig {
                max_ticks,
                max_real_time_seconds: 0,
            },
        ))
    }

    fn sim() -> Simulation {
        Simulation::from_config(&SimulationConfig::default()).unwrap()
    }

    struct Counting {
        ticks: Vec<u64>,
    }

    impl TickCallback for Counting {
        fn on_tick(&mut self, summary: &TickSummary, _sim: &Simulation) {
            self.ticks.push(summary.tick);
        }
    }

    #[tokio::test]
    async fn stops_at_tick_limit() {
        let mut sim = sim();
        let control = control(5);
        let mut callback = Counting { ticks: Vec::new() };
        let result = run_simulation(&mut sim, &control, &mut callback).await;
        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(callback.ticks, vec![1, 2, 3, 4, 5]);
        assert_eq!(result.final_summary.unwrap().tick, 5);
        assert_eq!(
            control.end_reason().await,
            Some(SimulationEndReason::MaxTicksReached)
        );
    }

    #[tokio::test]
    async fn stop_before_first_tick() {
        let mut sim = sim();
        let control = control(0);
        control.request_stop();
        let result = run_simulation(&mut sim, &control, &mut NoOpCallback).await;
        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert_eq!(result.total_ticks, 0);
        assert!(result.final_summary.is_none());
        assert_eq!(sim.ticks(), 0);
    }

    #[tokio::test]
    async fn pause_request_freezes_the_clock() {
        let mut sim = sim();
        let control = control(3);
        control.pause();
        let result = run_simulation(&mut sim, &control, &mut NoOpCallback).await;
        assert!(sim.time().is_paused());
        let last = result.final_summary.unwrap();
        assert!(last.paused);
        assert_eq!(last.agent_steps, 0);
        assert!(sim.time().game_time().abs() < f64::EPSILON);
    }

    struct StopAfter {
        control: Arc<RunControl>,
        after: u64,
    }

    impl TickCallback for StopAfter {
        fn on_tick(&mut self, summary: &TickSummary, _sim: &Simulation) {
            if summary.tick >= self.after {
                self.control.request_stop();
            }
        }
    }

    #[tokio::test]
    async fn stop_requested_mid_run() {
        let mut sim = sim();
        let control = control(0);
        let mut callback = StopAfter {
            control: Arc::clone(&control),
            after: 2,
        };
        let result = run_simulation(&mut sim, &control, &mut callback).await;
        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert_eq!(result.total_ticks, 2);
        assert_eq!(result.final_summary.unwrap().tick, 2);
    }
}
