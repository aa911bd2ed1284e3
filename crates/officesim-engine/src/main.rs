//! Engine binary for the office simulation.
//!
//! Wires the core pipeline to its collaborators and runs the frame loop
//! until a bound is hit or Ctrl-C is pressed.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `officesim-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Build the office: layout, population, built-in tasks
//! 4. Register collaborators: statistics, relief programmes, autosave
//! 5. Let collaborators register their tasks, then apply the last save
//! 6. Run the frame loop with Ctrl-C wired to a clean stop
//! 7. Write the final save and log the result

mod autosave;
mod console_callback;
mod error;
mod relief;
mod statistics;

use std::path::Path;
use std::sync::Arc;

use officesim_core::clock::play_time_description;
use officesim_core::config::LoggingConfig;
use officesim_core::{
    JsonFileStore, RunControl, SaveStore, Simulation, SimulationConfig, log_simulation_end,
    run_simulation,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::autosave::Autosave;
use crate::console_callback::ConsoleCallback;
use crate::error::EngineError;
use crate::relief::ReliefProgramme;
use crate::statistics::StatisticsCollector;

/// Config file looked up in the working directory.
const CONFIG_PATH: &str = "officesim-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, setup, or the final save fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("officesim-engine starting");
    if !from_file {
        info!(path = CONFIG_PATH, "Config file not found, using defaults");
    }
    info!(
        office = config.world.name,
        seed = config.world.seed,
        width = config.world.width,
        height = config.world.height,
        frame_rate = config.world.frame_rate,
        agents = config.population.initial_agents,
        "Configuration loaded"
    );

    // 3. Build the office.
    let mut sim = Simulation::from_config(&config).map_err(EngineError::from)?;
    info!(
        population = sim.agents().agents().len(),
        desks = sim.agents().layout().desks().len(),
        "Office assembled"
    );

    // 4. Register collaborators.
    let statistics = StatisticsCollector::default();
    let stats = statistics.handle();
    sim.register(Box::new(statistics));
    for (offset, programme) in (1_u64..).zip(&config.relief) {
        sim.register(Box::new(ReliefProgramme::new(
            programme.clone(),
            config.world.seed.wrapping_add(offset),
        )));
    }
    let mut store = config
        .persistence
        .enabled
        .then(|| JsonFileStore::new(&config.persistence.save_path));
    if let Some(store) = &store {
        sim.register(Box::new(Autosave::new(Box::new(store.clone()))));
    }
    info!(collaborators = ?sim.subsystem_names(), "Collaborators registered");

    // 5. Integrate collaborators, then restore.
    sim.run_tick(0.0);
    if let Some(store) = &store {
        match store.load() {
            Ok(Some(data)) => {
                sim.restore(&data);
                info!(path = %store.path().display(), "Save restored");
            }
            Ok(None) => info!(path = %store.path().display(), "No save found, starting fresh"),
            Err(e) => warn!(error = %e, "Save could not be loaded, starting fresh"),
        }
    }

    // 6. Run.
    let control = run_control_for(&config, &sim);
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C received, stopping");
                control.request_stop();
            }
        });
    }
    let mut callback = ConsoleCallback::default();
    let result = run_simulation(&mut sim, &control, &mut callback).await;

    // 7. Save and report.
    log_simulation_end(&result);
    if let Some(store) = &mut store {
        store.save(&sim.save_data()).map_err(EngineError::from)?;
        info!(path = %store.path().display(), "Final save written");
    }
    {
        let stats = stats.borrow();
        info!(
            minutes = stats.minutes_passed,
            hours = stats.hours_passed,
            complaints = stats.complaints_raised,
            working_ratio = stats.mean_working_ratio(),
            "Office statistics"
        );
        match serde_json::to_string(&stats.complaints_by_category) {
            Ok(json) => info!(by_category = json.as_str(), "Complaint breakdown"),
            Err(e) => warn!(error = %e, "Complaint breakdown could not be encoded"),
        }
    }
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        played = play_time_description(sim.time().game_time()),
        "officesim-engine shutdown complete"
    );

    Ok(())
}

/// Load the configuration, reporting whether the file was present.
fn load_config() -> Result<(SimulationConfig, bool), EngineError> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        Ok((SimulationConfig::from_file(path)?, true))
    } else {
        Ok((SimulationConfig::default(), false))
    }
}

/// Frame pacing and bounds for the run, starting paused when the restored
/// clock is paused.
fn run_control_for(config: &SimulationConfig, sim: &Simulation) -> Arc<RunControl> {
    let control = Arc::new(RunControl::new(
        RunControl::interval_for(config.world.frame_rate),
        &config.simulation,
    ));
    if sim.time().is_paused() {
        control.pause();
        info!("Restored clock is paused, starting paused");
    }
    control
}

/// Install the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
