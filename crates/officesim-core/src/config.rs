//! Configuration loading and typed config structures for the office simulation.
//!
//! The canonical configuration lives in `officesim-config.yaml` at the
//! project root. Every section and field has a default, so an empty or
//! partial file is valid.

use std::path::{Path, PathBuf};

use officesim_agents::{BehaviorConfig, ComplaintConfig};
use officesim_types::ComplaintCategory;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `officesim-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Office dimensions, seed and frame rate.
    #[serde(default)]
    pub world: WorldConfig,

    /// Clock and built-in task settings.
    #[serde(default)]
    pub time: TimeConfig,

    /// Starting population.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Agent state machine parameters.
    #[serde(default)]
    pub behavior: BehaviorConfig,

    /// Complaint throttle parameters.
    #[serde(default)]
    pub complaints: ComplaintConfig,

    /// Run boundaries.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Save file settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Complaint relief programmes, activated in order.
    #[serde(default)]
    pub relief: Vec<ReliefConfig>,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `OFFICESIM_SAVE_PATH` overrides `persistence.save_path` when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.persistence.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }
}

/// Office and frame settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable office name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Floor width in pixels.
    #[serde(default = "default_width")]
    pub width: f64,

    /// Floor height in pixels.
    #[serde(default = "default_height")]
    pub height: f64,

    /// Frames per real second, and behaviour steps per game second.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,

    /// Most behaviour steps one frame may run.
    #[serde(default = "default_max_steps_per_update")]
    pub max_steps_per_update: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            width: default_width(),
            height: default_height(),
            frame_rate: default_frame_rate(),
            max_steps_per_update: default_max_steps_per_update(),
        }
    }
}

/// Clock configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeConfig {
    /// Time scale at start (clamped to 0.1-5.0).
    #[serde(default = "default_initial_scale")]
    pub initial_scale: f64,

    /// Game seconds between scheduler health checks.
    #[serde(default = "default_system_check_interval")]
    pub system_check_interval_secs: f64,

    /// Game seconds between autosave reminders.
    #[serde(default = "default_autosave_interval")]
    pub autosave_interval_secs: f64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            initial_scale: default_initial_scale(),
            system_check_interval_secs: default_system_check_interval(),
            autosave_interval_secs: default_autosave_interval(),
        }
    }
}

/// Population configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PopulationConfig {
    /// Number of agents spawned at start.
    #[serde(default = "default_initial_agents")]
    pub initial_agents: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            initial_agents: default_initial_agents(),
        }
    }
}

/// Simulation boundary configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Maximum number of ticks before the run ends (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Maximum wall-clock seconds before the run ends (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

/// Save file configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Whether to load at start and save on reminders and at exit.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path of the JSON save file.
    #[serde(default = "default_save_path")]
    pub save_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            save_path: default_save_path(),
        }
    }
}

impl PersistenceConfig {
    /// Apply `OFFICESIM_SAVE_PATH` if it is set.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("OFFICESIM_SAVE_PATH") {
            self.save_path = PathBuf::from(path);
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// One category reduction applied by a relief programme.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ReliefTarget {
    /// Complaint category to reduce.
    pub category: ComplaintCategory,
    /// Fraction of the counter removed (0-1).
    pub rate: f64,
}

/// A complaint relief programme.
///
/// On activation it reduces its target counters, optionally slows down
/// complaint attempts, and then runs maintenance on a recurring task.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReliefConfig {
    /// Programme name, also used as the recurring task name.
    pub name: String,

    /// Game seconds after start at which the programme activates.
    #[serde(default)]
    pub activate_at_secs: f64,

    /// Reductions applied once on activation.
    #[serde(default)]
    pub on_activate: Vec<ReliefTarget>,

    /// Multiplier applied to pending complaint cooldowns on activation
    /// (1.0 leaves them alone).
    #[serde(default = "default_cooldown_factor")]
    pub cooldown_factor: f64,

    /// Game seconds between maintenance runs.
    #[serde(default = "default_maintenance_interval")]
    pub maintenance_interval_secs: f64,

    /// Reductions applied on each maintenance run.
    #[serde(default)]
    pub maintenance: Vec<ReliefTarget>,

    /// Chance per maintenance run of a morale boost.
    #[serde(default = "default_morale_chance")]
    pub morale_chance: f64,

    /// Minimum cooldown, in steps, that a morale boost enforces.
    #[serde(default = "default_morale_floor_ticks")]
    pub morale_floor_ticks: u32,
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Open-plan office".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_width() -> f64 {
    officesim_world::layout::DEFAULT_WIDTH
}

const fn default_height() -> f64 {
    officesim_world::layout::DEFAULT_HEIGHT
}

const fn default_frame_rate() -> f64 {
    officesim_agents::DEFAULT_FRAME_RATE
}

const fn default_max_steps_per_update() -> u32 {
    officesim_agents::DEFAULT_MAX_STEPS_PER_UPDATE
}

const fn default_initial_scale() -> f64 {
    1.0
}

const fn default_system_check_interval() -> f64 {
    5.0
}

const fn default_autosave_interval() -> f64 {
    30.0
}

const fn default_initial_agents() -> usize {
    12
}

const fn default_true() -> bool {
    true
}

fn default_save_path() -> PathBuf {
    PathBuf::from("officesim-save.json")
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_cooldown_factor() -> f64 {
    1.0
}

const fn default_maintenance_interval() -> f64 {
    30.0
}

const fn default_morale_chance() -> f64 {
    0.3
}

const fn default_morale_floor_ticks() -> u32 {
    1800
}
