//! Tunable parameters for agent behaviour and complaints.
//!
//! Timer durations are whole behaviour steps (one step per frame at the
//! configured frame rate). Probabilities are drawn from a single uniform
//! sample at each transition point, so the chances listed for one state
//! are cumulative thresholds over `[0, 1)`.
//!
//! Both structs deserialize from the `behavior` and `complaints` sections of
//! `officesim-config.yaml`; every field has a default.

use rand::Rng;
use serde::Deserialize;

/// An inclusive range of tick counts to draw timers from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TickRange {
    /// Lower bound.
    pub min: u32,
    /// Upper bound.
    pub max: u32,
}

impl TickRange {
    /// Create a range.
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Draw a value. A reversed range collapses to `min`.
    pub fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> u32 {
        if self.max <= self.min {
            self.min
        } else {
            rng.random_range(self.min..=self.max)
        }
    }
}

/// Configuration for the per-agent state machine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BehaviorConfig {
    /// Work timer when an agent sits down at a desk (default: 600-1800).
    #[serde(default = "default_work_ticks")]
    pub work_ticks: TickRange,

    /// Work timer when a working agent decides to keep working (default: 300-1200).
    #[serde(default = "default_renew_work_ticks")]
    pub renew_work_ticks: TickRange,

    /// Time spent in an activity area (default: 120-360).
    #[serde(default = "default_activity_ticks")]
    pub activity_ticks: TickRange,

    /// Rest after an aimless move or after an activity (default: 60-180).
    #[serde(default = "default_rest_ticks")]
    pub rest_ticks: TickRange,

    /// Pause between wandering decisions (default: 30-90).
    #[serde(default = "default_wander_ticks")]
    pub wander_ticks: TickRange,

    /// Wait before retrying when no desk is free (default: 120).
    #[serde(default = "default_no_desk_retry_ticks")]
    pub no_desk_retry_ticks: u32,

    /// Wait before retrying when every activity area is taken (default: 60).
    #[serde(default = "default_no_area_retry_ticks")]
    pub no_area_retry_ticks: u32,

    /// Working, timer expired: chance to start an activity (default: 0.5).
    #[serde(default = "default_work_to_activity")]
    pub work_to_activity: f64,

    /// Working, timer expired: chance to get up and wander (default: 0.3).
    /// The remainder renews the work timer.
    #[serde(default = "default_work_to_wander")]
    pub work_to_wander: f64,

    /// Wandering, per decision: chance to return to a desk (default: 0.03).
    #[serde(default = "default_wander_to_work")]
    pub wander_to_work: f64,

    /// Wandering, per decision: chance to start an activity (default: 0.03).
    #[serde(default = "default_wander_to_activity")]
    pub wander_to_activity: f64,

    /// Wandering, per decision: chance to walk somewhere random (default: 0.04).
    #[serde(default = "default_wander_to_relocate")]
    pub wander_to_relocate: f64,

    /// Activity finished: chance to return to a desk (default: 0.6).
    #[serde(default = "default_activity_to_work")]
    pub activity_to_work: f64,

    /// Rest finished: chance to return to a desk (default: 0.6).
    #[serde(default = "default_rest_to_work")]
    pub rest_to_work: f64,

    /// Rest finished: chance to start an activity (default: 0.2).
    /// The remainder relocates.
    #[serde(default = "default_rest_to_activity")]
    pub rest_to_activity: f64,

    /// Per-step chance a working agent flashes its name (default: 0.001).
    #[serde(default = "default_name_flash_chance")]
    pub name_flash_chance: f64,

    /// Name label duration for a flash while working (default: 120).
    #[serde(default = "default_name_flash_ticks")]
    pub name_flash_ticks: u32,

    /// Name label duration when starting an activity (default: 180).
    #[serde(default = "default_activity_name_ticks")]
    pub activity_name_ticks: u32,

    /// Slowest walking speed in pixels per step (default: 1.0).
    #[serde(default = "default_min_speed")]
    pub min_speed: f64,

    /// Fastest walking speed in pixels per step (default: 1.5).
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,

    /// Chance a new agent is seated at a free desk (default: 0.8).
    #[serde(default = "default_desk_preference")]
    pub desk_preference: f64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            work_ticks: default_work_ticks(),
            renew_work_ticks: default_renew_work_ticks(),
            activity_ticks: default_activity_ticks(),
            rest_ticks: default_rest_ticks(),
            wander_ticks: default_wander_ticks(),
            no_desk_retry_ticks: default_no_desk_retry_ticks(),
            no_area_retry_ticks: default_no_area_retry_ticks(),
            work_to_activity: default_work_to_activity(),
            work_to_wander: default_work_to_wander(),
            wander_to_work: default_wander_to_work(),
            wander_to_activity: default_wander_to_activity(),
            wander_to_relocate: default_wander_to_relocate(),
            activity_to_work: default_activity_to_work(),
            rest_to_work: default_rest_to_work(),
            rest_to_activity: default_rest_to_activity(),
            name_flash_chance: default_name_flash_chance(),
            name_flash_ticks: default_name_flash_ticks(),
            activity_name_ticks: default_activity_name_ticks(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
            desk_preference: default_desk_preference(),
        }
    }
}

impl BehaviorConfig {
    /// Draw a walking speed.
    pub fn sample_speed<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max_speed > self.min_speed {
            rng.random_range(self.min_speed..self.max_speed)
        } else {
            self.min_speed
        }
    }
}

/// Configuration for the complaint throttle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ComplaintConfig {
    /// Maximum agents showing a complaint at once (default: 2).
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// How long a complaint bubble stays up (default: 300).
    #[serde(default = "default_display_ticks")]
    pub display_ticks: u32,

    /// Delay before a new agent's first complaint attempt (default: 60-240).
    #[serde(default = "default_first_delay")]
    pub first_delay: TickRange,

    /// Delay between complaint attempts (default: 900-2700).
    #[serde(default = "default_cooldown")]
    pub cooldown: TickRange,
}

impl Default for ComplaintConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            display_ticks: default_display_ticks(),
            first_delay: default_first_delay(),
            cooldown: default_cooldown(),
        }
    }
}

const fn default_work_ticks() -> TickRange {
    TickRange::new(600, 1800)
}

const fn default_renew_work_ticks() -> TickRange {
    TickRange::new(300, 1200)
}

const fn default_activity_ticks() -> TickRange {
    TickRange::new(120, 360)
}

const fn default_rest_ticks() -> TickRange {
    TickRange::new(60, 180)
}

const fn default_wander_ticks() -> TickRange {
    TickRange::new(30, 90)
}

const fn default_no_desk_retry_ticks() -> u32 {
    120
}

const fn default_no_area_retry_ticks() -> u32 {
    60
}

const fn default_work_to_activity() -> f64 {
    0.5
}

const fn default_work_to_wander() -> f64 {
    0.3
}

const fn default_wander_to_work() -> f64 {
    0.03
}

const fn default_wander_to_activity() -> f64 {
    0.03
}

const fn default_wander_to_relocate() -> f64 {
    0.04
}

const fn default_activity_to_work() -> f64 {
    0.6
}

const fn default_rest_to_work() -> f64 {
    0.6
}

const fn default_rest_to_activity() -> f64 {
    0.2
}

const fn default_name_flash_chance() -> f64 {
    0.001
}

const fn default_name_flash_ticks() -> u32 {
    120
}

const fn default_activity_name_ticks() -> u32 {
    180
}

const fn default_min_speed() -> f64 {
    1.0
}

const fn default_max_speed() -> f64 {
    1.5
}

const fn default_desk_preference() -> f64 {
    0.8
}

const fn default_max_concurrent() -> usize {
    2
}

const fn default_display_ticks() -> u32 {
    300
}

const fn default_first_delay() -> TickRange {
    TickRange::new(60, 240)
}

const fn default_cooldown() -> TickRange {
    TickRange::new(900, 2700)
}
