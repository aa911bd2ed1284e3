//! Virtual clock for the office simulation.
//!
//! The clock tracks two timelines: real time (wall-clock seconds fed in by
//! the frame loop) and game time (real time multiplied by the time scale).
//! Game time never decreases except through an explicit reset or restore,
//! and it is frozen while the clock is paused.
//!
//! Minute and hour boundaries are detected by comparing whole-unit counts
//! before and after an advance. Only the final value is reported, so one
//! large advance that crosses several minutes yields a single boundary.

/// Smallest accepted time scale.
pub const MIN_TIME_SCALE: f64 = 0.1;

/// Largest accepted time scale.
pub const MAX_TIME_SCALE: f64 = 5.0;

/// Time scale a fresh clock starts at.
pub const DEFAULT_TIME_SCALE: f64 = 1.0;

/// Game seconds per minute boundary.
pub const SECONDS_PER_MINUTE: f64 = 60.0;

/// Game seconds per hour boundary.
pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Clamp a requested time scale into `[MIN_TIME_SCALE, MAX_TIME_SCALE]`.
///
/// Returns `None` for NaN, which has no meaningful clamped value.
pub fn clamp_time_scale(scale: f64) -> Option<f64> {
    if scale.is_nan() {
        return None;
    }
    Some(scale.clamp(MIN_TIME_SCALE, MAX_TIME_SCALE))
}

/// The simulation's virtual clock.
#[derive(Debug, Clone, PartialEq)]
pub struct SimClock {
    game_time: f64,
    real_time: f64,
    time_scale: f64,
    paused: bool,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClock {
    /// A running clock at zero with the default scale.
    pub const fn new() -> Self {
        Self {
            game_time: 0.0,
            real_time: 0.0,
            time_scale: DEFAULT_TIME_SCALE,
            paused: false,
        }
    }

    /// Game seconds elapsed.
    pub const fn game_time(&self) -> f64 {
        self.game_time
    }

    /// Real seconds elapsed while running.
    pub const fn real_time(&self) -> f64 {
        self.real_time
    }

    /// Current multiplier from real to game time.
    pub const fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Whether the clock is frozen.
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Advance both timelines and return the game delta.
    ///
    /// The caller is responsible for not advancing a paused clock and for
    /// passing a finite, non-negative delta.
    pub fn advance(&mut self, real_delta: f64) -> f64 {
        let game_delta = real_delta * self.time_scale;
        self.real_time += real_delta;
        self.game_time += game_delta;
        game_delta
    }

    /// Store a clamped scale. Returns `(old, new)` when the stored value
    /// changed, `None` when it did not or the input was NaN.
    #[allow(clippy::float_cmp)]
    pub fn set_time_scale(&mut self, scale: f64) -> Option<(f64, f64)> {
        let clamped = clamp_time_scale(scale)?;
        if clamped == self.time_scale {
            return None;
        }
        let old = self.time_scale;
        self.time_scale = clamped;
        Some((old, clamped))
    }

    /// Set the paused flag. Returns `true` if it changed.
    pub const fn set_paused(&mut self, paused: bool) -> bool {
        if self.paused == paused {
            return false;
        }
        self.paused = paused;
        true
    }

    /// Overwrite game time. Ignores negative and non-finite values.
    pub fn restore_game_time(&mut self, game_time: f64) -> bool {
        if !game_time.is_finite() || game_time < 0.0 {
            return false;
        }
        self.game_time = game_time;
        true
    }

    /// Overwrite real time. Ignores negative and non-finite values.
    pub fn restore_real_time(&mut self, real_time: f64) -> bool {
        if !real_time.is_finite() || real_time < 0.0 {
            return false;
        }
        self.real_time = real_time;
        true
    }

    /// Back to zero, running, default scale.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Whole minutes in `seconds`.
pub fn whole_minutes(seconds: f64) -> u64 {
    whole_units(seconds, SECONDS_PER_MINUTE)
}

/// Whole hours in `seconds`.
pub fn whole_hours(seconds: f64) -> u64 {
    whole_units(seconds, SECONDS_PER_HOUR)
}

/// If `floor(current / unit)` differs from `floor(previous / unit)`,
/// return the new whole-unit count.
pub fn boundary_crossed(previous: f64, current: f64, unit: f64) -> Option<u64> {
    let before = whole_units(previous, unit);
    let after = whole_units(current, unit);
    (before != after).then_some(after)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_units(seconds: f64, unit: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds / unit).floor() as u64
}

/// Format game seconds as `H:MM:SS`, or `M:SS` under an hour.
pub fn format_clock(seconds: f64) -> String {
    let total = whole_units(seconds, 1.0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

/// Describe a play duration in words.
///
/// Under a minute reads "just started"; under an hour counts minutes;
/// otherwise hours, with leftover minutes only when there are any.
pub fn play_time_description(seconds: f64) -> String {
    let minutes = whole_minutes(seconds);
    if minutes == 0 {
        return String::from("just started");
    }
    if minutes < 60 {
        return plural(minutes, "minute");
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest == 0 {
        plural(hours, "hour")
    } else {
        format!("{} {}", plural(hours, "hour"), plural(rest, "minute"))
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_clamped() {
        assert_eq!(clamp_time_scale(0.01), Some(MIN_TIME_SCALE));
        assert_eq!(clamp_time_scale(12.0), Some(MAX_TIME_SCALE));
        assert_eq!(clamp_time_scale(-3.0), Some(MIN_TIME_SCALE));
        assert_eq!(clamp_time_scale(f64::INFINITY), Some(MAX_TIME_SCALE));
        assert_eq!(clamp_time_scale(f64::NAN), None);
    }

    #[test]
    fn set_scale_reports_only_changes() {
        let mut clock = SimClock::new();
        assert_eq!(clock.set_time_scale(1.0), None);
        assert_eq!(clock.set_time_scale(9.0), Some((1.0, 5.0)));
        assert_eq!(clock.set_time_scale(7.0), None);
        assert_eq!(clock.time_scale(), 5.0);
    }

    #[test]
    fn advance_applies_scale() {
        let mut clock = SimClock::new();
        clock.set_time_scale(2.0);
        let delta = clock.advance(1.0);
        assert_eq!(delta, 2.0);
        assert_eq!(clock.game_time(), 2.0);
        assert_eq!(clock.real_time(), 1.0);
    }

    #[test]
    fn restore_rejects_bad_values() {
        let mut clock = SimClock::new();
        assert!(!clock.restore_game_time(-1.0));
        assert!(!clock.restore_real_time(f64::NAN));
        assert!(clock.restore_game_time(42.0));
        assert_eq!(clock.game_time(), 42.0);
    }

    #[test]
    fn boundaries_use_floor_comparison() {
        assert_eq!(boundary_crossed(59.9, 60.0, SECONDS_PER_MINUTE), Some(1));
        assert_eq!(boundary_crossed(60.0, 119.0, SECONDS_PER_MINUTE), None);
        assert_eq!(boundary_crossed(30.0, 400.0, SECONDS_PER_MINUTE), Some(6));
        assert_eq!(boundary_crossed(3599.0, 3600.5, SECONDS_PER_HOUR), Some(1));
    }

    #[test]
    fn clock_strings() {
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(75.4), "1:15");
        assert_eq!(format_clock(3725.0), "1:02:05");
        assert_eq!(format_clock(-5.0), "0:00");
    }

    #[test]
    fn play_time_words() {
        assert_eq!(play_time_description(30.0), "just started");
        assert_eq!(play_time_description(60.0), "1 minute");
        assert_eq!(play_time_description(600.0), "10 minutes");
        assert_eq!(play_time_description(7200.0), "2 hours");
        assert_eq!(play_time_description(3660.0), "1 hour 1 minute");
        assert_eq!(play_time_description(5400.0), "1 hour 30 minutes");
    }
}
