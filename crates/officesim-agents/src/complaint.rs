//! Complaint throttling and statistics.
//!
//! At most [`ComplaintConfig::max_concurrent`] agents may show a complaint
//! at the same time. Each agent counts down its own cooldown every step,
//! including while its own complaint is on display. Once the cooldown is at
//! zero and no complaint is showing, the agent asks the throttle for a slot;
//! a cooldown that runs out mid-display waits at zero until the bubble
//! clears. Whether the request is granted or denied, the cooldown is redrawn
//! (always at least one step), so a denied agent waits for a fresh random
//! delay instead of retrying every step.

use std::collections::BTreeMap;

use officesim_types::ComplaintCategory;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::agent::ActiveComplaint;
use crate::config::ComplaintConfig;

/// Per-category complaint counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintStats {
    counts: BTreeMap<ComplaintCategory, u64>,
}

impl ComplaintStats {
    /// Count one complaint.
    pub fn record(&mut self, category: ComplaintCategory) {
        let entry = self.counts.entry(category).or_insert(0);
        *entry = entry.saturating_add(1);
    }

    /// Complaints recorded for one category.
    pub fn count(&self, category: ComplaintCategory) -> u64 {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    /// Complaints recorded across all categories.
    pub fn total(&self) -> u64 {
        self.counts.values().fold(0_u64, |acc, n| acc.saturating_add(*n))
    }

    /// The `n` most frequent categories, most frequent first. Ties keep
    /// category order. Categories with a zero count are skipped.
    pub fn top(&self, n: usize) -> Vec<(ComplaintCategory, u64)> {
        let mut entries: Vec<(ComplaintCategory, u64)> = self
            .counts
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(c, count)| (*c, *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(n);
        entries
    }

    /// Shrink a category's counter to `floor(count * (1 - rate))`.
    ///
    /// `rate` is clamped to `[0, 1]`; a non-finite rate is ignored. Returns
    /// the new count.
    pub fn reduce(&mut self, category: ComplaintCategory, rate: f64) -> u64 {
        let Some(count) = self.counts.get_mut(&category) else {
            return 0;
        };
        if !rate.is_finite() {
            return *count;
        }
        let keep = 1.0 - rate.clamp(0.0, 1.0);
        *count = floor_to_u64(to_f64(*count) * keep);
        *count
    }

    /// Iterate `(category, count)` pairs in category order.
    pub fn iter(&self) -> impl Iterator<Item = (ComplaintCategory, u64)> + '_ {
        self.counts.iter().map(|(c, n)| (*c, *n))
    }
}

#[allow(clippy::cast_precision_loss)]
fn to_f64(n: u64) -> f64 {
    n as f64
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn floor_to_u64(v: f64) -> u64 {
    v.floor().max(0.0) as u64
}

/// Global cap on simultaneous complaints, plus complaint bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct ComplaintThrottler {
    config: ComplaintConfig,
    stats: ComplaintStats,
}

impl ComplaintThrottler {
    /// Create a throttle with empty statistics.
    pub fn new(config: ComplaintConfig) -> Self {
        Self {
            config,
            stats: ComplaintStats::default(),
        }
    }

    /// Active configuration.
    pub const fn config(&self) -> &ComplaintConfig {
        &self.config
    }

    /// Recorded statistics.
    pub const fn stats(&self) -> &ComplaintStats {
        &self.stats
    }

    /// Recorded statistics, mutably (relief programmes, save restore).
    pub const fn stats_mut(&mut self) -> &mut ComplaintStats {
        &mut self.stats
    }

    /// Whether a new complaint may start while `active` agents are complaining.
    pub const fn permits(&self, active: usize) -> bool {
        active < self.config.max_concurrent
    }

    /// Cooldown before a newly spawned agent's first attempt.
    pub fn first_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        self.config.first_delay.sample(rng).max(1)
    }

    /// Cooldown before the next attempt. Never zero.
    pub fn next_cooldown<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        self.config.cooldown.sample(rng).max(1)
    }

    /// Advance one agent's complaint state by one step.
    ///
    /// `others_active` is the number of *other* agents currently showing a
    /// complaint. Returns the category if a new complaint was raised.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        complaint: &mut Option<ActiveComplaint>,
        cooldown: &mut u32,
        others_active: usize,
        rng: &mut R,
    ) -> Option<ComplaintCategory> {
        if let Some(active) = complaint.as_mut() {
            active.remaining_ticks = active.remaining_ticks.saturating_sub(1);
            if active.remaining_ticks == 0 {
                *complaint = None;
            }
        }

        *cooldown = cooldown.saturating_sub(1);
        if *cooldown > 0 || complaint.is_some() {
            return None;
        }

        *cooldown = self.next_cooldown(rng);
        if !self.permits(others_active) {
            tracing::trace!(others_active, "complaint denied by throttle");
            return None;
        }

        let category = ComplaintCategory::ALL
            .choose(rng)
            .copied()
            .unwrap_or(ComplaintCategory::Noise);
        *complaint = Some(ActiveComplaint {
            category,
            remaining_ticks: self.config.display_ticks.max(1),
        });
        self.stats.record(category);
        Some(category)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::config::TickRange;

    #[test]
    fn grants_until_cap_then_denies_and_resets_cooldown() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut throttle = ComplaintThrottler::new(ComplaintConfig::default());

        let mut first = None;
        let mut first_cd = 1;
        assert!(throttle.advance(&mut first, &mut first_cd, 0, &mut rng).is_some());
        assert!(first_cd > 0);

        let mut second = None;
        let mut second_cd = 1;
        assert!(throttle.advance(&mut second, &mut second_cd, 1, &mut rng).is_some());

        let mut third = None;
        let mut third_cd = 1;
        assert!(throttle.advance(&mut third, &mut third_cd, 2, &mut rng).is_none());
        assert!(third.is_none());
        assert!(third_cd >= 900);

        assert_eq!(throttle.stats().total(), 2);
    }

    #[test]
    fn bubble_expires_after_display_ticks() {
        let mut rng = SmallRng::seed_from_u64(4);
        let config = ComplaintConfig {
            display_ticks: 3,
            ..ComplaintConfig::default()
        };
        let mut throttle = ComplaintThrottler::new(config);
        let mut complaint = None;
        let mut cooldown = 1;
        throttle.advance(&mut complaint, &mut cooldown, 0, &mut rng);
        let cooldown_after_raise = cooldown;

        for _ in 0..2 {
            throttle.advance(&mut complaint, &mut cooldown, 0, &mut rng);
            assert!(complaint.is_some());
        }
        throttle.advance(&mut complaint, &mut cooldown, 0, &mut rng);
        assert!(complaint.is_none());
        assert_eq!(cooldown, cooldown_after_raise - 3);
    }

    #[test]
    fn cooldown_keeps_running_while_a_complaint_shows() {
        let mut rng = SmallRng::seed_from_u64(9);
        let config = ComplaintConfig {
            display_ticks: 5,
            cooldown: TickRange::new(3, 3),
            ..ComplaintConfig::default()
        };
        let mut throttle = ComplaintThrottler::new(config);
        let mut complaint = None;
        let mut cooldown = 1;

        // Step 1 raises; the redrawn cooldown of 3 runs out at step 4, while
        // the bubble is up until step 6.
        assert!(throttle.advance(&mut complaint, &mut cooldown, 0, &mut rng).is_some());
        for _ in 2..=5 {
            assert!(throttle.advance(&mut complaint, &mut cooldown, 0, &mut rng).is_none());
        }
        assert_eq!(cooldown, 0);
        assert!(complaint.is_some());

        // Step 6 clears the bubble and retries straight away.
        assert!(throttle.advance(&mut complaint, &mut cooldown, 0, &mut rng).is_some());
        assert_eq!(cooldown, 3);
        assert_eq!(throttle.stats().total(), 2);
    }

    #[test]
    fn long_cooldown_is_counted_from_the_raise_not_the_bubble_end() {
        let mut rng = SmallRng::seed_from_u64(9);
        let config = ComplaintConfig {
            display_ticks: 5,
            cooldown: TickRange::new(8, 8),
            ..ComplaintConfig::default()
        };
        let mut throttle = ComplaintThrottler::new(config);
        let mut complaint = None;
        let mut cooldown = 1;

        assert!(throttle.advance(&mut complaint, &mut cooldown, 0, &mut rng).is_some());
        let mut raised_at = Vec::new();
        for step in 2..=20 {
            if throttle.advance(&mut complaint, &mut cooldown, 0, &mut rng).is_some() {
                raised_at.push(step);
            }
        }
        assert_eq!(raised_at, vec![9, 17]);
    }

    #[test]
    fn cooldown_counts_down_without_raising() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut throttle = ComplaintThrottler::new(ComplaintConfig::default());
        let mut complaint = None;
        let mut cooldown = 3;
        assert!(throttle.advance(&mut complaint, &mut cooldown, 0, &mut rng).is_none());
        assert_eq!(cooldown, 2);
    }

    #[test]
    fn reduce_floors_the_counter() {
        let mut stats = ComplaintStats::default();
        for _ in 0..7 {
            stats.record(ComplaintCategory::Printer);
        }
        assert_eq!(stats.reduce(ComplaintCategory::Printer, 0.5), 3);
        assert_eq!(stats.reduce(ComplaintCategory::Printer, 2.0), 0);
        assert_eq!(stats.reduce(ComplaintCategory::Health, 0.5), 0);
    }

    #[test]
    fn top_orders_by_count() {
        let mut stats = ComplaintStats::default();
        stats.record(ComplaintCategory::Noise);
        stats.record(ComplaintCategory::Printer);
        stats.record(ComplaintCategory::Printer);
        let top = stats.top(1);
        assert_eq!(top, vec![(ComplaintCategory::Printer, 2)]);
        assert_eq!(stats.total(), 3);
    }
}
