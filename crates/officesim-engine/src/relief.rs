//! Complaint relief programmes.
//!
//! A programme activates once game time reaches its start, cuts its target
//! complaint counters, and may slow down pending complaint attempts. From
//! then on a recurring task named after the programme requests maintenance:
//! further cuts and, by chance, a morale boost that pushes every worker's
//! next complaint out to a floor.

use std::cell::Cell;
use std::rc::Rc;

use officesim_agents::AgentSimulator;
use officesim_core::config::{ReliefConfig, ReliefTarget};
use officesim_core::{Subsystem, SubsystemContext, SubsystemError};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// One configured relief programme.
#[derive(Debug)]
pub struct ReliefProgramme {
    config: ReliefConfig,
    rng: SmallRng,
    active: bool,
    maintenance_due: Rc<Cell<u32>>,
    maintenance_runs: u64,
}

impl ReliefProgramme {
    /// A dormant programme. `seed` drives its morale rolls.
    pub fn new(config: ReliefConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
            active: false,
            maintenance_due: Rc::new(Cell::new(0)),
            maintenance_runs: 0,
        }
    }

    fn activate(&mut self, ctx: &mut SubsystemContext<'_>) -> Result<(), SubsystemError> {
        apply_reductions(ctx.agents, &self.config.on_activate);
        if (self.config.cooldown_factor - 1.0).abs() > f64::EPSILON {
            ctx.agents
                .scale_complaint_cooldowns(self.config.cooldown_factor);
        }

        let due = Rc::clone(&self.maintenance_due);
        ctx.time.schedule_recurring(
            &self.config.name,
            self.config.maintenance_interval_secs,
            "relief maintenance",
            move |_| {
                due.set(due.get().saturating_add(1));
                Ok(())
            },
        )?;
        self.active = true;
        info!(
            programme = self.config.name.as_str(),
            game_time = ctx.time.game_time(),
            "relief programme activated"
        );
        Ok(())
    }

    fn maintain(&mut self, agents: &mut AgentSimulator) {
        apply_reductions(agents, &self.config.maintenance);
        self.maintenance_runs = self.maintenance_runs.saturating_add(1);
        debug!(
            programme = self.config.name.as_str(),
            runs = self.maintenance_runs,
            "relief maintenance"
        );
        let chance = if self.config.morale_chance.is_finite() {
            self.config.morale_chance.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if self.rng.random_bool(chance) {
            agents.boost_morale(self.config.morale_floor_ticks);
            debug!(
                programme = self.config.name.as_str(),
                floor = self.config.morale_floor_ticks,
                "morale boosted"
            );
        }
    }
}

fn apply_reductions(agents: &mut AgentSimulator, targets: &[ReliefTarget]) {
    for target in targets {
        if agents.complaint_stats().count(target.category) > 0 {
            agents.reduce_complaint_stats(target.category, target.rate);
        }
    }
}

impl Subsystem for ReliefProgramme {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn update(
        &mut self,
        ctx: &mut SubsystemContext<'_>,
        _game_delta: f64,
    ) -> Result<(), SubsystemError> {
        if !self.active {
            if ctx.time.game_time() < self.config.activate_at_secs {
                return Ok(());
            }
            self.activate(ctx)?;
        }
        for _ in 0..self.maintenance_due.replace(0) {
            self.maintain(ctx.agents);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use officesim_agents::ComplaintStats;
    use officesim_core::{Simulation, SimulationConfig};
    use officesim_types::ComplaintCategory;

    use super::*;

    fn printer_programme() -> ReliefConfig {
        ReliefConfig {
            name: "printer_maintenance".to_owned(),
            activate_at_secs: 5.0,
            on_activate: vec![
                ReliefTarget {
                    category: ComplaintCategory::Printer,
                    rate: 0.75,
                },
                ReliefTarget {
                    category: ComplaintCategory::Queue,
                    rate: 0.5,
                },
            ],
            cooldown_factor: 1.0,
            maintenance_interval_secs: 20.0,
            maintenance: vec![ReliefTarget {
                category: ComplaintCategory::Printer,
                rate: 0.5,
            }],
            morale_chance: 0.0,
            morale_floor_ticks: 1800,
        }
    }

    fn sim_with_counts(printer: u32, queue: u32) -> Simulation {
        let mut config = SimulationConfig::default();
        config.population.initial_agents = 4;
        let mut sim = Simulation::from_config(&config).unwrap();
        let mut stats = ComplaintStats::default();
        for _ in 0..printer {
            stats.record(ComplaintCategory::Printer);
        }
        for _ in 0..queue {
            stats.record(ComplaintCategory::Queue);
        }
        sim.agents_mut().restore_complaint_stats(stats);
        sim
    }

    fn printer_count(sim: &Simulation) -> u64 {
        sim.agents()
            .complaint_stats()
            .count(ComplaintCategory::Printer)
    }

    #[test]
    fn waits_for_its_start_then_cuts_counters() {
        let mut sim = sim_with_counts(100, 10);
        // Keep the agents from adding complaints of their own.
        sim.agents_mut().defer_complaints(1_000_000);
        sim.register(Box::new(ReliefProgramme::new(printer_programme(), 7)));

        for _ in 0..4 {
            sim.run_tick(1.0);
        }
        assert_eq!(printer_count(&sim), 100);
        assert!(!sim.time().has_recurring("printer_maintenance"));

        sim.run_tick(1.0);
        assert_eq!(printer_count(&sim), 25);
        assert_eq!(
            sim.agents()
                .complaint_stats()
                .count(ComplaintCategory::Queue),
            5
        );
        assert!(sim.time().has_recurring("printer_maintenance"));
    }

    #[test]
    fn maintenance_runs_on_its_interval() {
        let mut sim = sim_with_counts(100, 0);
        sim.agents_mut().defer_complaints(1_000_000);
        sim.register(Box::new(ReliefProgramme::new(printer_programme(), 7)));
        for _ in 0..5 {
            sim.run_tick(1.0);
        }
        assert_eq!(printer_count(&sim), 25);
        for _ in 0..19 {
            sim.run_tick(1.0);
        }
        assert_eq!(printer_count(&sim), 25);
        sim.run_tick(1.0);
        assert_eq!(printer_count(&sim), 12);
        for _ in 0..20 {
            sim.run_tick(1.0);
        }
        assert_eq!(printer_count(&sim), 6);
    }

    #[test]
    fn morale_boost_raises_every_cooldown() {
        let mut sim = sim_with_counts(0, 0);
        let mut config = printer_programme();
        config.activate_at_secs = 0.0;
        config.maintenance_interval_secs = 1.0;
        config.morale_chance = 1.0;
        config.morale_floor_ticks = 50_000;
        sim.register(Box::new(ReliefProgramme::new(config, 1)));
        sim.run_tick(0.0);
        sim.run_tick(1.0);
        assert!(
            sim.agents()
                .agents()
                .iter()
                .all(|a| a.next_complaint_in() >= 49_000)
        );
    }

    #[test]
    fn cooldown_factor_scales_pending_attempts() {
        let mut sim = sim_with_counts(0, 0);
        sim.agents_mut().defer_complaints(10_000);
        let before: Vec<u32> = sim
            .agents()
            .agents()
            .iter()
            .map(|a| a.next_complaint_in())
            .collect();
        let mut config = printer_programme();
        config.activate_at_secs = 0.0;
        config.cooldown_factor = 2.0;
        sim.register(Box::new(ReliefProgramme::new(config, 1)));
        sim.run_tick(0.0);
        let after: Vec<u32> = sim
            .agents()
            .agents()
            .iter()
            .map(|a| a.next_complaint_in())
            .collect();
        for (b, a) in before.iter().zip(&after) {
            assert_eq!(*a, b * 2);
        }
    }
}
