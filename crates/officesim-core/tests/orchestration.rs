//! End-to-end behaviour of the tick pipeline through the public API.

#![allow(clippy::unwrap_used, clippy::float_cmp, missing_docs)]

use std::cell::RefCell;
use std::rc::Rc;

use officesim_agents::TickRange;
use officesim_core::clock::{MAX_TIME_SCALE, MIN_TIME_SCALE};
use officesim_core::{
    MemoryStore, SaveStore, SimEvent, Simulation, SimulationConfig, TimeController, Topic,
};
use officesim_types::AgentStatus;

fn config(agents: usize) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.population.initial_agents = agents;
    config
}

fn recorder(time: &mut TimeController, topic: Topic) -> Rc<RefCell<Vec<SimEvent>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    time.subscribe(topic, "recorder", move |event| {
        sink.borrow_mut().push(event.clone());
        Ok(())
    });
    seen
}

#[test]
fn time_scale_is_clamped_and_applied() {
    let mut time = TimeController::new();
    assert_eq!(time.set_time_scale(50.0), MAX_TIME_SCALE);
    assert_eq!(time.set_time_scale(0.0), MIN_TIME_SCALE);
    time.set_time_scale(2.0);
    assert_eq!(time.tick(1.0), 2.0);
    assert_eq!(time.game_time(), 2.0);
    assert_eq!(time.real_time(), 1.0);
}

#[test]
fn resuming_does_not_catch_up() {
    let mut time = TimeController::new();
    time.tick(3.0);
    time.pause();
    for _ in 0..10 {
        assert_eq!(time.tick(1.0), 0.0);
    }
    assert_eq!(time.game_time(), 3.0);
    time.resume();
    time.tick(0.5);
    assert_eq!(time.game_time(), 3.5);
}

#[test]
fn one_shot_fires_exactly_at_its_deadline() {
    let mut time = TimeController::new();
    time.tick(10.0);
    let fired = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&fired);
    time.schedule_once(5.0, "deadline", move |ctx| {
        sink.borrow_mut().push(ctx.game_time());
        Ok(())
    })
    .unwrap();

    time.tick(4.9);
    assert!(fired.borrow().is_empty());
    time.tick(0.1);
    assert_eq!(fired.borrow().len(), 1);
    time.tick(100.0);
    assert_eq!(fired.borrow().len(), 1);
}

#[test]
fn recurring_names_are_unique() {
    let mut time = TimeController::new();
    let hits = Rc::new(RefCell::new(Vec::new()));
    let first = Rc::clone(&hits);
    let second = Rc::clone(&hits);
    assert!(
        time.schedule_recurring("report", 10.0, "first", move |_| {
            first.borrow_mut().push("first");
            Ok(())
        })
        .unwrap()
    );
    assert!(
        !time
            .schedule_recurring("report", 1.0, "second", move |_| {
                second.borrow_mut().push("second");
                Ok(())
            })
            .unwrap()
    );
    time.tick(10.0);
    assert_eq!(*hits.borrow(), vec!["first"]);
}

#[test]
fn minute_and_hour_boundaries_are_announced_once() {
    let mut time = TimeController::new();
    let minutes = recorder(&mut time, Topic::MinutePassed);
    let hours = recorder(&mut time, Topic::HourPassed);
    time.set_time_scale(5.0);
    for _ in 0..720 {
        time.tick(1.0);
    }
    assert_eq!(time.game_time(), 3600.0);
    assert_eq!(minutes.borrow().len(), 60);
    assert_eq!(hours.borrow().len(), 1);
    assert!(matches!(
        hours.borrow().first(),
        Some(SimEvent::HourPassed { hours: 1, .. })
    ));
}

#[test]
fn long_run_keeps_complaints_capped_and_desks_consistent() {
    let mut sim = Simulation::from_config(&config(20)).unwrap();
    sim.time_mut().set_time_scale(MAX_TIME_SCALE);
    let mut peak = 0;
    for _ in 0..2_000 {
        let summary = sim.run_tick(1.0 / 60.0);
        peak = peak.max(summary.complaining);
        assert!(summary.complaining <= 2);
        assert!(sim.agents().desk_invariant_holds());
    }
    assert!(peak <= 2);
    let layout = sim.agents().layout();
    for agent in sim.agents().agents() {
        assert!(layout.agent_in_bounds(agent.position()));
    }
}

#[test]
fn three_workers_complain_through_the_bus() {
    let mut config = config(3);
    config.complaints.first_delay = TickRange::new(1, 1);
    config.complaints.cooldown = TickRange::new(100_000, 100_000);
    let mut sim = Simulation::from_config(&config).unwrap();
    let raised = recorder(sim.time_mut(), Topic::ComplaintRaised);

    let first = sim.run_tick(1.0 / 60.0);
    assert_eq!(first.complaints_raised, 2);
    assert_eq!(raised.borrow().len(), 2);

    let total: u64 = sim.agents().complaint_stats().total();
    assert_eq!(total, 2);
    for event in raised.borrow().iter() {
        let payload = event.payload();
        assert!(payload.get("name").is_some());
        assert!(payload.get("category").is_some());
    }
}

#[test]
fn save_and_restore_through_a_store() {
    let mut sim = Simulation::from_config(&config(4)).unwrap();
    sim.time_mut().set_time_scale(3.0);
    for _ in 0..120 {
        sim.run_tick(0.25);
    }
    let mut store = MemoryStore::new();
    store.save(&sim.save_data()).unwrap();

    let mut fresh = Simulation::from_config(&config(1)).unwrap();
    fresh.restore(&store.load().unwrap().unwrap());
    assert_eq!(fresh.time().game_time(), sim.time().game_time());
    assert_eq!(fresh.time().time_scale(), 3.0);
    assert_eq!(fresh.agents().agents().len(), 4);
    assert_eq!(
        fresh.agents().complaint_stats(),
        sim.agents().complaint_stats()
    );
    assert!(fresh.agents().desk_invariant_holds());
}

#[test]
fn every_worker_is_in_exactly_one_state() {
    let mut sim = Simulation::from_config(&config(6)).unwrap();
    for _ in 0..300 {
        sim.run_tick(0.1);
    }
    let agents = sim.agents();
    let counted = [
        AgentStatus::Working,
        AgentStatus::Moving,
        AgentStatus::Wandering,
        AgentStatus::Activity,
        AgentStatus::Resting,
    ]
    .into_iter()
    .map(|status| agents.count_in(status))
    .sum::<usize>();
    assert_eq!(counted, 6);
    assert_eq!(sim.snapshot().agents.len(), 6);
}
