//! Best-effort local motion planning.
//!
//! The planner samples the straight segment between two points, nudges
//! blocked samples sideways once at random, and drops whatever is still
//! blocked. It is a local corrector, not a graph search: it never
//! backtracks and never replans mid-path.
//!
//! Obstacles are a query-time view. Desks come from the layout; agent
//! bodies are whatever the caller passes in [`Obstacles::bodies`].

use std::collections::VecDeque;

use officesim_types::{AgentId, DeskId};
use rand::Rng;

use crate::geometry::{Point, Rect};
use crate::layout::OfficeLayout;

/// Number of segments a straight path is divided into.
pub const DEFAULT_PATH_STEPS: u32 = 20;

/// Maximum lateral nudge applied to a blocked sample, in each axis.
pub const DEFAULT_DETOUR: f64 = 20.0;

/// Distance under which a waypoint counts as reached.
pub const DEFAULT_ARRIVAL_EPSILON: f64 = 3.0;

/// An agent's bounding box as seen by other agents' planners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    /// Owner of the box.
    pub id: AgentId,
    /// Bounding box.
    pub rect: Rect,
}

/// The obstacle set for one query: every desk plus every agent body.
#[derive(Debug, Clone, Copy)]
pub struct Obstacles<'a> {
    /// Static layout.
    pub layout: &'a OfficeLayout,
    /// Dynamic agent bodies.
    pub bodies: &'a [Body],
}

/// Who is asking: the moving agent is never its own obstacle, and neither
/// is the desk it holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mover {
    /// Agent whose body is excluded from the obstacle set.
    pub agent: Option<AgentId>,
    /// Desk excluded from the obstacle set.
    pub desk: Option<DeskId>,
}

impl Mover {
    /// A query on behalf of nobody (e.g. placing a new agent).
    pub const NOBODY: Self = Self {
        agent: None,
        desk: None,
    };

    /// A query on behalf of `agent`, optionally holding `desk`.
    pub const fn new(agent: AgentId, desk: Option<DeskId>) -> Self {
        Self {
            agent: Some(agent),
            desk,
        }
    }
}

impl<'a> Obstacles<'a> {
    /// Bundle a layout and the current agent bodies.
    pub const fn new(layout: &'a OfficeLayout, bodies: &'a [Body]) -> Self {
        Self { layout, bodies }
    }

    /// Every rectangle that blocks `mover`.
    fn blocking(self, mover: Mover) -> impl Iterator<Item = Rect> + 'a {
        let desks = self
            .layout
            .desks()
            .iter()
            .filter(move |d| Some(d.id) != mover.desk)
            .map(|d| d.rect);
        let bodies = self
            .bodies
            .iter()
            .filter(move |b| Some(b.id) != mover.agent)
            .map(|b| b.rect);
        desks.chain(bodies)
    }
}

/// Result of advancing one agent by one step along its path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// The path was already empty.
    Idle,
    /// The head waypoint was within the arrival radius and has been popped.
    Reached,
    /// The agent moved to the contained position.
    Advanced(Point),
    /// The next position was blocked; the agent stays put this step.
    Stalled,
}

/// Straight-line path sampler with randomized detours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPlanner {
    /// Number of segments between start and end (a path has `steps + 1`
    /// samples).
    pub steps: u32,
    /// Maximum lateral nudge per axis for a blocked sample.
    pub detour: f64,
    /// Arrival radius for waypoint consumption.
    pub arrival_epsilon: f64,
}

impl Default for MotionPlanner {
    fn default() -> Self {
        Self {
            steps: DEFAULT_PATH_STEPS,
            detour: DEFAULT_DETOUR,
            arrival_epsilon: DEFAULT_ARRIVAL_EPSILON,
        }
    }
}

impl MotionPlanner {
    /// In-bounds and no overlap with any desk or body that blocks `mover`.
    pub fn is_position_safe(&self, obstacles: Obstacles<'_>, pos: Point, mover: Mover) -> bool {
        let layout = obstacles.layout;
        if !layout.agent_in_bounds(pos) {
            return false;
        }
        let rect = Rect::square(pos, layout.agent_size());
        obstacles.blocking(mover).all(|r| !r.overlaps(&rect))
    }

    /// Plan a path from `start` to `end`.
    ///
    /// Samples `steps + 1` evenly spaced points. A blocked sample gets one
    /// random nudge of up to `detour` per axis (clamped to the world); if the
    /// nudged point is still blocked it is dropped. When nothing survives,
    /// the path is the single target point, clamped into the world.
    pub fn find_path<R: Rng + ?Sized>(
        &self,
        obstacles: Obstacles<'_>,
        start: Point,
        end: Point,
        mover: Mover,
        rng: &mut R,
    ) -> VecDeque<Point> {
        let layout = obstacles.layout;
        let steps = self.steps.max(1);
        let mut path = VecDeque::with_capacity((steps as usize).saturating_add(1));

        for i in 0..=steps {
            let t = f64::from(i) / f64::from(steps);
            let sample = start.lerp(end, t);

            if self.is_position_safe(obstacles, sample, mover) {
                path.push_back(sample);
                continue;
            }

            let nudged = layout.clamp_agent_position(Point::new(
                (rng.random::<f64>() - 0.5).mul_add(2.0 * self.detour, sample.x),
                (rng.random::<f64>() - 0.5).mul_add(2.0 * self.detour, sample.y),
            ));
            if self.is_position_safe(obstacles, nudged, mover) {
                path.push_back(nudged);
            }
        }

        if path.is_empty() {
            tracing::trace!(x = end.x, y = end.y, "no safe samples, falling back to direct target");
            path.push_back(layout.clamp_agent_position(end));
        }
        path
    }

    /// Advance an agent at `pos` one step toward the head of `path`.
    ///
    /// The step must land on a safe position, with one exception: inside an
    /// obstacle the agent already overlaps, a step is allowed as long as the
    /// shared area does not grow. A blocked step stalls without replanning.
    pub fn step_towards(
        &self,
        obstacles: Obstacles<'_>,
        mover: Mover,
        pos: Point,
        path: &mut VecDeque<Point>,
        speed: f64,
    ) -> StepOutcome {
        let Some(&target) = path.front() else {
            return StepOutcome::Idle;
        };

        let distance = pos.distance_to(target);
        if distance < self.arrival_epsilon {
            path.pop_front();
            return StepOutcome::Reached;
        }

        let scale = speed / distance;
        let next = Point::new(
            (target.x - pos.x).mul_add(scale, pos.x),
            (target.y - pos.y).mul_add(scale, pos.y),
        );

        if self.is_step_clear(obstacles, mover, pos, next) {
            StepOutcome::Advanced(next)
        } else {
            StepOutcome::Stalled
        }
    }

    fn is_step_clear(&self, obstacles: Obstacles<'_>, mover: Mover, from: Point, to: Point) -> bool {
        let layout = obstacles.layout;
        if !layout.agent_in_bounds(to) {
            return false;
        }
        let here = Rect::square(from, layout.agent_size());
        let there = Rect::square(to, layout.agent_size());
        obstacles.blocking(mover).all(|r| {
            !r.overlaps(&there)
                || (r.overlaps(&here) && r.overlap_area(&there) <= r.overlap_area(&here))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn open_floor() -> OfficeLayout {
        OfficeLayout::new(900.0, 560.0, 32.0).unwrap()
    }

    #[test]
    fn open_floor_path_is_straight_diagonal() {
        let layout = open_floor();
        let planner = MotionPlanner::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let path = planner.find_path(
            Obstacles::new(&layout, &[]),
            Point::new(0.0, 0.0),
            Point::new(100.0, 100.0),
            Mover::NOBODY,
            &mut rng,
        );

        assert_eq!(path.len(), 21);
        for (i, p) in path.iter().enumerate() {
            let expected = f64::from(u32::try_from(i).unwrap()) * 5.0;
            assert!((p.x - expected).abs() < 1e-9);
            assert!((p.y - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn waypoints_stay_in_bounds_around_desks() {
        let layout = OfficeLayout::standard(900.0, 560.0).unwrap();
        let planner = MotionPlanner::default();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..50 {
            let start = Point::new(rng.random_range(0.0..868.0), rng.random_range(0.0..528.0));
            let end = Point::new(rng.random_range(-50.0..950.0), rng.random_range(-50.0..600.0));
            let path = planner.find_path(
                Obstacles::new(&layout, &[]),
                start,
                end,
                Mover::NOBODY,
                &mut rng,
            );
            assert!(!path.is_empty());
            for p in path {
                assert!(p.x >= 0.0 && p.x <= layout.width());
                assert!(p.y >= 0.0 && p.y <= layout.height());
            }
        }
    }

    #[test]
    fn fully_blocked_path_falls_back_to_target() {
        let mut layout = OfficeLayout::new(200.0, 200.0, 32.0).unwrap();
        layout.add_desk(Rect::new(0.0, 0.0, 200.0, 200.0)).unwrap();
        let planner = MotionPlanner::default();
        let mut rng = SmallRng::seed_from_u64(3);
        let path = planner.find_path(
            Obstacles::new(&layout, &[]),
            Point::new(10.0, 10.0),
            Point::new(150.0, 150.0),
            Mover::NOBODY,
            &mut rng,
        );
        assert_eq!(path.len(), 1);
        assert_eq!(path.front().copied(), Some(Point::new(150.0, 150.0)));
    }

    #[test]
    fn other_bodies_are_obstacles_but_self_is_not() {
        let layout = open_floor();
        let planner = MotionPlanner::default();
        let me = AgentId::new();
        let other = AgentId::new();
        let bodies = [
            Body {
                id: me,
                rect: Rect::new(100.0, 100.0, 32.0, 32.0),
            },
            Body {
                id: other,
                rect: Rect::new(200.0, 100.0, 32.0, 32.0),
            },
        ];
        let obstacles = Obstacles::new(&layout, &bodies);
        let mover = Mover::new(me, None);
        assert!(planner.is_position_safe(obstacles, Point::new(100.0, 100.0), mover));
        assert!(!planner.is_position_safe(obstacles, Point::new(190.0, 100.0), mover));
        assert!(planner.is_position_safe(obstacles, Point::new(232.0, 100.0), mover));
    }

    #[test]
    fn held_desk_is_not_an_obstacle() {
        let mut layout = open_floor();
        let desk = layout.add_desk(Rect::new(270.0, 85.0, 70.0, 42.0)).unwrap();
        let seat = layout.desk(desk).unwrap().work_position;
        let planner = MotionPlanner::default();
        let obstacles = Obstacles::new(&layout, &[]);
        let me = AgentId::new();
        assert!(!planner.is_position_safe(obstacles, seat, Mover::new(me, None)));
        assert!(planner.is_position_safe(obstacles, seat, Mover::new(me, Some(desk))));
    }

    #[test]
    fn step_pops_waypoint_inside_arrival_radius() {
        let layout = open_floor();
        let planner = MotionPlanner::default();
        let mut path = VecDeque::from([Point::new(51.0, 50.0), Point::new(80.0, 50.0)]);
        let outcome = planner.step_towards(
            Obstacles::new(&layout, &[]),
            Mover::NOBODY,
            Point::new(50.0, 50.0),
            &mut path,
            1.0,
        );
        assert_eq!(outcome, StepOutcome::Reached);
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn step_advances_by_speed() {
        let layout = open_floor();
        let planner = MotionPlanner::default();
        let mut path = VecDeque::from([Point::new(80.0, 50.0)]);
        let outcome = planner.step_towards(
            Obstacles::new(&layout, &[]),
            Mover::NOBODY,
            Point::new(50.0, 50.0),
            &mut path,
            1.5,
        );
        assert!(matches!(
            outcome,
            StepOutcome::Advanced(p) if (p.x - 51.5).abs() < 1e-9 && (p.y - 50.0).abs() < 1e-9
        ));
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn blocked_step_stalls_and_keeps_waypoint() {
        let layout = open_floor();
        let planner = MotionPlanner::default();
        let me = AgentId::new();
        let bodies = [Body {
            id: AgentId::new(),
            rect: Rect::new(82.5, 50.0, 32.0, 32.0),
        }];
        let mut path = VecDeque::from([Point::new(120.0, 50.0)]);
        let outcome = planner.step_towards(
            Obstacles::new(&layout, &bodies),
            Mover::new(me, None),
            Point::new(50.0, 50.0),
            &mut path,
            1.0,
        );
        assert_eq!(outcome, StepOutcome::Stalled);
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn step_may_leave_an_overlapped_obstacle() {
        let mut layout = open_floor();
        layout.add_desk(Rect::new(270.0, 85.0, 70.0, 42.0)).unwrap();
        let planner = MotionPlanner::default();
        let mut path = VecDeque::from([Point::new(289.0, 200.0)]);
        let outcome = planner.step_towards(
            Obstacles::new(&layout, &[]),
            Mover::NOBODY,
            Point::new(289.0, 90.0),
            &mut path,
            1.0,
        );
        assert!(matches!(outcome, StepOutcome::Advanced(_)));
    }

    #[test]
    fn step_never_digs_deeper_into_an_overlapped_obstacle() {
        let mut layout = open_floor();
        layout.add_desk(Rect::new(270.0, 85.0, 70.0, 42.0)).unwrap();
        let planner = MotionPlanner::default();
        let obstacles = Obstacles::new(&layout, &[]);
        // Grazing the desk's bottom edge by 7 px.
        let grazing = Point::new(289.0, 120.0);

        let mut inward = VecDeque::from([Point::new(289.0, 0.0)]);
        let outcome = planner.step_towards(obstacles, Mover::NOBODY, grazing, &mut inward, 1.0);
        assert_eq!(outcome, StepOutcome::Stalled);

        let mut outward = VecDeque::from([Point::new(289.0, 300.0)]);
        let outcome = planner.step_towards(obstacles, Mover::NOBODY, grazing, &mut outward, 1.0);
        assert_eq!(outcome, StepOutcome::Advanced(Point::new(289.0, 121.0)));
    }

    #[test]
    fn step_from_clear_floor_never_enters_an_obstacle() {
        let mut layout = open_floor();
        layout.add_desk(Rect::new(270.0, 85.0, 70.0, 42.0)).unwrap();
        let planner = MotionPlanner::default();
        // Touching the desk's bottom edge, not overlapping it.
        let mut path = VecDeque::from([Point::new(289.0, 0.0)]);
        let outcome = planner.step_towards(
            Obstacles::new(&layout, &[]),
            Mover::NOBODY,
            Point::new(289.0, 127.0),
            &mut path,
            1.0,
        );
        assert_eq!(outcome, StepOutcome::Stalled);
    }

    #[test]
    fn path_to_own_seat_ends_at_the_seat() {
        let mut layout = open_floor();
        let desk = layout.add_desk(Rect::new(270.0, 85.0, 70.0, 42.0)).unwrap();
        let seat = layout.desk(desk).unwrap().work_position;
        let planner = MotionPlanner::default();
        let mut rng = SmallRng::seed_from_u64(5);
        let me = AgentId::new();
        let path = planner.find_path(
            Obstacles::new(&layout, &[]),
            Point::new(289.0, 400.0),
            seat,
            Mover::new(me, Some(desk)),
            &mut rng,
        );
        assert_eq!(path.len(), 21);
        assert_eq!(path.back().copied(), Some(seat));
    }

    #[test]
    fn empty_path_is_idle() {
        let layout = open_floor();
        let planner = MotionPlanner::default();
        let mut path = VecDeque::new();
        let outcome = planner.step_towards(
            Obstacles::new(&layout, &[]),
            Mover::NOBODY,
            Point::new(0.0, 0.0),
            &mut path,
            1.0,
        );
        assert_eq!(outcome, StepOutcome::Idle);
    }
}
