//! The office floor plan: world extents, the desk arena, and activity areas.
//!
//! Desks live in an arena indexed by [`DeskId`]. A desk only stores an
//! `occupied` flag; the agent holding it stores the [`DeskId`]. Occupancy is
//! written exclusively by the agent simulator through [`Desk::occupy`] and
//! [`Desk::vacate`], which keeps the flag and the agent-side reference in
//! lockstep.

use officesim_types::{AreaId, DeskId, DeskSnapshot};

use crate::error::WorldError;
use crate::geometry::{Point, Rect};

/// Default world width in pixels.
pub const DEFAULT_WIDTH: f64 = 900.0;

/// Default world height in pixels.
pub const DEFAULT_HEIGHT: f64 = 560.0;

/// Edge length of every agent's square bounding box.
pub const DEFAULT_AGENT_SIZE: f64 = 32.0;

/// A desk an agent can be assigned to.
#[derive(Debug, Clone, PartialEq)]
pub struct Desk {
    /// Arena index.
    pub id: DeskId,
    /// Footprint, treated as a static obstacle.
    pub rect: Rect,
    /// Where a seated agent's bounding box is anchored.
    pub work_position: Point,
    /// Whether an agent currently holds this desk.
    occupied: bool,
}

impl Desk {
    /// Whether an agent currently holds this desk.
    pub const fn is_occupied(&self) -> bool {
        self.occupied
    }

    /// Mark the desk as held.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DeskOccupied`] if the desk is already held.
    pub fn occupy(&mut self) -> Result<(), WorldError> {
        if self.occupied {
            return Err(WorldError::DeskOccupied(self.id));
        }
        self.occupied = true;
        Ok(())
    }

    /// Mark the desk as free.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DeskVacant`] if nobody holds the desk.
    pub fn vacate(&mut self) -> Result<(), WorldError> {
        if !self.occupied {
            return Err(WorldError::DeskVacant(self.id));
        }
        self.occupied = false;
        Ok(())
    }

    /// Read-only view for the renderer.
    pub const fn snapshot(&self) -> DeskSnapshot {
        DeskSnapshot {
            id: self.id,
            x: self.rect.x,
            y: self.rect.y,
            width: self.rect.width,
            height: self.rect.height,
            occupied: self.occupied,
        }
    }
}

/// A named spot agents visit during the `Activity` state.
///
/// Activity areas are not obstacles; agents stand inside them.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityArea {
    /// Layout index.
    pub id: AreaId,
    /// Human-readable name (e.g. "Tea Room").
    pub name: String,
    /// Footprint.
    pub rect: Rect,
}

impl ActivityArea {
    /// Where a visiting agent's bounding box is anchored: centred in the area.
    pub fn visit_position(&self, agent_size: f64) -> Point {
        let c = self.rect.center();
        Point::new(c.x - agent_size / 2.0, c.y - agent_size / 2.0)
    }
}

/// The complete office floor.
#[derive(Debug, Clone, PartialEq)]
pub struct OfficeLayout {
    width: f64,
    height: f64,
    agent_size: f64,
    desks: Vec<Desk>,
    areas: Vec<ActivityArea>,
}

impl OfficeLayout {
    /// Create an empty floor of the given extents.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] if the floor cannot hold a
    /// single agent or any value is not finite.
    pub fn new(width: f64, height: f64, agent_size: f64) -> Result<Self, WorldError> {
        let valid = width.is_finite()
            && height.is_finite()
            && agent_size.is_finite()
            && agent_size > 0.0
            && width >= agent_size
            && height >= agent_size;
        if !valid {
            return Err(WorldError::InvalidDimensions {
                width,
                height,
                agent_size,
            });
        }
        Ok(Self {
            width,
            height,
            agent_size,
            desks: Vec::new(),
            areas: Vec::new(),
        })
    }

    /// The standard floor plan: a 4x4 desk grid in the middle of the room,
    /// meeting room, water dispenser and printer along the top wall, tea
    /// room and storage on the right, lounge and restroom along the bottom.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] if the extents are too small.
    pub fn standard(width: f64, height: f64) -> Result<Self, WorldError> {
        const DESK_WIDTH: f64 = 70.0;
        const DESK_HEIGHT: f64 = 42.0;
        const SPACING: f64 = 30.0;
        const START_X: f64 = 270.0;
        const START_Y: f64 = 85.0;
        // Keep the desk grid clear of the right and bottom activity strips.
        const MAX_DESK_RIGHT: f64 = 770.0;
        const MAX_DESK_BOTTOM: f64 = 380.0;

        let mut layout = Self::new(width, height, DEFAULT_AGENT_SIZE)?;

        for row in 0..4_u8 {
            for col in 0..4_u8 {
                let x = f64::from(col).mul_add(DESK_WIDTH + SPACING, START_X);
                let y = f64::from(row).mul_add(DESK_HEIGHT + SPACING, START_Y);
                if x + DESK_WIDTH > MAX_DESK_RIGHT || y + DESK_HEIGHT > MAX_DESK_BOTTOM {
                    continue;
                }
                layout.add_desk(Rect::new(x, y, DESK_WIDTH, DESK_HEIGHT))?;
            }
        }

        let areas = [
            ("Meeting Room", Rect::new(300.0, 10.0, 120.0, 55.0)),
            ("Water Dispenser", Rect::new(440.0, 10.0, 45.0, 55.0)),
            ("Printer", Rect::new(505.0, 10.0, 70.0, 55.0)),
            ("Tea Room", Rect::new(790.0, 100.0, 60.0, 70.0)),
            ("Storage", Rect::new(790.0, 190.0, 60.0, 60.0)),
            ("Lounge", Rect::new(300.0, 420.0, 160.0, 65.0)),
            ("Restroom", Rect::new(480.0, 420.0, 90.0, 65.0)),
        ];
        for (name, rect) in areas {
            layout.add_area(name, rect)?;
        }

        Ok(layout)
    }

    /// Append a desk to the arena and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ArenaFull`] if the arena index would overflow.
    pub fn add_desk(&mut self, rect: Rect) -> Result<DeskId, WorldError> {
        let id = DeskId(u32::try_from(self.desks.len()).map_err(|_err| WorldError::ArenaFull)?);
        let center = rect.center();
        let half = self.agent_size / 2.0;
        self.desks.push(Desk {
            id,
            rect,
            work_position: Point::new(center.x - half, center.y - half),
            occupied: false,
        });
        Ok(id)
    }

    /// Append an activity area and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ArenaFull`] if the area index would overflow.
    pub fn add_area(&mut self, name: &str, rect: Rect) -> Result<AreaId, WorldError> {
        let id = AreaId(u32::try_from(self.areas.len()).map_err(|_err| WorldError::ArenaFull)?);
        self.areas.push(ActivityArea {
            id,
            name: name.to_owned(),
            rect,
        });
        Ok(id)
    }

    /// World width.
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// World height.
    pub const fn height(&self) -> f64 {
        self.height
    }

    /// Edge length of an agent's bounding box.
    pub const fn agent_size(&self) -> f64 {
        self.agent_size
    }

    /// Largest x an agent's top-left corner can take while staying in bounds.
    pub fn max_agent_x(&self) -> f64 {
        self.width - self.agent_size
    }

    /// Largest y an agent's top-left corner can take while staying in bounds.
    pub fn max_agent_y(&self) -> f64 {
        self.height - self.agent_size
    }

    /// Clamp an agent anchor point into the world extents.
    pub fn clamp_agent_position(&self, p: Point) -> Point {
        Point::new(p.x.clamp(0.0, self.max_agent_x()), p.y.clamp(0.0, self.max_agent_y()))
    }

    /// Whether an agent anchored at `p` lies fully inside the world.
    pub fn agent_in_bounds(&self, p: Point) -> bool {
        p.x >= 0.0
            && p.y >= 0.0
            && p.x + self.agent_size <= self.width
            && p.y + self.agent_size <= self.height
    }

    /// All desks in arena order.
    pub fn desks(&self) -> &[Desk] {
        &self.desks
    }

    /// Look up a desk.
    pub fn desk(&self, id: DeskId) -> Option<&Desk> {
        usize::try_from(id.get()).ok().and_then(|i| self.desks.get(i))
    }

    /// Look up a desk mutably. Only the agent simulator should call this.
    pub fn desk_mut(&mut self, id: DeskId) -> Option<&mut Desk> {
        usize::try_from(id.get()).ok().and_then(|i| self.desks.get_mut(i))
    }

    /// Ids of desks nobody holds, in arena order.
    pub fn free_desks(&self) -> Vec<DeskId> {
        self.desks
            .iter()
            .filter(|d| !d.is_occupied())
            .map(|d| d.id)
            .collect()
    }

    /// All activity areas in layout order.
    pub fn areas(&self) -> &[ActivityArea] {
        &self.areas
    }

    /// Look up an activity area.
    pub fn area(&self, id: AreaId) -> Option<&ActivityArea> {
        usize::try_from(id.get()).ok().and_then(|i| self.areas.get(i))
    }

    /// Free every desk (population reset).
    pub fn vacate_all(&mut self) {
        for desk in &mut self.desks {
            desk.occupied = false;
        }
    }

    /// Read-only desk views for the renderer.
    pub fn desk_snapshots(&self) -> Vec<DeskSnapshot> {
        self.desks.iter().map(Desk::snapshot).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn standard_layout_has_sixteen_desks_and_seven_areas() {
        let layout = OfficeLayout::standard(DEFAULT_WIDTH, DEFAULT_HEIGHT).unwrap();
        assert_eq!(layout.desks().len(), 16);
        assert_eq!(layout.areas().len(), 7);
        assert_eq!(layout.free_desks().len(), 16);
    }

    #[test]
    fn desks_stay_inside_the_grid_zone() {
        let layout = OfficeLayout::standard(DEFAULT_WIDTH, DEFAULT_HEIGHT).unwrap();
        for desk in layout.desks() {
            assert!(desk.rect.x + desk.rect.width <= 770.0);
            assert!(desk.rect.y + desk.rect.height <= 380.0);
        }
    }

    #[test]
    fn work_position_is_centred_on_desk() {
        let mut layout = OfficeLayout::new(900.0, 560.0, 32.0).unwrap();
        let id = layout.add_desk(Rect::new(270.0, 85.0, 70.0, 42.0)).unwrap();
        let desk = layout.desk(id).unwrap();
        assert_eq!(desk.work_position, Point::new(289.0, 90.0));
    }

    #[test]
    fn occupy_and_vacate_toggle_flag() {
        let mut layout = OfficeLayout::standard(DEFAULT_WIDTH, DEFAULT_HEIGHT).unwrap();
        let id = DeskId(3);
        layout.desk_mut(id).unwrap().occupy().unwrap();
        assert!(layout.desk(id).unwrap().is_occupied());
        assert!(layout.desk_mut(id).unwrap().occupy().is_err());
        assert_eq!(layout.free_desks().len(), 15);
        layout.desk_mut(id).unwrap().vacate().unwrap();
        assert!(layout.desk_mut(id).unwrap().vacate().is_err());
    }

    #[test]
    fn rejects_degenerate_dimensions() {
        assert!(OfficeLayout::new(10.0, 560.0, 32.0).is_err());
        assert!(OfficeLayout::new(f64::NAN, 560.0, 32.0).is_err());
        assert!(OfficeLayout::new(900.0, 560.0, 0.0).is_err());
    }

    #[test]
    fn bounds_checks_account_for_agent_size() {
        let layout = OfficeLayout::new(100.0, 100.0, 32.0).unwrap();
        assert!(layout.agent_in_bounds(Point::new(68.0, 68.0)));
        assert!(!layout.agent_in_bounds(Point::new(68.5, 0.0)));
        assert!(!layout.agent_in_bounds(Point::new(-0.1, 0.0)));
        assert_eq!(layout.clamp_agent_position(Point::new(500.0, -3.0)), Point::new(68.0, 0.0));
    }

    #[test]
    fn unknown_desk_lookup_is_none() {
        let layout = OfficeLayout::standard(DEFAULT_WIDTH, DEFAULT_HEIGHT).unwrap();
        assert!(layout.desk(DeskId(99)).is_none());
        assert!(layout.area(AreaId(7)).is_none());
    }
}
