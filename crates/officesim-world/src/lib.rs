//! Office geometry, layout, and motion planning for the office simulation.
//!
//! This crate models the physical floor: a fixed rectangle of world extents,
//! an arena of desks addressed by [`DeskId`], named activity areas, and the
//! best-effort local [`MotionPlanner`] that moves agents between them.
//!
//! # Modules
//!
//! - [`error`] -- Error types for layout operations.
//! - [`geometry`] -- [`Point`] and axis-aligned [`Rect`] with overlap tests.
//! - [`layout`] -- [`OfficeLayout`], [`Desk`], and [`ActivityArea`], plus the
//!   standard 900x560 floor plan.
//! - [`motion`] -- Straight-line path sampling with randomized detours, the
//!   position safety test, and per-tick movement execution.
//!
//! [`DeskId`]: officesim_types::DeskId

pub mod error;
pub mod geometry;
pub mod layout;
pub mod motion;

pub use error::WorldError;
pub use geometry::{Point, Rect};
pub use layout::{ActivityArea, Desk, OfficeLayout};
pub use motion::{Body, MotionPlanner, Mover, Obstacles, StepOutcome};
