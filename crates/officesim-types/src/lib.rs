//! Shared type definitions for the office simulation.
//!
//! This crate is the single source of truth for identifiers, enums, and
//! read-only snapshots used across the workspace. Snapshot types flow to
//! `TypeScript` via `ts-rs` so a renderer can consume them verbatim.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe identifiers (UUID-backed agents, index-backed
//!   desks, areas, tasks, and subscriptions)
//! - [`enums`] -- Agent status and complaint categories
//! - [`snapshot`] -- Per-tick read-only views for the render collaborator

pub mod enums;
pub mod ids;
pub mod snapshot;

pub use enums::{AgentStatus, ComplaintCategory};
pub use ids::{AgentId, AreaId, DeskId, SubscriptionId, TaskId};
pub use snapshot::{AgentSnapshot, ComplaintSnapshot, DeskSnapshot, OfficeSnapshot};
