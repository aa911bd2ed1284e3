//! Office worker behaviour for the office simulation.
//!
//! This crate owns the agent population. It is the only place that changes
//! agent state or desk occupancy, and it runs the complaint throttle that
//! caps how many workers complain at once.
//!
//! # Modules
//!
//! - [`agent`] -- Per-agent state ([`Agent`]), timers, and arrival goals.
//! - [`complaint`] -- [`ComplaintThrottler`] and per-category [`ComplaintStats`].
//! - [`config`] -- Behaviour and complaint parameters ([`BehaviorConfig`], [`ComplaintConfig`]).
//! - [`error`] -- Error types for population operations ([`AgentError`]).
//! - [`names`] -- The display-name roster.
//! - [`simulator`] -- [`AgentSimulator`]: stepping, spawning, desk assignment, relief operations.

pub mod agent;
pub mod complaint;
pub mod config;
pub mod error;
pub mod names;
pub mod simulator;

pub use agent::{ActiveComplaint, Agent, AgentTimers, MoveGoal};
pub use complaint::{ComplaintStats, ComplaintThrottler};
pub use config::{BehaviorConfig, ComplaintConfig, TickRange};
pub use error::AgentError;
pub use names::NamePool;
pub use simulator::{AgentEvent, AgentSimulator, DEFAULT_FRAME_RATE, DEFAULT_MAX_STEPS_PER_UPDATE};
