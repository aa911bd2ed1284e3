//! Event topics and typed payloads carried by the event bus.
//!
//! Every event the core publishes is a [`SimEvent`] variant with a
//! strongly-typed payload. Collaborators that need their own topics use
//! [`SimEvent::Custom`] with a JSON payload.

use std::fmt;

use officesim_types::{AgentId, ComplaintCategory};
use serde_json::{Value, json};

/// Name of a subscription channel.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Topic {
    /// Game time crossed a whole minute.
    MinutePassed,
    /// Game time crossed a whole hour.
    HourPassed,
    /// The stored time scale changed.
    TimeScaleChanged,
    /// The clock was paused.
    TimePaused,
    /// The clock was resumed.
    TimeResumed,
    /// The built-in autosave reminder fired.
    AutosaveReminder,
    /// An agent started showing a complaint.
    ComplaintRaised,
    /// A collaborator-defined topic.
    Custom(String),
}

impl Topic {
    /// Wire name of the topic.
    pub fn as_str(&self) -> &str {
        match self {
            Self::MinutePassed => "minute_passed",
            Self::HourPassed => "hour_passed",
            Self::TimeScaleChanged => "time_scale_changed",
            Self::TimePaused => "time_paused",
            Self::TimeResumed => "time_resumed",
            Self::AutosaveReminder => "autosave_reminder",
            Self::ComplaintRaised => "complaint_raised",
            Self::Custom(name) => name,
        }
    }

    /// Map a wire name back to a topic. Unknown names become [`Topic::Custom`].
    pub fn parse(name: &str) -> Self {
        match name {
            "minute_passed" => Self::MinutePassed,
            "hour_passed" => Self::HourPassed,
            "time_scale_changed" => Self::TimeScaleChanged,
            "time_paused" => Self::TimePaused,
            "time_resumed" => Self::TimeResumed,
            "autosave_reminder" => Self::AutosaveReminder,
            "complaint_raised" => Self::ComplaintRaised,
            other => Self::Custom(other.to_owned()),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event delivered to subscribers of its [`Topic`].
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// Game time reached a new whole minute.
    MinutePassed {
        /// Game time when detected.
        game_time: f64,
        /// Whole minutes of game time.
        minutes: u64,
    },
    /// Game time reached a new whole hour.
    HourPassed {
        /// Game time when detected.
        game_time: f64,
        /// Whole hours of game time.
        hours: u64,
    },
    /// The time scale changed.
    TimeScaleChanged {
        /// Scale before the change.
        old_scale: f64,
        /// Scale after clamping.
        new_scale: f64,
    },
    /// The clock was paused.
    TimePaused {
        /// Game time at the pause.
        game_time: f64,
    },
    /// The clock was resumed.
    TimeResumed {
        /// Game time at the resume.
        game_time: f64,
    },
    /// Periodic nudge for the persistence collaborator.
    AutosaveReminder {
        /// Game time when the reminder fired.
        game_time: f64,
    },
    /// An agent started complaining.
    ComplaintRaised {
        /// The complaining agent.
        agent: AgentId,
        /// Its display name.
        name: String,
        /// What it complained about.
        category: ComplaintCategory,
    },
    /// Collaborator-defined event.
    Custom {
        /// Topic name.
        topic: String,
        /// Free-form payload.
        payload: Value,
    },
}

impl SimEvent {
    /// Topic this event is delivered on.
    pub fn topic(&self) -> Topic {
        match self {
            Self::MinutePassed { .. } => Topic::MinutePassed,
            Self::HourPassed { .. } => Topic::HourPassed,
            Self::TimeScaleChanged { .. } => Topic::TimeScaleChanged,
            Self::TimePaused { .. } => Topic::TimePaused,
            Self::TimeResumed { .. } => Topic::TimeResumed,
            Self::AutosaveReminder { .. } => Topic::AutosaveReminder,
            Self::ComplaintRaised { .. } => Topic::ComplaintRaised,
            Self::Custom { topic, .. } => Topic::parse(topic),
        }
    }

    /// JSON form of the payload, with camelCase keys.
    pub fn payload(&self) -> Value {
        match self {
            Self::MinutePassed { game_time, minutes } => {
                json!({ "gameTime": game_time, "minutes": minutes })
            }
            Self::HourPassed { game_time, hours } => {
                json!({ "gameTime": game_time, "hours": hours })
            }
            Self::TimeScaleChanged {
                old_scale,
                new_scale,
            } => json!({ "oldScale": old_scale, "newScale": new_scale }),
            Self::TimePaused { game_time }
            | Self::TimeResumed { game_time }
            | Self::AutosaveReminder { game_time } => json!({ "gameTime": game_time }),
            Self::ComplaintRaised {
                agent,
                name,
                category,
            } => json!({
                "agentId": agent.to_string(),
                "name": name,
                "category": category.key(),
            }),
            Self::Custom { payload, .. } => payload.clone(),
        }
    }
}
