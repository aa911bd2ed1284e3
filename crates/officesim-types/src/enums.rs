//! Enumeration types for the office simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Agent behaviour
// ---------------------------------------------------------------------------

/// The behaviour state of an office worker.
///
/// Transitions are driven by per-agent tick timers and by uniform random
/// draws sampled at transition points. `Moving` always carries a planned
/// path and a recorded goal that decides the state entered on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum AgentStatus {
    /// Seated at an assigned desk, counting down the work timer.
    Working,
    /// Following a planned path toward a desk, an activity area, or a spot.
    Moving,
    /// Idle on the floor, periodically rolling for a new plan.
    Wandering,
    /// Occupying an activity area until the activity timer expires.
    Activity,
    /// Pausing after an aimless move until the rest timer expires.
    Resting,
}

impl AgentStatus {
    /// Return a lowercase label for logs and tooltips.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Working => "working",
            Self::Moving => "moving",
            Self::Wandering => "wandering",
            Self::Activity => "activity",
            Self::Resting => "resting",
        }
    }
}

impl core::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Complaints
// ---------------------------------------------------------------------------

/// A category of workplace complaint.
///
/// The set is fixed; complaints are drawn uniformly from [`ComplaintCategory::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ComplaintCategory {
    /// Not knowing whether the restroom is free.
    Restroom,
    /// The office is too hot or the air conditioning is weak.
    AirConditioning,
    /// Meeting rooms are hard to book or too small.
    MeetingRoom,
    /// The office is dirty.
    Cleaning,
    /// Slow or broken computers.
    Computer,
    /// The printer is broken or jammed.
    Printer,
    /// The network keeps dropping.
    Network,
    /// The water dispenser is empty.
    WaterDispenser,
    /// Colleagues are too loud.
    Noise,
    /// Strong smells in the office.
    Odor,
    /// Not enough space.
    Space,
    /// Phones ringing constantly.
    Phone,
    /// Colleagues are never at their desks.
    Colleague,
    /// Long queues at shared equipment.
    Queue,
    /// No parking spots left.
    Parking,
    /// Back pain from sitting all day.
    Health,
    /// Harsh lighting.
    Lighting,
    /// Uncomfortable chairs.
    Seating,
    /// Long canteen lines.
    Canteen,
}

impl ComplaintCategory {
    /// Every category, in a fixed order used for uniform draws.
    pub const ALL: [Self; 19] = [
        Self::Restroom,
        Self::AirConditioning,
        Self::MeetingRoom,
        Self::Cleaning,
        Self::Computer,
        Self::Printer,
        Self::Network,
        Self::WaterDispenser,
        Self::Noise,
        Self::Odor,
        Self::Space,
        Self::Phone,
        Self::Colleague,
        Self::Queue,
        Self::Parking,
        Self::Health,
        Self::Lighting,
        Self::Seating,
        Self::Canteen,
    ];

    /// Return the `snake_case` key used in event payloads and save files.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Restroom => "restroom",
            Self::AirConditioning => "air_conditioning",
            Self::MeetingRoom => "meeting_room",
            Self::Cleaning => "cleaning",
            Self::Computer => "computer",
            Self::Printer => "printer",
            Self::Network => "network",
            Self::WaterDispenser => "water_dispenser",
            Self::Noise => "noise",
            Self::Odor => "odor",
            Self::Space => "space",
            Self::Phone => "phone",
            Self::Colleague => "colleague",
            Self::Queue => "queue",
            Self::Parking => "parking",
            Self::Health => "health",
            Self::Lighting => "lighting",
            Self::Seating => "seating",
            Self::Canteen => "canteen",
        }
    }

    /// Look a category up by its [`key`](Self::key).
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.key() == key)
    }

    /// Return the speech-bubble text an agent shows for this complaint.
    pub const fn message(self) -> &'static str {
        match self {
            Self::Restroom => "I need the restroom but I can't tell if it's free.",
            Self::AirConditioning => "It's so hot in here, can someone turn up the AC?",
            Self::MeetingRoom => "I can never find a free meeting room.",
            Self::Cleaning => "This office is filthy. When is it getting cleaned?",
            Self::Computer => "My computer froze again. How am I supposed to work?",
            Self::Printer => "The printer is broken and my documents are waiting.",
            Self::Network => "The network dropped again and I missed an email.",
            Self::WaterDispenser => "The water dispenser is empty and I'm thirsty.",
            Self::Noise => "My neighbour is so loud I can't concentrate.",
            Self::Odor => "Who is eating durian? The smell is everywhere.",
            Self::Space => "Too many people squeezed into too little space.",
            Self::Phone => "That phone has been ringing forever.",
            Self::Colleague => "Nobody is ever at their desk when I need them.",
            Self::Queue => "The queue at the copier never moves.",
            Self::Parking => "No parking again. I'll have to come in earlier.",
            Self::Health => "I've been sitting all morning and my back hurts.",
            Self::Lighting => "These lights are so harsh my eyes hurt.",
            Self::Seating => "This chair is really uncomfortable.",
            Self::Canteen => "The canteen line is endless. When do I get to eat?",
        }
    }
}

impl core::fmt::Display for ComplaintCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_keys_round_trip() {
        for category in ComplaintCategory::ALL {
            assert_eq!(ComplaintCategory::from_key(category.key()), Some(category));
        }
        assert_eq!(ComplaintCategory::from_key("weather"), None);
    }

    #[test]
    fn category_keys_are_unique() {
        let mut keys: Vec<&str> = ComplaintCategory::ALL.iter().map(|c| c.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), ComplaintCategory::ALL.len());
    }

    #[test]
    fn status_labels() {
        assert_eq!(AgentStatus::Working.to_string(), "working");
        assert_eq!(AgentStatus::Activity.label(), "activity");
    }
}
