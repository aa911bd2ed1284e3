//! Publish/subscribe event bus.
//!
//! Listeners are kept per topic in subscription order and called
//! synchronously by [`EventBus::publish`]. Each call is isolated: a listener
//! that returns an error or panics is logged and skipped, and the remaining
//! listeners still run.
//!
//! Listeners cannot reach the bus or the controller that owns it. A listener
//! that needs to react with further work records it in state it shares with
//! its collaborator, which acts on it during its next update.

use std::collections::BTreeMap;

use officesim_types::SubscriptionId;
use tracing::{debug, warn};

use crate::events::{SimEvent, Topic};
use crate::fault::{self, ListenerFault};

/// Callback invoked for every event on a subscribed topic.
pub type Listener = Box<dyn FnMut(&SimEvent) -> Result<(), ListenerFault>>;

struct Subscription {
    id: SubscriptionId,
    label: String,
    listener: Listener,
}

/// Outcome of one [`EventBus::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Listeners that completed.
    pub delivered: usize,
    /// Listeners that failed or panicked.
    pub faults: usize,
}

/// Topic-indexed listener table.
#[derive(Default)]
pub struct EventBus {
    topics: BTreeMap<Topic, Vec<Subscription>>,
    next_id: u64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("topics", &self.topic_counts())
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl EventBus {
    /// An empty bus.
    pub const fn new() -> Self {
        Self {
            topics: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Add a listener to `topic`. Returns the handle used to unsubscribe.
    pub fn subscribe(&mut self, topic: Topic, label: &str, listener: Listener) -> SubscriptionId {
        self.next_id = self.next_id.saturating_add(1);
        let id = SubscriptionId(self.next_id);
        debug!(topic = %topic, label, subscription = %id, "listener subscribed");
        self.topics.entry(topic).or_default().push(Subscription {
            id,
            label: label.to_owned(),
            listener,
        });
        id
    }

    /// Remove a listener. Returns `false` if it was not subscribed to `topic`.
    pub fn unsubscribe(&mut self, topic: &Topic, id: SubscriptionId) -> bool {
        let Some(subs) = self.topics.get_mut(topic) else {
            return false;
        };
        let before = subs.len();
        subs.retain(|s| s.id != id);
        let removed = subs.len() != before;
        if subs.is_empty() {
            self.topics.remove(topic);
        }
        if removed {
            debug!(topic = %topic, subscription = %id, "listener unsubscribed");
        }
        removed
    }

    /// Deliver `event` to every listener on its topic, in subscription order.
    pub fn publish(&mut self, event: &SimEvent) -> Delivery {
        let topic = event.topic();
        let mut delivery = Delivery::default();
        let Some(subs) = self.topics.get_mut(&topic) else {
            return delivery;
        };
        for sub in subs.iter_mut() {
            match fault::isolate(|| (sub.listener)(event)) {
                Ok(()) => delivery.delivered = delivery.delivered.saturating_add(1),
                Err(fault) => {
                    delivery.faults = delivery.faults.saturating_add(1);
                    warn!(
                        topic = %topic,
                        label = sub.label.as_str(),
                        subscription = %sub.id,
                        error = %fault,
                        "event listener fault"
                    );
                }
            }
        }
        delivery
    }

    /// Listeners currently subscribed to `topic`.
    pub fn listener_count(&self, topic: &Topic) -> usize {
        self.topics.get(topic).map_or(0, Vec::len)
    }

    /// `(topic, listener count)` for every topic with listeners.
    pub fn topic_counts(&self) -> Vec<(String, usize)> {
        self.topics
            .iter()
            .map(|(topic, subs)| (topic.as_str().to_owned(), subs.len()))
            .collect()
    }

    /// Drop every listener.
    pub fn clear(&mut self) {
        self.topics.clear();
    }
}
