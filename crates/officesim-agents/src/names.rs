//! Display names for office workers.
//!
//! Names come from a fixed roster. A name is reserved while its agent is
//! on the floor and returned when the agent leaves. When every name is in
//! use the reservations are cleared and the roster starts over, so
//! duplicates are possible in very large offices.

use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::IndexedRandom;

/// The fixed roster.
pub const ROSTER: [&str; 24] = [
    "Alex", "Bea", "Chen", "Dana", "Eli", "Fay", "Gus", "Hana", "Ivan", "Jia", "Kofi", "Lena",
    "Mina", "Noor", "Omar", "Pia", "Quinn", "Ravi", "Sara", "Tomas", "Uma", "Vic", "Wen", "Yuki",
];

/// Tracks which roster names are currently in use.
#[derive(Debug, Clone, Default)]
pub struct NamePool {
    in_use: BTreeSet<&'static str>,
}

impl NamePool {
    /// Create an empty pool.
    pub const fn new() -> Self {
        Self {
            in_use: BTreeSet::new(),
        }
    }

    /// Reserve a random unused name.
    pub fn acquire<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String {
        let free: Vec<&'static str> = ROSTER
            .iter()
            .copied()
            .filter(|n| !self.in_use.contains(n))
            .collect();

        let pick = if let Some(&name) = free.choose(rng) {
            name
        } else {
            tracing::debug!("name roster exhausted, recycling");
            self.in_use.clear();
            ROSTER.choose(rng).copied().unwrap_or("Anon")
        };
        self.in_use.insert(pick);
        pick.to_owned()
    }

    /// Return a name to the pool. Unknown names are ignored.
    pub fn release(&mut self, name: &str) {
        self.in_use.retain(|n| *n != name);
    }

    /// Forget every reservation.
    pub fn clear(&mut self) {
        self.in_use.clear();
    }

    /// Number of names currently reserved.
    pub fn in_use(&self) -> usize {
        self.in_use.len()
    }
}
