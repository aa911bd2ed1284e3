//! Type-safe identifiers for simulation entities.
//!
//! Agents are identified by UUID v7 values so that identifiers stay unique
//! across population resets and save files. Desks and activity areas live in
//! fixed arenas and are addressed by stable integer indices. Scheduled tasks
//! and event subscriptions use monotonically assigned integers whose order
//! doubles as registration order.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

/// Generates a newtype wrapper around an unsigned integer index.
macro_rules! define_index_id {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty)
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub $inner);

        impl $name {
            /// Return the raw index value.
            pub const fn get(self) -> $inner {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "#{}", self.0)
            }
        }
    };
}

define_uuid_id! {
    /// Unique identifier for a simulated office worker.
    AgentId
}

define_index_id! {
    /// Stable index of a desk in the layout's desk arena.
    DeskId(u32)
}

define_index_id! {
    /// Stable index of an activity area in the layout.
    AreaId(u32)
}

define_index_id! {
    /// Identifier of a one-shot scheduled task, assigned in registration order.
    TaskId(u64)
}

define_index_id! {
    /// Handle returned by an event subscription, used to unsubscribe.
    SubscriptionId(u64)
}
