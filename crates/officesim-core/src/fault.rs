//! Fault isolation for callbacks.
//!
//! Scheduled tasks, event listeners and collaborators are all foreign code
//! from the point of view of the tick loop. Each one runs through
//! [`isolate`], which turns both an `Err` return and a panic into a
//! [`Fault`] that the caller logs and moves past.

use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};

/// Error returned by a failing scheduled task.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TaskFault {
    /// What went wrong.
    pub message: String,
}

impl TaskFault {
    /// Build a fault from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Error returned by a failing event listener.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ListenerFault {
    /// What went wrong.
    pub message: String,
}

impl ListenerFault {
    /// Build a fault from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// How an isolated call failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    /// The callback returned an error.
    #[error("failed: {0}")]
    Failed(String),

    /// The callback panicked.
    #[error("panicked: {0}")]
    Panicked(String),
}

/// Run `f`, converting an error or a panic into a [`Fault`].
///
/// # Errors
///
/// Returns [`Fault::Failed`] when `f` returns `Err`, and
/// [`Fault::Panicked`] when it unwinds.
pub fn isolate<E, F>(f: F) -> Result<(), Fault>
where
    E: Display,
    F: FnOnce() -> Result<(), E>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(Fault::Failed(e.to_string())),
        Err(payload) => Err(Fault::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        return (*s).to_owned();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    String::from("non-string panic payload")
}
