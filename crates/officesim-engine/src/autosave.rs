//! Autosave collaborator.
//!
//! Listens for `autosave_reminder` and writes a save on the next update.
//! The reminder is published inside the clock's tick, before collaborators
//! run, so the save lands in the same tick as the reminder.

use std::cell::Cell;
use std::rc::Rc;

use officesim_core::{SaveData, SaveStore, Subsystem, SubsystemContext, SubsystemError, Topic};
use tracing::{debug, info};

/// Writes saves when the clock asks for one.
pub struct Autosave {
    store: Box<dyn SaveStore>,
    requested: Rc<Cell<bool>>,
    integrated: bool,
    saves: u64,
}

impl std::fmt::Debug for Autosave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Autosave")
            .field("requested", &self.requested.get())
            .field("integrated", &self.integrated)
            .field("saves", &self.saves)
            .finish_non_exhaustive()
    }
}

impl Autosave {
    /// Autosave into `store`.
    pub fn new(store: Box<dyn SaveStore>) -> Self {
        Self {
            store,
            requested: Rc::new(Cell::new(false)),
            integrated: false,
            saves: 0,
        }
    }
}

impl Subsystem for Autosave {
    fn name(&self) -> &str {
        "autosave"
    }

    fn update(
        &mut self,
        ctx: &mut SubsystemContext<'_>,
        _game_delta: f64,
    ) -> Result<(), SubsystemError> {
        if !self.integrated {
            let requested = Rc::clone(&self.requested);
            ctx.time
                .subscribe(Topic::AutosaveReminder, "autosave", move |_| {
                    requested.set(true);
                    Ok(())
                });
            self.integrated = true;
            debug!("autosave integrated");
        }

        if !self.requested.replace(false) {
            return Ok(());
        }
        let data = SaveData::capture(ctx.time, ctx.agents);
        self.store.save(&data)?;
        self.saves = self.saves.saturating_add(1);
        info!(
            game_time = ctx.time.game_time(),
            saves = self.saves,
            "autosave written"
        );
        Ok(())
    }
}
