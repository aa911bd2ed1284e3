//! Save data and save stores.
//!
//! A save captures the clock, recurring task records, complaint counters
//! and population size. Loading is tolerant: every field is optional, and
//! absent fields keep the running simulation's current values. Agent
//! positions are not saved; a restored office is repopulated fresh.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use officesim_agents::{AgentSimulator, ComplaintStats};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::time::{TimeController, TimeSnapshotPatch};

/// Version written into new saves.
pub const SAVE_VERSION: &str = "1.0.0";

/// Errors from reading or writing saves.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Reading or writing the backing file failed.
    #[error("save file I/O failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The save could not be encoded or decoded.
    #[error("save data is not valid JSON: {source}")]
    Json {
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// The save was written by an incompatible version.
    #[error("unsupported save version {found} (expected {SAVE_VERSION})")]
    UnsupportedVersion {
        /// Version found in the save.
        found: String,
    },
}

impl From<serde_json::Error> for PersistenceError {
    fn from(source: serde_json::Error) -> Self {
        Self::Json { source }
    }
}

/// Everything written to a save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveData {
    /// Format version.
    #[serde(default = "default_version")]
    pub version: String,

    /// When the save was written.
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,

    /// Clock and recurring task records.
    #[serde(default)]
    pub time: TimeSnapshotPatch,

    /// Complaint counters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complaint_stats: Option<ComplaintStats>,

    /// Population size at save time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_count: Option<usize>,
}

impl SaveData {
    /// Capture the current state.
    pub fn capture(time: &TimeController, agents: &AgentSimulator) -> Self {
        Self {
            version: SAVE_VERSION.to_owned(),
            saved_at: Some(Utc::now()),
            time: time.serialize().into(),
            complaint_stats: Some(agents.complaint_stats().clone()),
            agent_count: Some(agents.agents().len()),
        }
    }

    /// Check that the save can be applied by this version.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::UnsupportedVersion`] when the major
    /// version differs.
    pub fn check_version(&self) -> Result<(), PersistenceError> {
        let major = |v: &str| v.split('.').next().map(str::to_owned);
        if major(&self.version) == major(SAVE_VERSION) {
            Ok(())
        } else {
            Err(PersistenceError::UnsupportedVersion {
                found: self.version.clone(),
            })
        }
    }

    /// Apply the save. Fields that are absent leave current state alone.
    ///
    /// Recurring task records only reach tasks that are already registered,
    /// so collaborators should integrate before a save is applied.
    pub fn apply(&self, time: &mut TimeController, agents: &mut AgentSimulator) {
        time.deserialize(&self.time);
        if let Some(stats) = &self.complaint_stats {
            agents.restore_complaint_stats(stats.clone());
        }
        if let Some(count) = self.agent_count {
            let placed = agents.reset_population(count);
            debug!(requested = count, placed, "population restored");
        }
        info!(
            version = self.version.as_str(),
            saved_at = ?self.saved_at,
            "save applied"
        );
    }
}

fn default_version() -> String {
    SAVE_VERSION.to_owned()
}

/// Somewhere a save can be kept.
pub trait SaveStore {
    /// Replace the stored save.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the save cannot be written.
    fn save(&mut self, data: &SaveData) -> Result<(), PersistenceError>;

    /// Read the stored save, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if a save exists but cannot be read
    /// or decoded.
    fn load(&self) -> Result<Option<SaveData>, PersistenceError>;

    /// Delete the stored save.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if the save exists but cannot be removed.
    fn clear(&mut self) -> Result<(), PersistenceError>;
}

/// A save kept as pretty-printed JSON on disk.
///
/// Writes go to a sibling temporary file that is then renamed over the
/// target, so a crash mid-write leaves the previous save intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store saves at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Target path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SaveStore for JsonFileStore {
    fn save(&mut self, data: &SaveData) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(data)?;
        let temp = self.temp_path();
        std::fs::write(&temp, json)?;
        std::fs::rename(&temp, &self.path)?;
        debug!(path = %self.path.display(), "save written");
        Ok(())
    }

    fn load(&self) -> Result<Option<SaveData>, PersistenceError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let data: SaveData = serde_json::from_str(&contents)?;
        data.check_version()?;
        Ok(Some(data))
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// A save kept in memory as encoded JSON, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Option<String>,
    writes: u64,
}

impl MemoryStore {
    /// An empty store.
    pub const fn new() -> Self {
        Self {
            slot: None,
            writes: 0,
        }
    }

    /// Number of successful saves.
    pub const fn writes(&self) -> u64 {
        self.writes
    }

    /// The raw stored JSON.
    pub fn raw(&self) -> Option<&str> {
        self.slot.as_deref()
    }
}

impl SaveStore for MemoryStore {
    fn save(&mut self, data: &SaveData) -> Result<(), PersistenceError> {
        self.slot = Some(serde_json::to_string(data)?);
        self.writes = self.writes.saturating_add(1);
        Ok(())
    }

    fn load(&self) -> Result<Option<SaveData>, PersistenceError> {
        let Some(raw) = &self.slot else {
            return Ok(None);
        };
        let data: SaveData = serde_json::from_str(raw)?;
        data.check_version()?;
        Ok(Some(data))
    }

    fn clear(&mut self) -> Result<(), PersistenceError> {
        self.slot = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use officesim_agents::{BehaviorConfig, ComplaintConfig};
    use officesim_types::ComplaintCategory;
    use officesim_world::OfficeLayout;

    use super::*;

    fn office(agents: usize) -> AgentSimulator {
        let layout = OfficeLayout::standard(900.0, 560.0).unwrap();
        let mut sim = AgentSimulator::new(
            layout,
            BehaviorConfig::default(),
            ComplaintConfig::default(),
            11,
        );
        sim.reset_population(agents);
        sim
    }

    #[test]
    fn capture_then_apply_restores_clock_and_population() {
        let mut time = TimeController::new();
        time.install_builtin_tasks(5.0, 30.0).unwrap();
        time.set_time_scale(2.0);
        time.tick(20.0);
        let agents = office(6);
        let data = SaveData::capture(&time, &agents);
        assert_eq!(data.agent_count, Some(6));

        let mut store = MemoryStore::new();
        store.save(&data).unwrap();
        let loaded = store.load().unwrap().unwrap();

        let mut fresh_time = TimeController::new();
        fresh_time.install_builtin_tasks(5.0, 30.0).unwrap();
        let mut fresh_agents = office(2);
        loaded.apply(&mut fresh_time, &mut fresh_agents);
        assert_eq!(fresh_time.game_time(), 40.0);
        assert_eq!(fresh_time.time_scale(), 2.0);
        assert_eq!(fresh_agents.agents().len(), 6);
        assert!(fresh_agents.desk_invariant_holds());
        assert_eq!(fresh_time.recurring_stats(), time.recurring_stats());
    }

    #[test]
    fn partial_save_keeps_current_values() {
        let raw = r#"{ "version": "1.0.0", "time": { "gameTime": 90.0 } }"#;
        let data: SaveData = serde_json::from_str(raw).unwrap();
        let mut time = TimeController::new();
        time.set_time_scale(3.0);
        let mut agents = office(4);
        data.apply(&mut time, &mut agents);
        assert_eq!(time.game_time(), 90.0);
        assert_eq!(time.time_scale(), 3.0);
        assert_eq!(agents.agents().len(), 4);
    }

    #[test]
    fn complaint_counters_survive_a_save() {
        let mut agents = office(0);
        let mut stats = ComplaintStats::default();
        stats.record(ComplaintCategory::Printer);
        stats.record(ComplaintCategory::Printer);
        agents.restore_complaint_stats(stats.clone());

        let data = SaveData::capture(&TimeController::new(), &agents);
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["complaintStats"]["counts"]["printer"], serde_json::json!(2));

        let mut other = office(0);
        data.apply(&mut TimeController::new(), &mut other);
        assert_eq!(other.complaint_stats(), &stats);
    }

    #[test]
    fn other_major_versions_are_rejected() {
        let mut store = MemoryStore::new();
        let mut data = SaveData::capture(&TimeController::new(), &office(0));
        data.version = String::from("2.0.0");
        store.save(&data).unwrap();
        assert!(matches!(
            store.load(),
            Err(PersistenceError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = std::env::temp_dir().join(format!("officesim-save-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut store = JsonFileStore::new(dir.join("save.json"));
        assert!(store.load().unwrap().is_none());

        let data = SaveData::capture(&TimeController::new(), &office(3));
        store.save(&data).unwrap();
        assert_eq!(store.load().unwrap(), Some(data));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn garbage_is_a_json_error() {
        let dir = std::env::temp_dir().join(format!("officesim-garbage-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("save.json");
        std::fs::write(&path, "not json").unwrap();
        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(PersistenceError::Json { .. })));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
