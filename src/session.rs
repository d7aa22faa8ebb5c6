//! A curation session: one dataset plus its mutation history.
//!
//! [`CurationSession`] is the aggregate the interactive surface drives. It
//! owns the dataset and the command manager, wires them together on every
//! `apply`/`undo`/`redo`, and handles dataset load/save. Sessions are
//! explicitly constructed values — two sessions share nothing.

use std::io::Write as IoWrite;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::history::command::{Command, CommandError};
use crate::history::manager::CommandManager;
use crate::model::dataset::Dataset;
use crate::oplog::provenance::ProvenanceManager;

// ---------------------------------------------------------------------------
// SessionStats
// ---------------------------------------------------------------------------

/// Summary counters for history UIs and session reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Total provenance entries recorded (originals and replays).
    pub recorded: usize,
    /// Entries currently flagged reverted.
    pub reverted: usize,
    /// Entries still standing.
    pub active: usize,
    /// Commands currently undoable.
    pub undo_depth: usize,
    /// Commands currently redoable.
    pub redo_depth: usize,
}

// ---------------------------------------------------------------------------
// CurationSession
// ---------------------------------------------------------------------------

/// One interactive editing session over one dataset.
pub struct CurationSession {
    dataset: Dataset,
    history: CommandManager,
}

impl CurationSession {
    /// Create a session over an existing dataset.
    #[must_use]
    pub const fn new(dataset: Dataset, max_history: usize) -> Self {
        Self {
            dataset,
            history: CommandManager::new(max_history, ProvenanceManager::new()),
        }
    }

    /// Load a dataset from a JSON file and open a session over it.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path, max_history: usize) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read dataset file {}", path.display()))?;
        let dataset: Dataset = serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse dataset file {}", path.display()))?;
        Ok(Self::new(dataset, max_history))
    }

    /// Save the dataset as pretty JSON, atomically.
    ///
    /// Writes to a temp file in the target directory and persists it over
    /// the destination, so a crash mid-write never truncates the dataset.
    ///
    /// # Errors
    /// Returns an error if serialization or any filesystem step fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(&self.dataset).context("failed to serialize dataset")?;
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = tempfile::NamedTempFile::new_in(dir.unwrap_or_else(|| Path::new(".")))
            .context("failed to create temp file for save")?;
        tmp.write_all(&json).context("failed to write dataset")?;
        tmp.write_all(b"\n").context("failed to write dataset")?;
        tmp.persist(path)
            .with_context(|| format!("failed to persist dataset to {}", path.display()))?;
        Ok(())
    }

    /// Execute a command. See [`CommandManager::execute`].
    pub fn apply(&mut self, command: Box<dyn Command>) -> bool {
        self.history.execute(command, &mut self.dataset)
    }

    /// Undo the most recent command. See [`CommandManager::undo`].
    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.dataset)
    }

    /// Redo the most recently undone command. See [`CommandManager::redo`].
    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.dataset)
    }

    /// The dataset under curation.
    #[must_use]
    pub const fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Mutable access to the dataset, bypassing history.
    ///
    /// For collaborators that edit outside the undo system (imports,
    /// fitting-kernel writebacks). Such edits are invisible to undo and may
    /// make pending undos fail — which the manager reports, not panics.
    pub const fn dataset_mut(&mut self) -> &mut Dataset {
        &mut self.dataset
    }

    /// The session's history controller.
    #[must_use]
    pub const fn history(&self) -> &CommandManager {
        &self.history
    }

    /// Mutable access to the history controller (clearing, etc.).
    pub const fn history_mut(&mut self) -> &mut CommandManager {
        &mut self.history
    }

    /// The error from the most recent failed apply/undo/redo, if any.
    #[must_use]
    pub const fn last_error(&self) -> Option<&CommandError> {
        self.history.last_error()
    }

    /// Summary counters over the history and provenance state.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        let provenance = self.history.provenance();
        SessionStats {
            recorded: provenance.len(),
            reverted: provenance.reverted_count(),
            active: provenance.active_count(),
            undo_depth: self.history.undo_depth(),
            redo_depth: self.history.redo_depth(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::edits::{AddPoint, AddSeries};
    use crate::model::types::SeriesName;

    fn name(s: &str) -> SeriesName {
        SeriesName::new(s).unwrap()
    }

    #[test]
    fn apply_undo_redo_round_trip() {
        let mut session = CurationSession::new(Dataset::new("t"), 10);

        assert!(session.apply(Box::new(AddSeries::new(name("a"), None))));
        assert!(session.apply(Box::new(AddPoint::new(name("a"), 1.0, 2.0))));
        let after_edits = session.dataset().clone();

        assert!(session.undo());
        assert!(session.undo());
        assert!(session.dataset().is_empty());

        assert!(session.redo());
        assert!(session.redo());
        assert_eq!(session.dataset(), &after_edits);
    }

    #[test]
    fn stats_track_history_and_provenance() {
        let mut session = CurationSession::new(Dataset::new("t"), 10);
        session.apply(Box::new(AddSeries::new(name("a"), None)));
        session.apply(Box::new(AddSeries::new(name("b"), None)));
        session.undo();

        let stats = session.stats();
        assert_eq!(stats.recorded, 2);
        assert_eq!(stats.reverted, 1);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.undo_depth, 1);
        assert_eq!(stats.redo_depth, 1);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.json");

        let mut session = CurationSession::new(Dataset::new("surface A"), 10);
        session.apply(Box::new(AddSeries::new(name("40 nM"), Some(4e-8))));
        session.apply(Box::new(AddPoint::new(name("40 nM"), 0.0, 0.3)));
        session.save(&path).unwrap();

        let reloaded = CurationSession::load(&path, 10).unwrap();
        assert_eq!(reloaded.dataset(), session.dataset());
        // History does not survive a reload; provenance is per-session.
        assert!(!reloaded.history().can_undo());
        assert_eq!(reloaded.stats().recorded, 0);
    }

    #[test]
    fn load_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{ not json").unwrap();
        assert!(CurationSession::load(&path, 10).is_err());
    }

    #[test]
    fn out_of_band_edit_makes_undo_fail_then_retry_succeeds() {
        let mut session = CurationSession::new(Dataset::new("t"), 10);
        session.apply(Box::new(AddSeries::new(name("a"), None)));

        // An external path removes the series; the pending undo now fails.
        session.dataset_mut().remove_series(&name("a")).unwrap();
        assert!(!session.undo());
        assert!(session.last_error().is_some());
        assert!(session.history().can_undo(), "command restored for retry");

        // Once the series is back, the same undo succeeds.
        session.dataset_mut().add_series(name("a"), None).unwrap();
        assert!(session.undo());
        assert!(session.dataset().is_empty());
    }
}
