//! Append-only provenance store.
//!
//! [`ProvenanceManager`] owns the ordered collection of [`OperationEntry`]
//! records for one session. Entries are appended on successful execute/redo
//! and flagged reverted on undo; nothing is ever removed. The undo stack may
//! evict old commands, but their audit records stay here.
//!
//! Recording is best-effort from the command layer's point of view: a failed
//! append or a missed revert mark is reported on the diagnostic log and never
//! fails the command that triggered it.

use tracing::warn;

use crate::model::types::OpId;

use super::types::OperationEntry;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur while recording a provenance entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvenanceError {
    /// The entry carries no human-readable description.
    ///
    /// An audit record nobody can read is worse than a loud failure here;
    /// the caller logs the rejection and the command outcome stands.
    #[error("provenance entry `{op_id}` has a blank description")]
    BlankDescription {
        /// The id of the rejected entry.
        op_id: OpId,
    },
}

// ---------------------------------------------------------------------------
// ProvenanceManager
// ---------------------------------------------------------------------------

/// Owner of the append-only operation log for one session.
#[derive(Debug, Default)]
pub struct ProvenanceManager {
    entries: Vec<OperationEntry>,
}

impl ProvenanceManager {
    /// Create an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry to the log.
    ///
    /// Ids are not deduplicated: redo entries intentionally derive their id
    /// from an earlier entry's, and uniqueness is the caller's concern.
    ///
    /// # Errors
    /// Returns [`ProvenanceError::BlankDescription`] if the entry's
    /// description is empty or whitespace-only; the log is unchanged.
    pub fn record_operation(&mut self, entry: OperationEntry) -> Result<(), ProvenanceError> {
        if entry.description.trim().is_empty() {
            return Err(ProvenanceError::BlankDescription {
                op_id: entry.op_id.clone(),
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Flip `reverted` on the most recent non-reverted entry with this id.
    ///
    /// Returns whether a matching entry was found. A miss is logged as a
    /// warning and otherwise ignored — this is a best-effort audit
    /// annotation, not a transactional guarantee.
    pub fn mark_reverted(&mut self, op_id: &OpId) -> bool {
        for entry in self.entries.iter_mut().rev() {
            if &entry.op_id == op_id && !entry.reverted {
                entry.reverted = true;
                return true;
            }
        }
        warn!(op_id = %op_id, "no active provenance entry to mark reverted");
        false
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries flagged reverted.
    #[must_use]
    pub fn reverted_count(&self) -> usize {
        self.entries.iter().filter(|e| e.reverted).count()
    }

    /// Number of entries still standing (not reverted).
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.len() - self.reverted_count()
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[OperationEntry] {
        &self.entries
    }

    /// Entries filtered by their `reverted` flag, oldest first.
    pub fn entries_with_reverted(&self, reverted: bool) -> impl Iterator<Item = &OperationEntry> {
        self.entries.iter().filter(move |e| e.reverted == reverted)
    }

    /// Look up the most recent entry with this id, reverted or not.
    #[must_use]
    pub fn latest_entry(&self, op_id: &OpId) -> Option<&OperationEntry> {
        self.entries.iter().rev().find(|e| &e.op_id == op_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::super::types::OpPayload;
    use super::*;

    fn entry(id: &str, description: &str) -> OperationEntry {
        OperationEntry {
            op_id: OpId::new(id).unwrap(),
            timestamp: "2026-08-05T12:00:00Z".to_owned(),
            description: description.to_owned(),
            reverted: false,
            payload: OpPayload::AddSeries {
                series: "s".to_owned(),
                concentration: None,
            },
        }
    }

    #[test]
    fn record_appends_in_order() {
        let mut log = ProvenanceManager::new();
        log.record_operation(entry("op-1", "first")).unwrap();
        log.record_operation(entry("op-2", "second")).unwrap();

        assert_eq!(log.len(), 2);
        let ids: Vec<&str> = log.entries().iter().map(|e| e.op_id.as_str()).collect();
        assert_eq!(ids, vec!["op-1", "op-2"]);
    }

    #[test]
    fn record_rejects_blank_description() {
        let mut log = ProvenanceManager::new();
        let err = log.record_operation(entry("op-1", "   ")).unwrap_err();
        assert!(matches!(err, ProvenanceError::BlankDescription { .. }));
        assert!(log.is_empty());
    }

    #[test]
    fn duplicate_ids_are_not_deduplicated() {
        let mut log = ProvenanceManager::new();
        log.record_operation(entry("op-1", "first")).unwrap();
        log.record_operation(entry("op-1", "again")).unwrap();
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn mark_reverted_flips_most_recent_active_match() {
        let mut log = ProvenanceManager::new();
        log.record_operation(entry("op-1", "original")).unwrap();
        log.record_operation(entry("op-1", "replayed")).unwrap();

        assert!(log.mark_reverted(&OpId::new("op-1").unwrap()));
        // The newer entry flips, the older one stays active.
        assert!(log.entries()[1].reverted);
        assert!(!log.entries()[0].reverted);

        // A second mark hits the older entry.
        assert!(log.mark_reverted(&OpId::new("op-1").unwrap()));
        assert!(log.entries()[0].reverted);
    }

    #[test]
    fn mark_reverted_miss_returns_false() {
        let mut log = ProvenanceManager::new();
        log.record_operation(entry("op-1", "first")).unwrap();
        assert!(!log.mark_reverted(&OpId::new("op-9").unwrap()));
        assert!(!log.entries()[0].reverted);
    }

    #[test]
    fn mark_reverted_skips_already_reverted() {
        let mut log = ProvenanceManager::new();
        log.record_operation(entry("op-1", "only")).unwrap();
        assert!(log.mark_reverted(&OpId::new("op-1").unwrap()));
        assert!(!log.mark_reverted(&OpId::new("op-1").unwrap()));
    }

    #[test]
    fn counts_and_filters() {
        let mut log = ProvenanceManager::new();
        log.record_operation(entry("op-1", "a")).unwrap();
        log.record_operation(entry("op-2", "b")).unwrap();
        log.record_operation(entry("op-3", "c")).unwrap();
        log.mark_reverted(&OpId::new("op-2").unwrap());

        assert_eq!(log.len(), 3);
        assert_eq!(log.reverted_count(), 1);
        assert_eq!(log.active_count(), 2);

        let reverted: Vec<&str> = log
            .entries_with_reverted(true)
            .map(|e| e.op_id.as_str())
            .collect();
        assert_eq!(reverted, vec!["op-2"]);

        let active: Vec<&str> = log
            .entries_with_reverted(false)
            .map(|e| e.op_id.as_str())
            .collect();
        assert_eq!(active, vec!["op-1", "op-3"]);
    }

    #[test]
    fn latest_entry_prefers_newest() {
        let mut log = ProvenanceManager::new();
        log.record_operation(entry("op-1", "original")).unwrap();
        log.record_operation(entry("op-1", "replayed")).unwrap();
        let found = log.latest_entry(&OpId::new("op-1").unwrap()).unwrap();
        assert_eq!(found.description, "replayed");
    }
}
