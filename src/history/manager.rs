//! Undo/redo stack controller.
//!
//! [`CommandManager`] orchestrates command execution, undo, redo, and history
//! bookkeeping. It is the sole writer of the two stacks and the sole caller
//! into the provenance log for command-triggered events.
//!
//! Invariants held after every public operation:
//!
//! 1. `undo_stack.len() <= max_history` (oldest evicted silently on overflow;
//!    eviction never touches provenance — the log outlives the stacks).
//! 2. Executing any command empties the redo stack (linear history).
//! 3. A command lives in at most one stack at a time.
//! 4. Every command that reached the undo stack has a provenance entry,
//!    unless the log rejected the write — which is reported on the
//!    diagnostic log and never fails the command.
//! 5. An entry's `reverted` flag is true iff that execution's last recorded
//!    transition was an undo not followed by a redo.
//!
//! Single-writer by design: no internal locking; callers on other threads
//! must marshal onto the owning thread or wrap the manager in their own
//! mutual exclusion.

use tracing::{debug, warn};

use crate::model::dataset::Dataset;
use crate::model::types::OpId;
use crate::oplog::provenance::ProvenanceManager;

use super::command::{Command, CommandError};

// ---------------------------------------------------------------------------
// TrackedCommand
// ---------------------------------------------------------------------------

/// A command plus the identity bookkeeping the manager owns for it.
///
/// The manager, not the command, tracks which execution of the command the
/// newest provenance entry describes: `replays == 0` means the original
/// execution, `replays == n` the n-th redo.
struct TrackedCommand {
    command: Box<dyn Command>,
    op_id: OpId,
    replays: u32,
}

impl TrackedCommand {
    /// The id of this command's most recent recorded execution.
    fn current_op_id(&self) -> OpId {
        if self.replays == 0 {
            self.op_id.clone()
        } else {
            self.op_id.replay(self.replays)
        }
    }
}

// ---------------------------------------------------------------------------
// CommandManager
// ---------------------------------------------------------------------------

/// Bounded undo/redo controller with an audit trail.
///
/// Explicitly constructed and explicitly passed — one per session, no
/// globals — so multiple sessions can coexist without shared mutable state.
pub struct CommandManager {
    undo_stack: Vec<TrackedCommand>,
    redo_stack: Vec<TrackedCommand>,
    max_history: usize,
    provenance: ProvenanceManager,
    last_error: Option<CommandError>,
}

impl CommandManager {
    /// Create a manager with the given history bound and provenance store.
    #[must_use]
    pub const fn new(max_history: usize, provenance: ProvenanceManager) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_history,
            provenance,
            last_error: None,
        }
    }

    /// Execute a command against the dataset.
    ///
    /// On success: the redo stack is cleared, the command joins the undo
    /// stack (evicting the oldest entry past `max_history`), and a
    /// provenance entry is recorded best-effort. On failure: nothing
    /// changes, and the error is available via [`Self::last_error`].
    pub fn execute(&mut self, mut command: Box<dyn Command>, dataset: &mut Dataset) -> bool {
        if let Err(err) = command.execute(dataset) {
            self.last_error = Some(err);
            return false;
        }
        self.last_error = None;
        self.redo_stack.clear();

        let tracked = TrackedCommand {
            op_id: OpId::generate(),
            replays: 0,
            command,
        };
        self.record(&tracked);
        self.undo_stack.push(tracked);
        self.trim_history();
        true
    }

    /// Undo the most recent command.
    ///
    /// On success the command moves to the redo stack and its provenance
    /// entry is flagged reverted (best-effort). On failure the command is
    /// restored to the undo stack — a later retry may succeed — and the
    /// error is available via [`Self::last_error`]. Returns `false` with no
    /// effect if there is nothing to undo.
    pub fn undo(&mut self, dataset: &mut Dataset) -> bool {
        let Some(mut tracked) = self.undo_stack.pop() else {
            return false;
        };
        match tracked.command.undo(dataset) {
            Ok(()) => {
                self.last_error = None;
                // mark_reverted logs its own warning on a miss.
                self.provenance.mark_reverted(&tracked.current_op_id());
                self.redo_stack.push(tracked);
                true
            }
            Err(err) => {
                self.undo_stack.push(tracked);
                self.last_error = Some(err);
                false
            }
        }
    }

    /// Redo the most recently undone command.
    ///
    /// On success the command rejoins the undo stack and a new provenance
    /// entry is recorded under a replay-derived id — the original entry is
    /// untouched, so original execution and replay stay distinguishable in
    /// the audit trail. Returns `false` with no effect if there is nothing
    /// to redo; on failure the command is restored to the redo stack.
    pub fn redo(&mut self, dataset: &mut Dataset) -> bool {
        let Some(mut tracked) = self.redo_stack.pop() else {
            return false;
        };
        match tracked.command.execute(dataset) {
            Ok(()) => {
                self.last_error = None;
                tracked.replays += 1;
                self.record(&tracked);
                self.undo_stack.push(tracked);
                self.trim_history();
                true
            }
            Err(err) => {
                self.redo_stack.push(tracked);
                self.last_error = Some(err);
                false
            }
        }
    }

    /// Whether there is anything to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether there is anything to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Description of the command `undo` would reverse, if any.
    #[must_use]
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.last().map(|t| t.command.description())
    }

    /// Description of the command `redo` would replay, if any.
    #[must_use]
    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(|t| t.command.description())
    }

    /// Descriptions of the undo stack, oldest first.
    ///
    /// Lazy and restartable — call again for a fresh pass.
    pub fn history(&self) -> impl Iterator<Item = String> + '_ {
        self.undo_stack.iter().map(|t| t.command.description())
    }

    /// Empty both stacks. The provenance log is untouched.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.last_error = None;
    }

    /// The error from the most recent failed operation, if the operation
    /// after it hasn't succeeded since.
    #[must_use]
    pub const fn last_error(&self) -> Option<&CommandError> {
        self.last_error.as_ref()
    }

    /// The configured history bound.
    #[must_use]
    pub const fn max_history(&self) -> usize {
        self.max_history
    }

    /// Current undo stack depth.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Current redo stack depth.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// The session's provenance log.
    #[must_use]
    pub const fn provenance(&self) -> &ProvenanceManager {
        &self.provenance
    }

    /// Record a provenance entry for the tracked command's newest execution.
    ///
    /// A rejected write is reported on the diagnostic log only — the
    /// command's effect on the dataset stands regardless.
    fn record(&mut self, tracked: &TrackedCommand) {
        let entry = tracked.command.to_operation(tracked.current_op_id());
        if let Err(err) = self.provenance.record_operation(entry) {
            warn!(op_id = %tracked.current_op_id(), error = %err, "provenance record failed");
        }
    }

    fn trim_history(&mut self) {
        while self.undo_stack.len() > self.max_history {
            let evicted = self.undo_stack.remove(0);
            debug!(
                op_id = %evicted.op_id,
                "evicted oldest command from bounded undo history"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
