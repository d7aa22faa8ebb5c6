//! The reversible-command capability.
//!
//! A [`Command`] is one self-contained, reversible unit of mutation against
//! the dataset. Concrete variants live in [`super::edits`]; the manager in
//! [`super::manager`] is the only caller of `execute`/`undo` and passes the
//! dataset in on every call, so a command never holds a reference to the
//! store it mutates.

use crate::model::dataset::{Dataset, ModelError};
use crate::model::types::OpId;
use crate::oplog::types::OperationEntry;

// ---------------------------------------------------------------------------
// CommandError
// ---------------------------------------------------------------------------

/// A command could not be applied or reversed.
///
/// Precondition failures leave the dataset unchanged. Reversal failures mean
/// the state drifted underneath the command (e.g. the series it added was
/// removed by another path); the manager restores its stack invariant and
/// reports the error, and a later retry may succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// `execute` preconditions were not met.
    #[error("cannot {action}: {source}")]
    Apply {
        /// The command description.
        action: String,
        /// The underlying model rejection.
        source: ModelError,
    },

    /// `undo` could not reverse the command's effect.
    #[error("cannot reverse `{action}`: {source}")]
    Revert {
        /// The command description.
        action: String,
        /// The underlying model rejection.
        source: ModelError,
    },

    /// `undo` was called with no captured state from a prior `execute`.
    #[error("cannot reverse `{action}`: no state captured from a prior apply")]
    MissingSnapshot {
        /// The command description.
        action: String,
    },
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// One reversible unit of dataset mutation.
///
/// Contract (enforced by the manager's call discipline, not by this trait):
///
/// - `execute` is never called twice without an intervening successful
///   `undo`; on error it must leave the dataset unchanged.
/// - `undo` restores the dataset to the state it had immediately before the
///   most recent successful `execute`. On error it must leave its own
///   captured state intact so a retry can succeed.
/// - `description` must not mutate anything; it is shown in history UIs and
///   recorded verbatim in provenance entries.
/// - `to_operation` is called once per successful `execute` or redo, with
///   the id the manager assigned to that execution.
pub trait Command {
    /// Apply the mutation.
    ///
    /// # Errors
    /// Returns [`CommandError::Apply`] if preconditions fail; the dataset is
    /// left unchanged.
    fn execute(&mut self, dataset: &mut Dataset) -> Result<(), CommandError>;

    /// Reverse the most recent successful `execute`.
    ///
    /// # Errors
    /// Returns [`CommandError::Revert`] or [`CommandError::MissingSnapshot`]
    /// if reversal is impossible.
    fn undo(&mut self, dataset: &mut Dataset) -> Result<(), CommandError>;

    /// Stable, human-readable summary of this command.
    fn description(&self) -> String;

    /// Build the provenance entry for the execution the given id names.
    fn to_operation(&self, op_id: OpId) -> OperationEntry;
}
