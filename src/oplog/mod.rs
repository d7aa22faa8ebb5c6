//! Per-session provenance (audit) log.
//!
//! Every committed dataset mutation is recorded as an [`types::OperationEntry`]
//! in an append-only store owned by [`provenance::ProvenanceManager`]. Undo
//! flags the matching entry reverted; redo appends a fresh entry with a
//! derived id. The log is the durable record of everything that ever
//! happened in a session, independent of the bounded undo stack.
//!
//! # Modules
//!
//! - [`types`] — [`types::OperationEntry`] and [`types::OpPayload`] with canonical JSON
//! - [`provenance`] — the append-only [`provenance::ProvenanceManager`] store

pub mod provenance;
pub mod types;
