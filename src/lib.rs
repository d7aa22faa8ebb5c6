//! bindkit library crate — re-exports for integration tests.
//!
//! The primary interface is the `bindkit` binary. This lib.rs exposes the
//! modules so that integration tests can exercise the command history,
//! provenance log, data model, and editor loop directly without going
//! through the CLI.

pub mod config;
pub mod edit;
pub mod format;
pub mod history;
pub mod model;
pub mod oplog;
pub mod session;
pub mod telemetry;
