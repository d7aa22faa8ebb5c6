//! bindkit data model — identifiers and the mutable dataset store.

pub mod dataset;
pub mod types;
