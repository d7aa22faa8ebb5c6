//! Core identifier types for bindkit.
//!
//! Foundation types used throughout the crate: validated series names and
//! provenance operation identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SeriesName
// ---------------------------------------------------------------------------

/// A validated name for one concentration/time-response series.
///
/// Names are 1-64 characters, contain no control characters, and carry no
/// leading or trailing whitespace. They key the dataset's series map and
/// appear verbatim in provenance entries and history descriptions.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeriesName(String);

impl SeriesName {
    /// Create a new `SeriesName` from a string, validating format.
    ///
    /// # Errors
    /// Returns an error if the name is empty, longer than 64 characters,
    /// contains control characters, or has surrounding whitespace.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        Self::validate(s)?;
        Ok(Self(s.to_owned()))
    }

    /// Return the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), ValidationError> {
        if s.is_empty() {
            return Err(ValidationError {
                kind: ErrorKind::SeriesName,
                value: s.to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if s.chars().count() > 64 {
            return Err(ValidationError {
                kind: ErrorKind::SeriesName,
                value: s.to_owned(),
                reason: format!("expected at most 64 characters, got {}", s.chars().count()),
            });
        }
        if s.chars().any(char::is_control) {
            return Err(ValidationError {
                kind: ErrorKind::SeriesName,
                value: s.to_owned(),
                reason: "must not contain control characters".to_owned(),
            });
        }
        if s.trim() != s {
            return Err(ValidationError {
                kind: ErrorKind::SeriesName,
                value: s.to_owned(),
                reason: "must not have leading or trailing whitespace".to_owned(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for SeriesName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SeriesName {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for SeriesName {
    type Error = ValidationError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}

impl From<SeriesName> for String {
    fn from(name: SeriesName) -> Self {
        name.0
    }
}

// ---------------------------------------------------------------------------
// OpId
// ---------------------------------------------------------------------------

/// Identifier for one provenance entry.
///
/// Fresh ids are generated per command execution; replayed (redo) executions
/// derive a new id from the original via [`OpId::replay`], so every entry in
/// the log carries a distinct id even across repeated undo/redo cycles.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OpId(String);

impl OpId {
    /// Create an `OpId` from a string, validating format.
    ///
    /// # Errors
    /// Returns an error if the string is empty or contains whitespace or
    /// control characters.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        Self::validate(s)?;
        Ok(Self(s.to_owned()))
    }

    /// Generate a fresh random `OpId`.
    ///
    /// Uses the thread-local PRNG (rand 0.9). 64 bits of entropy rendered as
    /// lowercase hex; uniqueness within a session is the practical guarantee
    /// this needs.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("op-{:016x}", rand::random::<u64>()))
    }

    /// Derive the id for the `n`-th replay (redo) of this operation.
    ///
    /// The first replay appends `_redo`; later replays append `_redo2`,
    /// `_redo3`, … so repeated undo/redo cycles never collide.
    #[must_use]
    pub fn replay(&self, n: u32) -> Self {
        if n <= 1 {
            Self(format!("{}_redo", self.0))
        } else {
            Self(format!("{}_redo{n}", self.0))
        }
    }

    /// Return the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), ValidationError> {
        if s.is_empty() {
            return Err(ValidationError {
                kind: ErrorKind::OpId,
                value: s.to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValidationError {
                kind: ErrorKind::OpId,
                value: s.to_owned(),
                reason: "must not contain whitespace or control characters".to_owned(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OpId {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for OpId {
    type Error = ValidationError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}

impl From<OpId> for String {
    fn from(id: OpId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// Which identifier type failed validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// A series name.
    SeriesName,
    /// A provenance operation id.
    OpId,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SeriesName => write!(f, "series name"),
            Self::OpId => write!(f, "operation id"),
        }
    }
}

/// An identifier failed validation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} `{value}`: {reason}")]
pub struct ValidationError {
    /// Which identifier type was being validated.
    pub kind: ErrorKind,
    /// The raw value that failed.
    pub value: String,
    /// Why validation failed.
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
