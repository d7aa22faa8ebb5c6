//! `OperationEntry` struct and `OpPayload` enum — canonical JSON for audit digests.
//!
//! Entries are the fundamental unit of the provenance log. Each entry records
//! a single dataset mutation (add series, remove, rename, set attribute, add
//! point, mask point) with enough detail for an auditor to reconstruct what
//! changed and whether it was later reverted.
//!
//! Canonical JSON rules:
//! - Sorted keys where maps appear (`BTreeMap` in the payload)
//! - No trailing whitespace
//! - Deterministic: serialize twice → identical bytes

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::model::dataset::AttrValue;
use crate::model::types::OpId;

// ---------------------------------------------------------------------------
// OperationEntry
// ---------------------------------------------------------------------------

/// A single entry in the provenance log.
///
/// Entries are immutable once recorded, with one exception: `reverted` flips
/// to `true` when the matching command is undone. Nothing is ever deleted
/// from the log — bounded undo history evicts commands, not audit records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperationEntry {
    /// Unique id for this entry. Replayed (redo) executions derive a new id
    /// from the original, so original and replay are distinguishable.
    pub op_id: OpId,

    /// ISO 8601 timestamp (UTC) of when the entry was created.
    ///
    /// Stored as a string for canonical JSON (avoids platform-specific
    /// floating-point or integer timestamp representations).
    pub timestamp: String,

    /// Human-readable summary, identical to the command's description.
    pub description: String,

    /// Whether the recorded mutation was later undone (and not redone).
    pub reverted: bool,

    /// The mutation this entry represents.
    pub payload: OpPayload,
}

// ---------------------------------------------------------------------------
// OpPayload
// ---------------------------------------------------------------------------

/// The kind of mutation recorded by an [`OperationEntry`].
///
/// Each variant captures what changed, including old values where a reader
/// would otherwise be unable to tell what the mutation replaced. Serialized
/// with a `"type"` tag: `{"type":"add_series","series":"…"}` etc.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpPayload {
    /// A series was added to the dataset.
    AddSeries {
        /// The new series name.
        series: String,
        /// Analyte concentration, if provided.
        concentration: Option<f64>,
    },

    /// A series was removed, points and all.
    RemoveSeries {
        /// The removed series name.
        series: String,
        /// How many points were removed with it.
        points: usize,
    },

    /// A series was renamed.
    RenameSeries {
        /// The old name.
        from: String,
        /// The new name.
        to: String,
    },

    /// A metadata attribute was set on a series.
    SetAttribute {
        /// The series that was modified.
        series: String,
        /// The attribute key.
        key: String,
        /// The value the attribute had before, if any.
        old: Option<AttrValue>,
        /// The value that was set.
        new: AttrValue,
    },

    /// An observation was appended to a series.
    AddPoint {
        /// The series that was extended.
        series: String,
        /// Time of the observation.
        time: f64,
        /// Measured response.
        response: f64,
    },

    /// A point's fitting-mask flag was changed.
    SetPointMask {
        /// The series that was modified.
        series: String,
        /// Index of the point within the series.
        index: usize,
        /// The flag that was set.
        masked: bool,
        /// The flag's prior value.
        was_masked: bool,
    },
}

// ---------------------------------------------------------------------------
// Canonical JSON helpers
// ---------------------------------------------------------------------------

impl OperationEntry {
    /// Create a new, non-reverted entry stamped with the current UTC time.
    #[must_use]
    pub fn new(op_id: OpId, description: String, payload: OpPayload) -> Self {
        Self {
            op_id,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            description,
            reverted: false,
            payload,
        }
    }

    /// Serialize this entry to canonical JSON bytes.
    ///
    /// Canonical JSON: struct fields in declaration order, map keys sorted,
    /// deterministic. Two calls on the same entry produce identical bytes.
    ///
    /// # Errors
    /// Returns an error if serialization fails (shouldn't happen for valid entries).
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize an entry from JSON bytes.
    ///
    /// # Errors
    /// Returns an error if the bytes are not valid JSON or don't match the schema.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// SHA-256 digest of the canonical JSON, as lowercase hex.
    ///
    /// Shown in audit views so two entries can be compared at a glance; not
    /// used for lookup.
    ///
    /// # Errors
    /// Returns an error if canonical serialization fails.
    pub fn digest(&self) -> Result<String, serde_json::Error> {
        let bytes = self.to_canonical_json()?;
        let hash = Sha256::digest(&bytes);
        Ok(format!("{hash:x}"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn op_id(s: &str) -> OpId {
        OpId::new(s).unwrap()
    }

    fn entry(payload: OpPayload) -> OperationEntry {
        OperationEntry {
            op_id: op_id("op-0123456789abcdef"),
            timestamp: "2026-08-05T12:00:00Z".to_owned(),
            description: "test entry".to_owned(),
            reverted: false,
            payload,
        }
    }

    // -----------------------------------------------------------------------
    // OpPayload variant serialization round-trips
    // -----------------------------------------------------------------------

    #[test]
    fn add_series_round_trip() {
        let e = entry(OpPayload::AddSeries {
            series: "40 nM".to_owned(),
            concentration: Some(4e-8),
        });
        let json = e.to_canonical_json().unwrap();
        let parsed = OperationEntry::from_json(&json).unwrap();
        assert_eq!(e, parsed);
    }

    #[test]
    fn remove_series_round_trip() {
        let e = entry(OpPayload::RemoveSeries {
            series: "blank".to_owned(),
            points: 120,
        });
        let json = e.to_canonical_json().unwrap();
        let parsed = OperationEntry::from_json(&json).unwrap();
        assert_eq!(e, parsed);
    }

    #[test]
    fn rename_series_round_trip() {
        let e = entry(OpPayload::RenameSeries {
            from: "run 1".to_owned(),
            to: "run 1 (repeat)".to_owned(),
        });
        let json = e.to_canonical_json().unwrap();
        let parsed = OperationEntry::from_json(&json).unwrap();
        assert_eq!(e, parsed);
    }

    #[test]
    fn set_attribute_round_trip() {
        let e = entry(OpPayload::SetAttribute {
            series: "run 1".to_owned(),
            key: "ligand".to_owned(),
            old: Some(AttrValue::Text("thrombin".to_owned())),
            new: AttrValue::Text("heparin".to_owned()),
        });
        let json = e.to_canonical_json().unwrap();
        let parsed = OperationEntry::from_json(&json).unwrap();
        assert_eq!(e, parsed);
    }

    #[test]
    fn add_point_round_trip() {
        let e = entry(OpPayload::AddPoint {
            series: "run 1".to_owned(),
            time: 12.5,
            response: 103.7,
        });
        let json = e.to_canonical_json().unwrap();
        let parsed = OperationEntry::from_json(&json).unwrap();
        assert_eq!(e, parsed);
    }

    #[test]
    fn set_point_mask_round_trip() {
        let e = entry(OpPayload::SetPointMask {
            series: "run 1".to_owned(),
            index: 42,
            masked: true,
            was_masked: false,
        });
        let json = e.to_canonical_json().unwrap();
        let parsed = OperationEntry::from_json(&json).unwrap();
        assert_eq!(e, parsed);
    }

    // -----------------------------------------------------------------------
    // Canonical JSON determinism + digests
    // -----------------------------------------------------------------------

    #[test]
    fn canonical_json_is_deterministic() {
        let e = entry(OpPayload::SetAttribute {
            series: "run 1".to_owned(),
            key: "temp".to_owned(),
            old: None,
            new: AttrValue::Number(298.15),
        });
        assert_eq!(
            e.to_canonical_json().unwrap(),
            e.to_canonical_json().unwrap()
        );
    }

    #[test]
    fn digest_is_stable_and_hex() {
        let e = entry(OpPayload::RemoveSeries {
            series: "blank".to_owned(),
            points: 3,
        });
        let d1 = e.digest().unwrap();
        let d2 = e.digest().unwrap();
        assert_eq!(d1, d2);
        assert_eq!(d1.len(), 64);
        assert!(d1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn digest_changes_with_reverted_flag() {
        let e = entry(OpPayload::RemoveSeries {
            series: "blank".to_owned(),
            points: 3,
        });
        let mut flipped = e.clone();
        flipped.reverted = true;
        assert_ne!(e.digest().unwrap(), flipped.digest().unwrap());
    }

    // -----------------------------------------------------------------------
    // Payload type tags
    // -----------------------------------------------------------------------

    #[test]
    fn payload_type_tags() {
        let cases = [
            (
                OpPayload::AddSeries {
                    series: "s".to_owned(),
                    concentration: None,
                },
                "add_series",
            ),
            (
                OpPayload::RemoveSeries {
                    series: "s".to_owned(),
                    points: 0,
                },
                "remove_series",
            ),
            (
                OpPayload::RenameSeries {
                    from: "a".to_owned(),
                    to: "b".to_owned(),
                },
                "rename_series",
            ),
            (
                OpPayload::SetAttribute {
                    series: "s".to_owned(),
                    key: "k".to_owned(),
                    old: None,
                    new: AttrValue::Flag(true),
                },
                "set_attribute",
            ),
            (
                OpPayload::AddPoint {
                    series: "s".to_owned(),
                    time: 0.0,
                    response: 0.0,
                },
                "add_point",
            ),
            (
                OpPayload::SetPointMask {
                    series: "s".to_owned(),
                    index: 0,
                    masked: true,
                    was_masked: false,
                },
                "set_point_mask",
            ),
        ];
        for (payload, tag) in cases {
            let json = String::from_utf8(entry(payload).to_canonical_json().unwrap()).unwrap();
            assert!(
                json.contains(&format!("\"type\":\"{tag}\"")),
                "expected tag {tag} in {json}"
            );
        }
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    #[test]
    fn new_entry_starts_unreverted_with_utc_timestamp() {
        let e = OperationEntry::new(
            OpId::generate(),
            "add series 'x'".to_owned(),
            OpPayload::AddSeries {
                series: "x".to_owned(),
                concentration: None,
            },
        );
        assert!(!e.reverted);
        assert!(e.timestamp.ends_with('Z'), "timestamp: {}", e.timestamp);
    }

    #[test]
    fn description_with_unicode_survives_round_trip() {
        let e = entry(OpPayload::RenameSeries {
            from: "α-run".to_owned(),
            to: "β-run\u{2009}2".to_owned(),
        });
        let json = e.to_canonical_json().unwrap();
        let parsed = OperationEntry::from_json(&json).unwrap();
        assert_eq!(e, parsed);
    }
}
