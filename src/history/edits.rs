//! Concrete command variants.
//!
//! Each variant owns the snapshot or delta it needs to reverse itself: the
//! removed series, the prior attribute value, the appended point's index.
//! Snapshots are taken during `execute` and only cleared once the matching
//! `undo` has succeeded, so a failed undo can be retried.

use crate::model::dataset::{AttrValue, Dataset, Point, Series};
use crate::model::types::{OpId, SeriesName};
use crate::oplog::types::{OperationEntry, OpPayload};

use super::command::{Command, CommandError};

// ---------------------------------------------------------------------------
// AddSeries
// ---------------------------------------------------------------------------

/// Add a new, empty series to the dataset.
#[derive(Debug)]
pub struct AddSeries {
    name: SeriesName,
    concentration: Option<f64>,
}

impl AddSeries {
    /// Create the command.
    #[must_use]
    pub const fn new(name: SeriesName, concentration: Option<f64>) -> Self {
        Self {
            name,
            concentration,
        }
    }
}

impl Command for AddSeries {
    fn execute(&mut self, dataset: &mut Dataset) -> Result<(), CommandError> {
        dataset
            .add_series(self.name.clone(), self.concentration)
            .map_err(|source| CommandError::Apply {
                action: self.description(),
                source,
            })
    }

    fn undo(&mut self, dataset: &mut Dataset) -> Result<(), CommandError> {
        dataset
            .remove_series(&self.name)
            .map(drop)
            .map_err(|source| CommandError::Revert {
                action: self.description(),
                source,
            })
    }

    fn description(&self) -> String {
        format!("add series `{}`", self.name)
    }

    fn to_operation(&self, op_id: OpId) -> OperationEntry {
        OperationEntry::new(
            op_id,
            self.description(),
            OpPayload::AddSeries {
                series: self.name.to_string(),
                concentration: self.concentration,
            },
        )
    }
}

// ---------------------------------------------------------------------------
// RemoveSeries
// ---------------------------------------------------------------------------

/// Remove a series, keeping a full snapshot for undo.
#[derive(Debug)]
pub struct RemoveSeries {
    name: SeriesName,
    removed: Option<Series>,
}

impl RemoveSeries {
    /// Create the command.
    #[must_use]
    pub const fn new(name: SeriesName) -> Self {
        Self {
            name,
            removed: None,
        }
    }
}

impl Command for RemoveSeries {
    fn execute(&mut self, dataset: &mut Dataset) -> Result<(), CommandError> {
        let series = dataset
            .remove_series(&self.name)
            .map_err(|source| CommandError::Apply {
                action: self.description(),
                source,
            })?;
        self.removed = Some(series);
        Ok(())
    }

    fn undo(&mut self, dataset: &mut Dataset) -> Result<(), CommandError> {
        if self.removed.is_none() {
            return Err(CommandError::MissingSnapshot {
                action: self.description(),
            });
        }
        // Check the slot is free before consuming the snapshot, so a failed
        // undo keeps it for a retry.
        if dataset.contains_series(&self.name) {
            return Err(CommandError::Revert {
                action: self.description(),
                source: crate::model::dataset::ModelError::SeriesExists {
                    name: self.name.clone(),
                },
            });
        }
        let Some(series) = self.removed.take() else {
            return Err(CommandError::MissingSnapshot {
                action: self.description(),
            });
        };
        dataset
            .restore_series(self.name.clone(), series)
            .map_err(|source| CommandError::Revert {
                action: self.description(),
                source,
            })
    }

    fn description(&self) -> String {
        format!("remove series `{}`", self.name)
    }

    fn to_operation(&self, op_id: OpId) -> OperationEntry {
        OperationEntry::new(
            op_id,
            self.description(),
            OpPayload::RemoveSeries {
                series: self.name.to_string(),
                points: self.removed.as_ref().map_or(0, |s| s.points.len()),
            },
        )
    }
}

// ---------------------------------------------------------------------------
// RenameSeries
// ---------------------------------------------------------------------------

/// Rename a series. Undo renames it back; no snapshot needed.
#[derive(Debug)]
pub struct RenameSeries {
    from: SeriesName,
    to: SeriesName,
}

impl RenameSeries {
    /// Create the command.
    #[must_use]
    pub const fn new(from: SeriesName, to: SeriesName) -> Self {
        Self { from, to }
    }
}

impl Command for RenameSeries {
    fn execute(&mut self, dataset: &mut Dataset) -> Result<(), CommandError> {
        dataset
            .rename_series(&self.from, &self.to)
            .map_err(|source| CommandError::Apply {
                action: self.description(),
                source,
            })
    }

    fn undo(&mut self, dataset: &mut Dataset) -> Result<(), CommandError> {
        dataset
            .rename_series(&self.to, &self.from)
            .map_err(|source| CommandError::Revert {
                action: self.description(),
                source,
            })
    }

    fn description(&self) -> String {
        format!("rename series `{}` to `{}`", self.from, self.to)
    }

    fn to_operation(&self, op_id: OpId) -> OperationEntry {
        OperationEntry::new(
            op_id,
            self.description(),
            OpPayload::RenameSeries {
                from: self.from.to_string(),
                to: self.to.to_string(),
            },
        )
    }
}

// ---------------------------------------------------------------------------
// SetAttribute
// ---------------------------------------------------------------------------

/// Set a metadata attribute on a series, capturing the prior value.
#[derive(Debug)]
pub struct SetAttribute {
    series: SeriesName,
    key: String,
    value: AttrValue,
    // Outer None: never executed. Inner None: the key did not exist before.
    previous: Option<Option<AttrValue>>,
}

impl SetAttribute {
    /// Create the command.
    #[must_use]
    pub fn new(series: SeriesName, key: impl Into<String>, value: AttrValue) -> Self {
        Self {
            series,
            key: key.into(),
            value,
            previous: None,
        }
    }
}

impl Command for SetAttribute {
    fn execute(&mut self, dataset: &mut Dataset) -> Result<(), CommandError> {
        let prior = dataset
            .set_attribute(&self.series, &self.key, self.value.clone())
            .map_err(|source| CommandError::Apply {
                action: self.description(),
                source,
            })?;
        self.previous = Some(prior);
        Ok(())
    }

    fn undo(&mut self, dataset: &mut Dataset) -> Result<(), CommandError> {
        let Some(previous) = self.previous.take() else {
            return Err(CommandError::MissingSnapshot {
                action: self.description(),
            });
        };
        let result = match &previous {
            Some(old) => dataset
                .set_attribute(&self.series, &self.key, old.clone())
                .map(drop),
            None => dataset.remove_attribute(&self.series, &self.key).map(drop),
        };
        if let Err(source) = result {
            // Keep the snapshot so a retry can still restore it.
            self.previous = Some(previous);
            return Err(CommandError::Revert {
                action: self.description(),
                source,
            });
        }
        Ok(())
    }

    fn description(&self) -> String {
        format!("set `{}` = {} on series `{}`", self.key, self.value, self.series)
    }

    fn to_operation(&self, op_id: OpId) -> OperationEntry {
        OperationEntry::new(
            op_id,
            self.description(),
            OpPayload::SetAttribute {
                series: self.series.to_string(),
                key: self.key.clone(),
                old: self.previous.clone().flatten(),
                new: self.value.clone(),
            },
        )
    }
}

// ---------------------------------------------------------------------------
// AddPoint
// ---------------------------------------------------------------------------

/// Append one observation to a series.
#[derive(Debug)]
pub struct AddPoint {
    series: SeriesName,
    time: f64,
    response: f64,
    index: Option<usize>,
}

impl AddPoint {
    /// Create the command.
    #[must_use]
    pub const fn new(series: SeriesName, time: f64, response: f64) -> Self {
        Self {
            series,
            time,
            response,
            index: None,
        }
    }
}

impl Command for AddPoint {
    fn execute(&mut self, dataset: &mut Dataset) -> Result<(), CommandError> {
        let index = dataset
            .push_point(&self.series, Point::new(self.time, self.response))
            .map_err(|source| CommandError::Apply {
                action: self.description(),
                source,
            })?;
        self.index = Some(index);
        Ok(())
    }

    fn undo(&mut self, dataset: &mut Dataset) -> Result<(), CommandError> {
        let Some(index) = self.index else {
            return Err(CommandError::MissingSnapshot {
                action: self.description(),
            });
        };
        dataset
            .remove_point(&self.series, index)
            .map_err(|source| CommandError::Revert {
                action: self.description(),
                source,
            })?;
        self.index = None;
        Ok(())
    }

    fn description(&self) -> String {
        format!(
            "add point ({}, {}) to series `{}`",
            self.time, self.response, self.series
        )
    }

    fn to_operation(&self, op_id: OpId) -> OperationEntry {
        OperationEntry::new(
            op_id,
            self.description(),
            OpPayload::AddPoint {
                series: self.series.to_string(),
                time: self.time,
                response: self.response,
            },
        )
    }
}

// ---------------------------------------------------------------------------
// SetPointMask
// ---------------------------------------------------------------------------

/// Flag one point as excluded from (or restored to) fitting.
#[derive(Debug)]
pub struct SetPointMask {
    series: SeriesName,
    index: usize,
    masked: bool,
    previous: Option<bool>,
}

impl SetPointMask {
    /// Create the command.
    #[must_use]
    pub const fn new(series: SeriesName, index: usize, masked: bool) -> Self {
        Self {
            series,
            index,
            masked,
            previous: None,
        }
    }
}

impl Command for SetPointMask {
    fn execute(&mut self, dataset: &mut Dataset) -> Result<(), CommandError> {
        let prior = dataset
            .set_point_mask(&self.series, self.index, self.masked)
            .map_err(|source| CommandError::Apply {
                action: self.description(),
                source,
            })?;
        self.previous = Some(prior);
        Ok(())
    }

    fn undo(&mut self, dataset: &mut Dataset) -> Result<(), CommandError> {
        let Some(previous) = self.previous else {
            return Err(CommandError::MissingSnapshot {
                action: self.description(),
            });
        };
        dataset
            .set_point_mask(&self.series, self.index, previous)
            .map_err(|source| CommandError::Revert {
                action: self.description(),
                source,
            })?;
        self.previous = None;
        Ok(())
    }

    fn description(&self) -> String {
        let verb = if self.masked { "mask" } else { "unmask" };
        format!("{verb} point {} of series `{}`", self.index, self.series)
    }

    fn to_operation(&self, op_id: OpId) -> OperationEntry {
        OperationEntry::new(
            op_id,
            self.description(),
            OpPayload::SetPointMask {
                series: self.series.to_string(),
                index: self.index,
                masked: self.masked,
                was_masked: self.previous.unwrap_or(!self.masked),
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
