//! The mutable binding-kinetics data store.
//!
//! A [`Dataset`] holds named concentration/time-response [`Series`], each a
//! sequence of [`Point`]s plus free-form [`AttrValue`] metadata. Every
//! mutation goes through the `Result`-returning methods here; the command
//! layer calls them and captures enough prior state to reverse each call.
//!
//! Series are keyed in a `BTreeMap` so iteration order (and serialized JSON)
//! is deterministic.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::SeriesName;

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// One observation in a response series.
///
/// `masked` excludes the point from downstream fitting without discarding
/// the measurement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Time of the observation, in seconds.
    pub time: f64,
    /// Measured response (instrument units, e.g. RU).
    pub response: f64,
    /// Whether the point is excluded from fitting.
    #[serde(default)]
    pub masked: bool,
}

impl Point {
    /// Create an unmasked point.
    #[must_use]
    pub const fn new(time: f64, response: f64) -> Self {
        Self {
            time,
            response,
            masked: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AttrValue
// ---------------------------------------------------------------------------

/// A series metadata value (ligand name, temperature, channel, …).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// Boolean flag.
    Flag(bool),
    /// Numeric value.
    Number(f64),
    /// Free text.
    Text(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl AttrValue {
    /// Parse a raw string the way the interactive editor does: `true`/`false`
    /// become flags, anything numeric becomes a number, the rest stays text.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "true" => Self::Flag(true),
            "false" => Self::Flag(false),
            _ => raw
                .parse::<f64>()
                .map_or_else(|_| Self::Text(raw.to_owned()), Self::Number),
        }
    }
}

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

/// One concentration/time-response series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Analyte concentration for this series, if known (molar).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concentration: Option<f64>,
    /// Observations, in acquisition order.
    #[serde(default)]
    pub points: Vec<Point>,
    /// Free-form metadata, sorted by key for deterministic JSON.
    #[serde(default)]
    pub attributes: BTreeMap<String, AttrValue>,
}

impl Series {
    /// Create an empty series with an optional analyte concentration.
    #[must_use]
    pub fn new(concentration: Option<f64>) -> Self {
        Self {
            concentration,
            ..Self::default()
        }
    }

    /// Number of masked points.
    #[must_use]
    pub fn masked_count(&self) -> usize {
        self.points.iter().filter(|p| p.masked).count()
    }
}

// ---------------------------------------------------------------------------
// ModelError
// ---------------------------------------------------------------------------

/// Errors returned by [`Dataset`] mutation and read accessors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A series with this name already exists.
    #[error("series `{name}` already exists")]
    SeriesExists {
        /// The conflicting name.
        name: SeriesName,
    },

    /// The requested series does not exist.
    #[error("series `{name}` not found")]
    SeriesNotFound {
        /// The missing name.
        name: SeriesName,
    },

    /// The requested attribute does not exist on the series.
    #[error("attribute `{key}` not found on series `{series}`")]
    AttributeNotFound {
        /// The series that was inspected.
        series: SeriesName,
        /// The missing attribute key.
        key: String,
    },

    /// A point index is out of range for the series.
    #[error("point index {index} out of range for series `{series}` ({len} point(s))")]
    PointOutOfRange {
        /// The series that was inspected.
        series: SeriesName,
        /// The requested index.
        index: usize,
        /// The series length at the time of the call.
        len: usize,
    },
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// The in-memory scientific data store the command layer mutates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Human-readable dataset name (experiment or workbook label).
    pub name: String,
    /// All series, keyed by name.
    #[serde(default)]
    pub series: BTreeMap<SeriesName, Series>,
}

impl Dataset {
    /// Create an empty dataset.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            series: BTreeMap::new(),
        }
    }

    /// Number of series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Whether the dataset has no series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Whether a series with this name exists.
    #[must_use]
    pub fn contains_series(&self, name: &SeriesName) -> bool {
        self.series.contains_key(name)
    }

    /// Borrow a series.
    ///
    /// # Errors
    /// Returns [`ModelError::SeriesNotFound`] if no series has this name.
    pub fn series(&self, name: &SeriesName) -> Result<&Series, ModelError> {
        self.series.get(name).ok_or_else(|| ModelError::SeriesNotFound {
            name: name.clone(),
        })
    }

    /// Iterate series name/value pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&SeriesName, &Series)> {
        self.series.iter()
    }

    /// Add a new empty series.
    ///
    /// # Errors
    /// Returns [`ModelError::SeriesExists`] if the name is taken.
    pub fn add_series(
        &mut self,
        name: SeriesName,
        concentration: Option<f64>,
    ) -> Result<(), ModelError> {
        if self.series.contains_key(&name) {
            return Err(ModelError::SeriesExists { name });
        }
        self.series.insert(name, Series::new(concentration));
        Ok(())
    }

    /// Reinsert a previously removed series, snapshot and all.
    ///
    /// # Errors
    /// Returns [`ModelError::SeriesExists`] if the name is taken.
    pub fn restore_series(&mut self, name: SeriesName, series: Series) -> Result<(), ModelError> {
        if self.series.contains_key(&name) {
            return Err(ModelError::SeriesExists { name });
        }
        self.series.insert(name, series);
        Ok(())
    }

    /// Remove a series, returning it.
    ///
    /// # Errors
    /// Returns [`ModelError::SeriesNotFound`] if no series has this name.
    pub fn remove_series(&mut self, name: &SeriesName) -> Result<Series, ModelError> {
        self.series
            .remove(name)
            .ok_or_else(|| ModelError::SeriesNotFound { name: name.clone() })
    }

    /// Rename a series.
    ///
    /// # Errors
    /// Returns [`ModelError::SeriesNotFound`] if `from` does not exist, or
    /// [`ModelError::SeriesExists`] if `to` is taken.
    pub fn rename_series(&mut self, from: &SeriesName, to: &SeriesName) -> Result<(), ModelError> {
        if self.series.contains_key(to) {
            return Err(ModelError::SeriesExists { name: to.clone() });
        }
        let series = self
            .series
            .remove(from)
            .ok_or_else(|| ModelError::SeriesNotFound { name: from.clone() })?;
        self.series.insert(to.clone(), series);
        Ok(())
    }

    /// Set an attribute on a series, returning the prior value if any.
    ///
    /// # Errors
    /// Returns [`ModelError::SeriesNotFound`] if no series has this name.
    pub fn set_attribute(
        &mut self,
        name: &SeriesName,
        key: &str,
        value: AttrValue,
    ) -> Result<Option<AttrValue>, ModelError> {
        let series = self.series_mut(name)?;
        Ok(series.attributes.insert(key.to_owned(), value))
    }

    /// Remove an attribute from a series, returning the removed value.
    ///
    /// # Errors
    /// Returns [`ModelError::SeriesNotFound`] if no series has this name, or
    /// [`ModelError::AttributeNotFound`] if the key is absent.
    pub fn remove_attribute(
        &mut self,
        name: &SeriesName,
        key: &str,
    ) -> Result<AttrValue, ModelError> {
        let series = self.series_mut(name)?;
        series
            .attributes
            .remove(key)
            .ok_or_else(|| ModelError::AttributeNotFound {
                series: name.clone(),
                key: key.to_owned(),
            })
    }

    /// Append a point to a series, returning its index.
    ///
    /// # Errors
    /// Returns [`ModelError::SeriesNotFound`] if no series has this name.
    pub fn push_point(&mut self, name: &SeriesName, point: Point) -> Result<usize, ModelError> {
        let series = self.series_mut(name)?;
        series.points.push(point);
        Ok(series.points.len() - 1)
    }

    /// Remove the point at `index`, returning it.
    ///
    /// # Errors
    /// Returns [`ModelError::SeriesNotFound`] or [`ModelError::PointOutOfRange`].
    pub fn remove_point(&mut self, name: &SeriesName, index: usize) -> Result<Point, ModelError> {
        let series = self.series_mut(name)?;
        let len = series.points.len();
        if index >= len {
            return Err(ModelError::PointOutOfRange {
                series: name.clone(),
                index,
                len,
            });
        }
        Ok(series.points.remove(index))
    }

    /// Set the mask flag on one point, returning the prior flag.
    ///
    /// # Errors
    /// Returns [`ModelError::SeriesNotFound`] or [`ModelError::PointOutOfRange`].
    pub fn set_point_mask(
        &mut self,
        name: &SeriesName,
        index: usize,
        masked: bool,
    ) -> Result<bool, ModelError> {
        let series_name = name.clone();
        let series = self.series_mut(name)?;
        let len = series.points.len();
        let point = series
            .points
            .get_mut(index)
            .ok_or_else(|| ModelError::PointOutOfRange {
                series: series_name,
                index,
                len,
            })?;
        let previous = point.masked;
        point.masked = masked;
        Ok(previous)
    }

    fn series_mut(&mut self, name: &SeriesName) -> Result<&mut Series, ModelError> {
        self.series
            .get_mut(name)
            .ok_or_else(|| ModelError::SeriesNotFound { name: name.clone() })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
