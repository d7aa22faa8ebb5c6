//! Shared test helpers for bindkit integration tests.
//!
//! Builders for sessions, datasets, and boxed commands so individual tests
//! read as scenarios rather than setup.
#![allow(dead_code)]

use bindkit::history::command::Command;
use bindkit::history::edits::{AddPoint, AddSeries, RemoveSeries, RenameSeries, SetAttribute};
use bindkit::model::dataset::{AttrValue, Dataset};
use bindkit::model::types::SeriesName;
use bindkit::session::CurationSession;

/// Build a validated series name, panicking on bad test input.
pub fn name(s: &str) -> SeriesName {
    SeriesName::new(s).expect("test series name should be valid")
}

/// A session over an empty dataset.
pub fn session(max_history: usize) -> CurationSession {
    CurationSession::new(Dataset::new("test dataset"), max_history)
}

/// A session seeded with two series carrying a few points each.
pub fn seeded_session(max_history: usize) -> CurationSession {
    let mut s = session(max_history);
    for (series, conc) in [("40nM", 4e-8), ("80nM", 8e-8)] {
        assert!(s.apply(add_with_conc(series, conc)));
        assert!(s.apply(point(series, 0.0, 0.0)));
        assert!(s.apply(point(series, 5.0, 11.8)));
    }
    s
}

pub fn add(series: &str) -> Box<dyn Command> {
    Box::new(AddSeries::new(name(series), None))
}

pub fn add_with_conc(series: &str, concentration: f64) -> Box<dyn Command> {
    Box::new(AddSeries::new(name(series), Some(concentration)))
}

pub fn remove(series: &str) -> Box<dyn Command> {
    Box::new(RemoveSeries::new(name(series)))
}

pub fn rename(from: &str, to: &str) -> Box<dyn Command> {
    Box::new(RenameSeries::new(name(from), name(to)))
}

pub fn set_attr(series: &str, key: &str, value: &str) -> Box<dyn Command> {
    Box::new(SetAttribute::new(name(series), key, AttrValue::parse(value)))
}

pub fn point(series: &str, time: f64, response: f64) -> Box<dyn Command> {
    Box::new(AddPoint::new(name(series), time, response))
}
