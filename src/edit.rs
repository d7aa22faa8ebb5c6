//! Line-oriented interactive editor.
//!
//! Drives a [`CurationSession`] from a command-per-line protocol on any
//! `BufRead`/`Write` pair — stdin/stdout in the binary, in-memory buffers in
//! tests. Every mutation goes through the session's command history, so
//! `undo`/`redo` cover exactly what the editor did.
//!
//! Series names entered here are single tokens; the data model itself
//! accepts names with spaces (e.g. from imported files).

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use glob::Pattern;

use crate::history::command::Command;
use crate::history::edits::{
    AddPoint, AddSeries, RemoveSeries, RenameSeries, SetAttribute, SetPointMask,
};
use crate::model::dataset::AttrValue;
use crate::model::types::SeriesName;
use crate::session::CurationSession;

/// Run the editor loop until `quit` or end of input.
///
/// `path` is where `save` writes the dataset.
///
/// # Errors
/// Returns an error only for I/O failures on the input/output streams or a
/// failed save; command failures are reported inline and the loop continues.
pub fn run<R: BufRead, W: Write>(
    session: &mut CurationSession,
    path: &Path,
    mut input: R,
    out: &mut W,
) -> Result<()> {
    writeln!(
        out,
        "Editing {} — {} series. Type `help` for commands.",
        path.display(),
        session.dataset().len()
    )?;

    let mut dirty = false;
    let mut line = String::new();
    loop {
        write!(out, "bindkit> ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line).context("failed to read input")? == 0 {
            break; // EOF behaves like quit!
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&verb, args)) = tokens.split_first() else {
            continue;
        };

        match verb {
            "help" => print_help(out)?,
            "add" => match parse_add(args) {
                Ok(cmd) => apply(session, cmd, &mut dirty, out)?,
                Err(msg) => writeln!(out, "{msg}")?,
            },
            "rm" => match parse_name(args, "rm <series>") {
                Ok(name) => apply(session, Box::new(RemoveSeries::new(name)), &mut dirty, out)?,
                Err(msg) => writeln!(out, "{msg}")?,
            },
            "rename" => match parse_rename(args) {
                Ok(cmd) => apply(session, cmd, &mut dirty, out)?,
                Err(msg) => writeln!(out, "{msg}")?,
            },
            "set" => set_matching(session, args, &mut dirty, out)?,
            "point" => match parse_point(args) {
                Ok(cmd) => apply(session, cmd, &mut dirty, out)?,
                Err(msg) => writeln!(out, "{msg}")?,
            },
            "mask" | "unmask" => match parse_mask(args, verb == "mask") {
                Ok(cmd) => apply(session, cmd, &mut dirty, out)?,
                Err(msg) => writeln!(out, "{msg}")?,
            },
            "undo" => {
                if !session.history().can_undo() {
                    writeln!(out, "Nothing to undo.")?;
                } else if session.undo() {
                    dirty = true;
                    writeln!(out, "Undone.")?;
                } else if let Some(err) = session.last_error() {
                    writeln!(out, "Undo failed: {err}")?;
                }
            }
            "redo" => {
                if !session.history().can_redo() {
                    writeln!(out, "Nothing to redo.")?;
                } else if session.redo() {
                    dirty = true;
                    writeln!(out, "Redone.")?;
                } else if let Some(err) = session.last_error() {
                    writeln!(out, "Redo failed: {err}")?;
                }
            }
            "history" => print_history(session, out)?,
            "log" => print_log(session, args, out)?,
            "stats" => print_stats(session, out)?,
            "save" => {
                session.save(path)?;
                dirty = false;
                writeln!(out, "Saved {}.", path.display())?;
            }
            "quit" if dirty => {
                writeln!(
                    out,
                    "Unsaved changes. `save` first, or `quit!` to discard them."
                )?;
            }
            "quit" | "quit!" => break,
            other => writeln!(out, "Unknown command `{other}`. Type `help`.")?,
        }
    }
    Ok(())
}

/// Run one command through the session and report the outcome.
fn apply<W: Write>(
    session: &mut CurationSession,
    command: Box<dyn Command>,
    dirty: &mut bool,
    out: &mut W,
) -> Result<()> {
    let description = command.description();
    if session.apply(command) {
        *dirty = true;
        writeln!(out, "Applied: {description}")?;
    } else if let Some(err) = session.last_error() {
        writeln!(out, "Error: {err}")?;
    }
    Ok(())
}

/// `set <glob> <key> <value…>` — one undoable command per matching series.
fn set_matching<W: Write>(
    session: &mut CurationSession,
    args: &[&str],
    dirty: &mut bool,
    out: &mut W,
) -> Result<()> {
    let [pattern, key, value @ ..] = args else {
        writeln!(out, "Usage: set <series-glob> <key> <value>")?;
        return Ok(());
    };
    if value.is_empty() {
        writeln!(out, "Usage: set <series-glob> <key> <value>")?;
        return Ok(());
    }
    let pattern = match Pattern::new(pattern) {
        Ok(p) => p,
        Err(e) => {
            writeln!(out, "Bad pattern `{pattern}`: {e}")?;
            return Ok(());
        }
    };
    let value = AttrValue::parse(&value.join(" "));

    let matches: Vec<SeriesName> = session
        .dataset()
        .iter()
        .filter(|(name, _)| pattern.matches(name.as_str()))
        .map(|(name, _)| name.clone())
        .collect();

    if matches.is_empty() {
        writeln!(out, "No series match `{pattern}`.")?;
        return Ok(());
    }
    for name in matches {
        apply(
            session,
            Box::new(SetAttribute::new(name, (*key).to_owned(), value.clone())),
            dirty,
            out,
        )?;
    }
    Ok(())
}

fn parse_add(args: &[&str]) -> Result<Box<dyn Command>, String> {
    match args {
        [name] => Ok(Box::new(AddSeries::new(series_name(name)?, None))),
        [name, conc] => {
            let concentration = parse_number(conc, "concentration")?;
            Ok(Box::new(AddSeries::new(
                series_name(name)?,
                Some(concentration),
            )))
        }
        _ => Err("Usage: add <series> [concentration]".to_owned()),
    }
}

fn parse_rename(args: &[&str]) -> Result<Box<dyn Command>, String> {
    match args {
        [from, to] => Ok(Box::new(RenameSeries::new(
            series_name(from)?,
            series_name(to)?,
        ))),
        _ => Err("Usage: rename <old> <new>".to_owned()),
    }
}

fn parse_point(args: &[&str]) -> Result<Box<dyn Command>, String> {
    match args {
        [name, time, response] => Ok(Box::new(AddPoint::new(
            series_name(name)?,
            parse_number(time, "time")?,
            parse_number(response, "response")?,
        ))),
        _ => Err("Usage: point <series> <time> <response>".to_owned()),
    }
}

fn parse_mask(args: &[&str], masked: bool) -> Result<Box<dyn Command>, String> {
    let usage = if masked {
        "Usage: mask <series> <index>"
    } else {
        "Usage: unmask <series> <index>"
    };
    match args {
        [name, index] => {
            let index: usize = index
                .parse()
                .map_err(|_| format!("Bad index `{index}`: expected a non-negative integer"))?;
            Ok(Box::new(SetPointMask::new(series_name(name)?, index, masked)))
        }
        _ => Err(usage.to_owned()),
    }
}

fn parse_name(args: &[&str], usage: &str) -> Result<SeriesName, String> {
    match args {
        [name] => series_name(name),
        _ => Err(format!("Usage: {usage}")),
    }
}

fn series_name(raw: &str) -> Result<SeriesName, String> {
    SeriesName::new(raw).map_err(|e| format!("Error: {e}"))
}

fn parse_number(raw: &str, what: &str) -> Result<f64, String> {
    raw.parse()
        .map_err(|_| format!("Bad {what} `{raw}`: expected a number"))
}

fn print_help<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "Commands:")?;
    writeln!(out, "  add <series> [concentration]     add an empty series")?;
    writeln!(out, "  rm <series>                      remove a series")?;
    writeln!(out, "  rename <old> <new>               rename a series")?;
    writeln!(out, "  set <glob> <key> <value>         set an attribute on matching series")?;
    writeln!(out, "  point <series> <time> <response> append an observation")?;
    writeln!(out, "  mask <series> <index>            exclude a point from fitting")?;
    writeln!(out, "  unmask <series> <index>          restore a point to fitting")?;
    writeln!(out, "  undo / redo                      step through edit history")?;
    writeln!(out, "  history                          list undoable edits, oldest first")?;
    writeln!(out, "  log [reverted|active]            show the provenance log")?;
    writeln!(out, "  stats                            session counters")?;
    writeln!(out, "  save                             write the dataset file")?;
    writeln!(out, "  quit                             exit (quit! discards unsaved edits)")?;
    Ok(())
}

fn print_history<W: Write>(session: &CurationSession, out: &mut W) -> Result<()> {
    let history = session.history();
    let mut any = false;
    for (i, description) in history.history().enumerate() {
        any = true;
        writeln!(out, "  {:>3}  {description}", i + 1)?;
    }
    if !any {
        writeln!(out, "History is empty.")?;
    }
    if let Some(next) = history.undo_description() {
        writeln!(out, "Next undo: {next}")?;
    }
    if let Some(next) = history.redo_description() {
        writeln!(out, "Next redo: {next}")?;
    }
    Ok(())
}

fn print_log<W: Write>(session: &CurationSession, args: &[&str], out: &mut W) -> Result<()> {
    let provenance = session.history().provenance();
    let filter = match args {
        [] => None,
        ["reverted"] => Some(true),
        ["active"] => Some(false),
        _ => {
            writeln!(out, "Usage: log [reverted|active]")?;
            return Ok(());
        }
    };

    let mut any = false;
    for entry in provenance.entries() {
        if filter.is_some_and(|want| entry.reverted != want) {
            continue;
        }
        any = true;
        let state = if entry.reverted { "reverted" } else { "active  " };
        write!(
            out,
            "  {}  {}  {}  {}",
            entry.op_id, entry.timestamp, state, entry.description
        )?;
        if let Ok(digest) = entry.digest() {
            write!(out, "  [{}]", &digest[..12])?;
        }
        writeln!(out)?;
    }
    if !any {
        writeln!(out, "No matching log entries.")?;
    }
    Ok(())
}

fn print_stats<W: Write>(session: &CurationSession, out: &mut W) -> Result<()> {
    let stats = session.stats();
    writeln!(out, "Series:    {}", session.dataset().len())?;
    writeln!(out, "Recorded:  {}", stats.recorded)?;
    writeln!(out, "Active:    {}", stats.active)?;
    writeln!(out, "Reverted:  {}", stats.reverted)?;
    writeln!(out, "Undoable:  {}", stats.undo_depth)?;
    writeln!(out, "Redoable:  {}", stats.redo_depth)?;
    Ok(())
}
