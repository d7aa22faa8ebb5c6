use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use bindkit::config::BindkitConfig;
use bindkit::format::OutputFormat;
use bindkit::model::dataset::Dataset;
use bindkit::session::CurationSession;
use bindkit::{edit, telemetry};

/// Curation tool for binding-kinetics datasets
///
/// bindkit edits concentration/time-response datasets interactively, with
/// every change undoable, redoable, and recorded in a per-session
/// provenance log.
///
/// QUICK START:
///
///   bindkit new surface-a.json --name "surface A"
///   bindkit edit surface-a.json
///
///   # In the editor:
///   bindkit> add 40nM 4e-8
///   bindkit> point 40nM 0.0 0.3
///   bindkit> undo
///   bindkit> log
///   bindkit> save
///
/// Datasets are plain JSON files. History and provenance live in memory for
/// the duration of one edit session.
#[derive(Parser)]
#[command(name = "bindkit")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'bindkit <command> --help' for more information on a specific command.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty dataset file
    New {
        /// Path of the dataset file to create
        path: PathBuf,

        /// Dataset name (defaults to the file stem)
        #[arg(long)]
        name: Option<String>,
    },

    /// Summarize a dataset file
    Show {
        /// Path of the dataset file
        path: PathBuf,

        /// Output format: json, text, or pretty
        ///
        /// If not specified, uses `output.format` from bindkit.toml
        /// (default: pretty).
        #[arg(long)]
        format: Option<OutputFormat>,
    },

    /// Edit a dataset interactively
    ///
    /// Opens a line-oriented editor over the dataset. Every edit is
    /// undoable and recorded in the session's provenance log; `save`
    /// writes the dataset back to disk.
    Edit {
        /// Path of the dataset file
        path: PathBuf,

        /// Override the undo-history bound from bindkit.toml
        #[arg(long)]
        max_history: Option<usize>,
    },

    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        shell: Shell,
    },
}

fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::New { path, name } => new_dataset(&path, name),
        Commands::Show { path, format } => show(&path, format),
        Commands::Edit { path, max_history } => edit_dataset(&path, max_history),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "bindkit", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn new_dataset(path: &Path, name: Option<String>) -> Result<()> {
    if path.exists() {
        bail!(
            "{} already exists.\n  To edit it: bindkit edit {}",
            path.display(),
            path.display()
        );
    }
    let name = name.unwrap_or_else(|| {
        path.file_stem()
            .map_or_else(|| "dataset".to_owned(), |s| s.to_string_lossy().into_owned())
    });

    let session = CurationSession::new(Dataset::new(name), 0);
    session.save(path)?;
    println!("Created {}.", path.display());
    println!("Next: bindkit edit {}", path.display());
    Ok(())
}

fn show(path: &Path, format: Option<OutputFormat>) -> Result<()> {
    let config = BindkitConfig::load(Path::new(".")).context("failed to load bindkit.toml")?;
    let format = OutputFormat::resolve(format, config.output.format);

    let session = CurationSession::load(path, 0)?;
    let dataset = session.dataset();

    match format {
        OutputFormat::Json => {
            println!("{}", format.serialize(dataset)?);
        }
        OutputFormat::Text => {
            for (name, series) in dataset.iter() {
                println!(
                    "{}\t{}\t{}\t{}",
                    name,
                    series.points.len(),
                    series.masked_count(),
                    series
                        .concentration
                        .map_or_else(|| "-".to_owned(), |c| c.to_string())
                );
            }
        }
        OutputFormat::Pretty => {
            println!("=== Dataset: {} ===", dataset.name);
            println!();
            println!("  series                points   masked   concentration");
            println!("  ──────────────────    ──────   ──────   ─────────────");
            for (name, series) in dataset.iter() {
                println!(
                    "  {:<20}   {:>6}   {:>6}   {}",
                    name.to_string(),
                    series.points.len(),
                    series.masked_count(),
                    series
                        .concentration
                        .map_or_else(|| "-".to_owned(), |c| format!("{c:e}"))
                );
            }
            println!();
            println!("Showing {} series", dataset.len());
        }
    }
    Ok(())
}

fn edit_dataset(path: &Path, max_history: Option<usize>) -> Result<()> {
    let config = BindkitConfig::load(Path::new(".")).context("failed to load bindkit.toml")?;
    let max_history = max_history.unwrap_or(config.history.max_history);

    let mut session = CurationSession::load(path, max_history)?;
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    edit::run(&mut session, path, stdin.lock(), &mut stdout)?;
    stdout.flush()?;
    Ok(())
}
