//! Command-line interface for sortdir.
//!
//! This module handles:
//! - Argument parsing (`clap`)
//! - Pipeline orchestration: snapshot, category folders, moves, pruning,
//!   archive unpacking
//! - The end-of-run summary or JSON report

use crate::archive::{UnpackedArchive, unpack_archives};
use crate::cleanup::prune_empty_folders;
use crate::file_category::Category;
use crate::file_organizer::{
    DEFAULT_JOBS, FailedMove, FileOrganizer, Operation, OrganizeResult,
};
use crate::output::OutputFormatter;
use chrono::{DateTime, Utc};
use clap::Parser;
use indicatif::ProgressBar;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Sort a folder into category subfolders, normalizing file names and
/// unpacking archives.
#[derive(Debug, Parser)]
#[command(name = "sortdir", version, about)]
pub struct Cli {
    /// Folder to sort in place
    pub root: PathBuf,

    /// Maximum number of file moves in flight
    #[arg(short, long, default_value_t = DEFAULT_JOBS, value_parser = parse_jobs)]
    pub jobs: usize,

    /// Print the run report as JSON instead of the summary table
    #[arg(long)]
    pub json: bool,
}

fn parse_jobs(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(jobs) => Ok(jobs),
        Err(e) => Err(e.to_string()),
    }
}

/// Settings for one sorting run.
#[derive(Debug, Clone)]
pub struct SortOptions {
    /// The folder to reorganize.
    pub root: PathBuf,
    /// Width of the move pool.
    pub jobs: usize,
}

impl SortOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            jobs: DEFAULT_JOBS,
        }
    }
}

impl From<&Cli> for SortOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            root: cli.root.clone(),
            jobs: cli.jobs,
        }
    }
}

/// Everything a run did.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub timestamp: DateTime<Utc>,
    pub root: PathBuf,
    pub moved: Vec<Operation>,
    pub failed: Vec<FailedMove>,
    pub removed_dirs: Vec<PathBuf>,
    pub unpacked: Vec<UnpackedArchive>,
}

impl RunReport {
    /// Number of moved files per category folder.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for operation in &self.moved {
            *counts.entry(operation.category.to_string()).or_insert(0) += 1;
        }
        counts
    }
}

/// Sorts `options.root` in place.
///
/// Steps, in order:
/// 1. Snapshot the root's top-level entries
/// 2. Create every category folder (fails if one exists)
/// 3. Walk the snapshot and move each file into its category folder
/// 4. Remove directories left empty
/// 5. Unpack everything in `archives/`
///
/// Only per-file move failures are tolerated; they are reported through
/// `progress` and listed in the returned report.
///
/// # Examples
///
/// ```no_run
/// use indicatif::ProgressBar;
/// use sortdir::cli::{SortOptions, sort_folder};
///
/// # async fn demo() {
/// let report = sort_folder(&SortOptions::new("/path/to/downloads"), &ProgressBar::hidden()).await;
/// match report {
///     Ok(report) => println!("Moved {} files", report.moved.len()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// # }
/// ```
pub async fn sort_folder(options: &SortOptions, progress: &ProgressBar) -> OrganizeResult<RunReport> {
    let organizer = FileOrganizer::new(&options.root, options.jobs)?;

    let snapshot = organizer.snapshot_entries()?;
    organizer.create_category_folders()?;

    let relocation = organizer.relocate_files(&snapshot, progress).await?;
    let removed_dirs = prune_empty_folders(organizer.root())?;
    let unpacked = unpack_archives(&organizer.root().join(Category::Archives.dir_name()))?;

    Ok(RunReport {
        timestamp: Utc::now(),
        root: organizer.root().to_path_buf(),
        moved: relocation.moved,
        failed: relocation.failed,
        removed_dirs,
        unpacked,
    })
}

/// Runs the CLI with parsed arguments.
pub async fn run_cli(cli: Cli) -> OrganizeResult<()> {
    let options = SortOptions::from(&cli);

    let progress = if cli.json {
        ProgressBar::hidden()
    } else {
        OutputFormatter::info(&format!("Sorting contents of: {}", options.root.display()));
        OutputFormatter::create_spinner("")
    };

    let result = sort_folder(&options, &progress).await;
    progress.finish_and_clear();
    let report = result?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn print_summary(report: &RunReport) {
    if !report.unpacked.is_empty() {
        OutputFormatter::header("Unpacked archives:");
        for archive in &report.unpacked {
            OutputFormatter::success(&format!(
                "{} [{}] -> {}/",
                archive.archive.display(),
                archive.format,
                archive.destination.display()
            ));
        }
    }

    if !report.removed_dirs.is_empty() {
        OutputFormatter::info(&format!(
            "\nRemoved {} empty folder(s).",
            report.removed_dirs.len()
        ));
    }

    OutputFormatter::summary_table(&report.category_counts(), report.moved.len());

    if report.failed.is_empty() {
        OutputFormatter::success("Sorting complete!");
    } else {
        OutputFormatter::warning(&format!(
            "{} file(s) could not be moved. Please review errors above.",
            report.failed.len()
        ));
    }
}
