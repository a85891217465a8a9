//! File organization: category folders, tree walking and file moves.
//!
//! The root's top-level entries are snapshotted before the category folders
//! are created, and only the snapshot is walked. Files are moved through a
//! bounded pool of `tokio` tasks so that at most `jobs` renames are in flight.

use crate::file_category::{Category, FileMapper};
use crate::normalize::normalize_file_name;
use crate::output::OutputFormatter;
use indicatif::ProgressBar;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use walkdir::WalkDir;

/// Default number of file moves allowed in flight.
pub const DEFAULT_JOBS: usize = 8;

/// Errors that can occur while sorting a folder.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The root path is missing or is not a directory.
    #[error("Invalid root folder {}: {source}", .path.display())]
    InvalidRoot { path: PathBuf, source: io::Error },
    /// Failed to create a category directory (usually because it exists).
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Failed to list a directory.
    #[error("Failed to read directory {}: {source}", .path.display())]
    ReadDirFailed { path: PathBuf, source: io::Error },
    /// The tree walk hit an unreadable entry.
    #[error("Failed to traverse directory tree: {0}")]
    TraversalFailed(#[from] walkdir::Error),
    /// Failed to move a file into its category directory.
    #[error("Failed to move {} to {}: {error}", .path.display(), .destination.display())]
    FileMoveFailure {
        path: PathBuf,
        destination: PathBuf,
        #[source]
        error: io::Error,
    },
    /// Another file already occupies the destination.
    #[error("Failed to move {} to {}: destination already exists", .path.display(), .destination.display())]
    DestinationExists { path: PathBuf, destination: PathBuf },
    /// Failed to remove a directory during pruning.
    #[error("Failed to remove directory {}: {source}", .path.display())]
    RemoveDirFailed { path: PathBuf, source: io::Error },
    /// The archive content matches no supported format.
    #[error("Unknown archive format: {}", .path.display())]
    UnknownArchiveFormat { path: PathBuf },
    /// A recognized archive could not be extracted.
    #[error("Failed to unpack {}: {reason}", .path.display())]
    ArchiveExtractionFailed { path: PathBuf, reason: String },
    /// Any other I/O failure on a specific path.
    #[error("I/O error on {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    /// A move task panicked or was cancelled.
    #[error("File move task failed: {0}")]
    MoveTask(#[from] JoinError),
    /// The run report could not be rendered as JSON.
    #[error("Failed to render report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// A single completed move.
#[derive(Debug, Clone, Serialize)]
pub struct Operation {
    /// The path of the file before sorting.
    pub original_path: PathBuf,
    /// The path of the file after sorting.
    pub new_path: PathBuf,
    /// The category the file was moved to.
    pub category: Category,
}

/// A move that was skipped because it failed.
#[derive(Debug, Clone, Serialize)]
pub struct FailedMove {
    /// The file that stayed in place.
    pub path: PathBuf,
    /// Why the move failed.
    pub reason: String,
}

/// Outcome of the move phase.
#[derive(Debug, Default, Serialize)]
pub struct RelocationReport {
    pub moved: Vec<Operation>,
    pub failed: Vec<FailedMove>,
}

/// Where a file is going, computed before any I/O happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub category: Category,
}

impl PlannedMove {
    /// Computes the destination of `file_path` under `root`.
    ///
    /// Files with a known category get a normalized name; files classified
    /// as `other` keep their name as-is.
    pub fn for_file(root: &Path, file_path: &Path) -> OrganizeResult<Self> {
        let category = FileMapper::global().category_for_path(file_path);
        let file_name = file_path
            .file_name()
            .ok_or_else(|| OrganizeError::FileMoveFailure {
                path: file_path.to_path_buf(),
                destination: root.join(category.dir_name()),
                error: io::Error::new(io::ErrorKind::InvalidInput, "file has no name component"),
            })?;

        let category_path = root.join(category.dir_name());
        let destination = match category {
            Category::Other => category_path.join(file_name),
            _ => category_path.join(normalize_file_name(&file_name.to_string_lossy())),
        };

        Ok(Self {
            source: file_path.to_path_buf(),
            destination,
            category,
        })
    }

    /// Performs the rename. Refuses to overwrite an existing destination.
    pub async fn execute(self) -> OrganizeResult<Operation> {
        if tokio::fs::symlink_metadata(&self.destination).await.is_ok() {
            return Err(OrganizeError::DestinationExists {
                path: self.source,
                destination: self.destination,
            });
        }

        let moved = match tokio::fs::rename(&self.source, &self.destination).await {
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                move_across_devices(&self.source, &self.destination).await
            }
            other => other,
        };
        if let Err(error) = moved {
            return Err(OrganizeError::FileMoveFailure {
                path: self.source,
                destination: self.destination,
                error,
            });
        }

        Ok(Operation {
            original_path: self.source,
            new_path: self.destination,
            category: self.category,
        })
    }
}

/// Copies `source` to `destination`, then removes `source`.
///
/// Used when a rename crosses a mount point. A partial copy is removed
/// again so the file only ever exists at one of the two paths.
async fn move_across_devices(source: &Path, destination: &Path) -> io::Result<()> {
    if let Err(e) = tokio::fs::copy(source, destination).await {
        let _ = tokio::fs::remove_file(destination).await;
        return Err(e);
    }
    tokio::fs::remove_file(source).await
}

/// Sorts the contents of a root folder into category directories.
pub struct FileOrganizer {
    root: PathBuf,
    jobs: usize,
}

impl FileOrganizer {
    /// Creates an organizer for `root`, allowing `jobs` moves in flight.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::InvalidRoot` if `root` is not an existing directory.
    pub fn new(root: impl Into<PathBuf>, jobs: usize) -> OrganizeResult<Self> {
        let root = root.into();
        match fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(OrganizeError::InvalidRoot {
                    path: root,
                    source: io::Error::other("not a directory"),
                });
            }
            Err(source) => return Err(OrganizeError::InvalidRoot { path: root, source }),
        }

        Ok(Self {
            root,
            jobs: jobs.max(1),
        })
    }

    /// The folder being sorted.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maximum number of moves in flight, never less than 1.
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Lists the root's top-level entries. Must be taken before the category
    /// folders exist so that they are never walked.
    pub fn snapshot_entries(&self) -> OrganizeResult<Vec<PathBuf>> {
        let read_err = |source| OrganizeError::ReadDirFailed {
            path: self.root.clone(),
            source,
        };

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(read_err)? {
            entries.push(entry.map_err(read_err)?.path());
        }
        entries.sort();
        Ok(entries)
    }

    /// Creates one folder per category directly under the root.
    ///
    /// # Errors
    ///
    /// Fails on the first folder that already exists or cannot be created.
    pub fn create_category_folders(&self) -> OrganizeResult<()> {
        for category in Category::ALL {
            let path = self.root.join(category.dir_name());
            fs::create_dir(&path)
                .map_err(|source| OrganizeError::DirectoryCreationFailed { path, source })?;
        }
        Ok(())
    }

    /// Walks every snapshot entry depth-first and moves each file found into
    /// its category folder.
    ///
    /// Individual move failures are reported through `progress` and recorded
    /// in the returned report; the walk carries on. Traversal errors abort
    /// the whole phase.
    pub async fn relocate_files(
        &self,
        snapshot: &[PathBuf],
        progress: &ProgressBar,
    ) -> OrganizeResult<RelocationReport> {
        let mut report = RelocationReport::default();
        let mut claimed: HashSet<PathBuf> = HashSet::new();
        let mut moves: JoinSet<MoveOutcome> = JoinSet::new();

        for entry in snapshot {
            for item in WalkDir::new(entry).follow_root_links(false) {
                let item = item?;
                if item.file_type().is_dir() {
                    continue;
                }

                let plan = match PlannedMove::for_file(&self.root, item.path()) {
                    Ok(plan) => plan,
                    Err(e) => {
                        record_failure(&mut report, item.into_path(), &e, progress);
                        continue;
                    }
                };

                while moves.len() >= self.jobs {
                    match moves.join_next().await {
                        Some(joined) => {
                            record_outcome(&mut report, &mut claimed, joined?, progress)
                        }
                        None => break,
                    }
                }

                // Two sources can normalize to the same destination.
                if !claimed.insert(plan.destination.clone()) {
                    let e = OrganizeError::DestinationExists {
                        path: plan.source.clone(),
                        destination: plan.destination,
                    };
                    record_failure(&mut report, plan.source, &e, progress);
                    continue;
                }

                moves.spawn(async move {
                    let source = plan.source.clone();
                    let destination = plan.destination.clone();
                    MoveOutcome {
                        source,
                        destination,
                        result: plan.execute().await,
                    }
                });
            }
        }

        while let Some(joined) = moves.join_next().await {
            record_outcome(&mut report, &mut claimed, joined?, progress);
        }

        Ok(report)
    }
}

/// What a spawned move task hands back to the walk loop.
struct MoveOutcome {
    source: PathBuf,
    destination: PathBuf,
    result: OrganizeResult<Operation>,
}

/// Records a finished move. A failed move frees its destination so a later
/// file may still take that name.
fn record_outcome(
    report: &mut RelocationReport,
    claimed: &mut HashSet<PathBuf>,
    outcome: MoveOutcome,
    progress: &ProgressBar,
) {
    match outcome.result {
        Ok(operation) => {
            progress.inc(1);
            progress.set_message(format!("-> {}/", operation.category));
            report.moved.push(operation);
        }
        Err(e) => {
            if !matches!(e, OrganizeError::DestinationExists { .. }) {
                claimed.remove(&outcome.destination);
            }
            record_failure(report, outcome.source, &e, progress);
        }
    }
}

fn record_failure(
    report: &mut RelocationReport,
    path: PathBuf,
    error: &OrganizeError,
    progress: &ProgressBar,
) {
    progress.suspend(|| OutputFormatter::error(&error.to_string()));
    report.failed.push(FailedMove {
        path,
        reason: error.to_string(),
    });
}
