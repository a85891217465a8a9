//! sortdir - sort a folder tree into category folders
//!
//! This library normalizes file names, classifies files by extension, moves
//! them into per-category folders under the root, prunes the directories
//! left empty and unpacks archives into folders named after them.

pub mod archive;
pub mod cleanup;
pub mod cli;
pub mod file_category;
pub mod file_organizer;
pub mod normalize;
pub mod output;

pub use archive::{ArchiveFormat, UnpackedArchive, unpack_archives};
pub use cleanup::prune_empty_folders;
pub use cli::{Cli, RunReport, SortOptions, run_cli, sort_folder};
pub use file_category::{Category, FileMapper};
pub use file_organizer::{FileOrganizer, OrganizeError, OrganizeResult};
pub use normalize::{normalize, normalize_file_name};
