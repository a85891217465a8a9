//! Removal of directories left empty after sorting.

use crate::file_organizer::{OrganizeError, OrganizeResult};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Removes every empty directory below `root`, deepest first.
///
/// A directory whose only children were empty directories is removed as
/// well, because children are visited before their parent. `root` itself is
/// never removed. Returns the removed paths in removal order.
pub fn prune_empty_folders(root: &Path) -> OrganizeResult<Vec<PathBuf>> {
    let mut removed = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        if is_empty_dir(path)? {
            fs::remove_dir(path).map_err(|source| OrganizeError::RemoveDirFailed {
                path: path.to_path_buf(),
                source,
            })?;
            removed.push(entry.into_path());
        }
    }

    Ok(removed)
}

fn is_empty_dir(path: &Path) -> OrganizeResult<bool> {
    let mut entries = fs::read_dir(path).map_err(|source| OrganizeError::ReadDirFailed {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(entries.next().is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_removes_nested_empty_chain() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("a").join("b").join("c")).expect("Failed to create dirs");

        let removed = prune_empty_folders(root).expect("Failed to prune");

        assert_eq!(removed.len(), 3);
        assert!(!root.join("a").exists());
        assert!(root.exists());
    }

    #[test]
    fn test_keeps_directories_with_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("keep").join("empty")).expect("Failed to create dirs");
        fs::write(root.join("keep").join("file.txt"), "x").expect("Failed to write file");

        let removed = prune_empty_folders(root).expect("Failed to prune");

        assert_eq!(removed, vec![root.join("keep").join("empty")]);
        assert!(root.join("keep").join("file.txt").is_file());
    }

    #[test]
    fn test_empty_root_is_kept() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let removed = prune_empty_folders(temp_dir.path()).expect("Failed to prune");

        assert!(removed.is_empty());
        assert!(temp_dir.path().is_dir());
    }
}
