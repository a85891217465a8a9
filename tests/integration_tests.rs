/// Integration tests for sortdir
///
/// These tests run the complete pipeline against temporary folders and check
/// the resulting layout on disk.
///
/// Test categories:
/// 1. End-to-end sorting
/// 2. Name normalization on disk
/// 3. Move failures
/// 4. Archive unpacking
/// 5. Command-line behavior
use assert_cmd::Command;
use indicatif::ProgressBar;
use predicates::prelude::*;
use sortdir::cli::{SortOptions, sort_folder};
use sortdir::{FileOrganizer, OrganizeError};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary root folder with helpers to build and inspect a tree.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        TestFixture { temp_dir }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a file (and any missing parent folders) with text content.
    fn create_text_file(&self, rel_path: &str, content: &str) {
        let file_path = self.path().join(rel_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, content).expect("Failed to write file");
    }

    fn create_subdir(&self, rel_path: &str) {
        fs::create_dir_all(self.path().join(rel_path)).expect("Failed to create subdirectory");
    }

    /// Create a zip archive containing the given text entries.
    fn create_zip(&self, rel_path: &str, entries: &[(&str, &str)]) {
        let file = File::create(self.path().join(rel_path)).expect("Failed to create zip");
        let mut writer = zip::ZipWriter::new(file);
        for (name, content) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("Failed to start zip entry");
            writer
                .write_all(content.as_bytes())
                .expect("Failed to write zip entry");
        }
        writer.finish().expect("Failed to finish zip");
    }

    fn options(&self) -> SortOptions {
        SortOptions::new(self.path())
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(path.is_file(), "File should exist: {}", path.display());
    }

    fn assert_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "Path should not exist: {}", path.display());
    }

    fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.path().join(rel_path)).expect("Failed to read file")
    }

    /// Top-level entry names, sorted.
    fn top_level(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path())
            .expect("Failed to read directory")
            .flatten()
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    fn list_files_recursive(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        Self::walk_dir(self.path(), &mut files);
        files.sort();
        files
    }

    fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    Self::walk_dir(&path, files);
                } else {
                    files.push(path);
                }
            }
        }
    }
}

// ============================================================================
// Test Suite 1: End-to-end sorting
// ============================================================================

#[tokio::test]
async fn test_sort_mixed_folder() {
    let fixture = TestFixture::new();
    fixture.create_text_file("photo.jpg", "jpeg bytes");
    fixture.create_text_file("notes.TXT", "some notes");
    fixture.create_zip("archive.zip", &[("inner.txt", "inner content")]);
    fixture.create_subdir("empty_dir");

    let report = sort_folder(&fixture.options(), &ProgressBar::hidden())
        .await
        .expect("Sorting should succeed");

    fixture.assert_file_exists("images/photo.jpg");
    fixture.assert_file_exists("documents/notes.TXT");
    fixture.assert_file_exists("archives/archive/inner.txt");
    fixture.assert_not_exists("archive.zip");
    fixture.assert_not_exists("archives/archive.zip");
    fixture.assert_not_exists("empty_dir");
    assert_eq!(fixture.read("archives/archive/inner.txt"), "inner content");

    assert_eq!(report.moved.len(), 3);
    assert!(report.failed.is_empty());
    assert_eq!(report.unpacked.len(), 1);
}

#[tokio::test]
async fn test_unknown_extension_goes_to_other() {
    let fixture = TestFixture::new();
    fixture.create_text_file("file.xyz", "?");

    sort_folder(&fixture.options(), &ProgressBar::hidden())
        .await
        .expect("Sorting should succeed");

    fixture.assert_file_exists("other/file.xyz");
    fixture.assert_not_exists("file.xyz");
}

#[tokio::test]
async fn test_files_without_extension_go_to_other() {
    let fixture = TestFixture::new();
    fixture.create_text_file("Makefile", "all:");
    fixture.create_text_file(".hidden", "dot");

    sort_folder(&fixture.options(), &ProgressBar::hidden())
        .await
        .expect("Sorting should succeed");

    fixture.assert_file_exists("other/Makefile");
    fixture.assert_file_exists("other/.hidden");
}

#[tokio::test]
async fn test_nested_tree_is_flattened_and_pruned() {
    let fixture = TestFixture::new();
    fixture.create_text_file("a/b/c/deep.mp3", "audio");
    fixture.create_text_file("a/clip.mp4", "video");
    fixture.create_text_file("x/y/report.pdf", "pdf");
    fixture.create_subdir("x/y/z/empty");

    sort_folder(&fixture.options(), &ProgressBar::hidden())
        .await
        .expect("Sorting should succeed");

    fixture.assert_file_exists("audio/deep.mp3");
    fixture.assert_file_exists("video/clip.mp4");
    fixture.assert_file_exists("documents/report.pdf");
    fixture.assert_not_exists("a");
    fixture.assert_not_exists("x");
    assert_eq!(fixture.top_level(), vec!["audio", "documents", "video"]);
}

#[tokio::test]
async fn test_every_file_lands_in_one_category_folder() {
    let fixture = TestFixture::new();
    let names = [
        "a.jpeg", "b.png", "c.svg", "d.avi", "e.mov", "f.docx", "g.xlsx", "h.wav", "i.amr",
        "j.tex", "k.bin",
    ];
    for name in names {
        fixture.create_text_file(&format!("nested/{name}"), name);
    }

    let report = sort_folder(&fixture.options(), &ProgressBar::hidden())
        .await
        .expect("Sorting should succeed");

    assert_eq!(report.moved.len(), names.len());
    let files = fixture.list_files_recursive();
    assert_eq!(files.len(), names.len());
    for file in files {
        let relative = file.strip_prefix(fixture.path()).expect("inside root");
        assert_eq!(relative.components().count(), 2, "{}", relative.display());
    }
}

#[tokio::test]
async fn test_sort_preserves_file_content() {
    let fixture = TestFixture::new();
    let content = "Important document content that must not be lost.";
    fixture.create_text_file("sub/important.pdf", content);

    sort_folder(&fixture.options(), &ProgressBar::hidden())
        .await
        .expect("Sorting should succeed");

    assert_eq!(fixture.read("documents/important.pdf"), content);
}

#[tokio::test]
async fn test_second_run_fails_on_existing_category_folder() {
    let fixture = TestFixture::new();
    fixture.create_text_file("photo.jpg", "x");

    sort_folder(&fixture.options(), &ProgressBar::hidden())
        .await
        .expect("First run should succeed");

    let result = sort_folder(&fixture.options(), &ProgressBar::hidden()).await;

    match result {
        Err(OrganizeError::DirectoryCreationFailed { path, source }) => {
            assert!(path.ends_with("images"));
            assert_eq!(source.kind(), std::io::ErrorKind::AlreadyExists);
        }
        other => panic!("expected DirectoryCreationFailed, got {other:?}"),
    }
    fixture.assert_file_exists("images/photo.jpg");
}

#[tokio::test]
async fn test_sort_with_single_job() {
    let fixture = TestFixture::new();
    for i in 0..20 {
        fixture.create_text_file(&format!("batch/file_{i}.txt"), "x");
    }

    let mut options = fixture.options();
    options.jobs = 1;
    let report = sort_folder(&options, &ProgressBar::hidden())
        .await
        .expect("Sorting should succeed");

    assert_eq!(report.moved.len(), 20);
    for i in 0..20 {
        fixture.assert_file_exists(&format!("documents/file_{i}.txt"));
    }
}

#[tokio::test]
async fn test_missing_root_is_rejected() {
    let fixture = TestFixture::new();
    let options = SortOptions::new(fixture.path().join("does_not_exist"));

    let result = sort_folder(&options, &ProgressBar::hidden()).await;

    assert!(matches!(result, Err(OrganizeError::InvalidRoot { .. })));
}

// ============================================================================
// Test Suite 2: Name normalization on disk
// ============================================================================

#[tokio::test]
async fn test_cyrillic_names_are_normalized() {
    let fixture = TestFixture::new();
    fixture.create_text_file("Фото з відпустки.jpg", "x");
    fixture.create_text_file("звіт (фінал).docx", "y");

    sort_folder(&fixture.options(), &ProgressBar::hidden())
        .await
        .expect("Sorting should succeed");

    fixture.assert_file_exists("images/Foto_z_vidpustki.jpg");
    fixture.assert_file_exists("documents/zvit__final_.docx");
}

#[tokio::test]
async fn test_unknown_files_keep_their_name() {
    let fixture = TestFixture::new();
    fixture.create_text_file("дані (копія).dat", "x");

    sort_folder(&fixture.options(), &ProgressBar::hidden())
        .await
        .expect("Sorting should succeed");

    fixture.assert_file_exists("other/дані (копія).dat");
}

// ============================================================================
// Test Suite 3: Move failures
// ============================================================================

#[tokio::test]
async fn test_collision_is_reported_and_others_still_move() {
    let fixture = TestFixture::new();
    fixture.create_text_file("one/same.txt", "first");
    fixture.create_text_file("two/same.txt", "second");
    fixture.create_text_file("three/picture.png", "png");
    fixture.create_text_file("four/tune.ogg", "ogg");

    let report = sort_folder(&fixture.options(), &ProgressBar::hidden())
        .await
        .expect("Move failures should not abort the run");

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.moved.len(), 3);
    fixture.assert_file_exists("documents/same.txt");
    fixture.assert_file_exists("images/picture.png");
    fixture.assert_file_exists("audio/tune.ogg");
    assert_eq!(fixture.read("documents/same.txt"), "first");
    fixture.assert_file_exists("two/same.txt");
}

#[tokio::test]
async fn test_failed_move_does_not_stop_processing() {
    let fixture = TestFixture::new();
    fixture.create_text_file("photo.jpg", "x");
    fixture.create_text_file("notes.txt", "y");
    fixture.create_text_file("song.mp3", "z");

    let organizer = FileOrganizer::new(fixture.path(), 2).expect("valid root");
    let snapshot = organizer.snapshot_entries().expect("snapshot");
    organizer
        .create_category_folders()
        .expect("Failed to create category folders");

    // Every rename into documents/ now fails with NotFound.
    fs::remove_dir(fixture.path().join("documents")).expect("Failed to remove documents");

    let report = organizer
        .relocate_files(&snapshot, &ProgressBar::hidden())
        .await
        .expect("Move failures should not abort the run");

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].path, fixture.path().join("notes.txt"));
    assert_eq!(report.moved.len(), 2);
    fixture.assert_file_exists("notes.txt");
    fixture.assert_file_exists("images/photo.jpg");
    fixture.assert_file_exists("audio/song.mp3");
}

// ============================================================================
// Test Suite 4: Archive unpacking
// ============================================================================

#[tokio::test]
async fn test_archive_folder_truncates_at_first_dot() {
    let fixture = TestFixture::new();
    fixture.create_zip("my.backup.zip", &[("data.txt", "backup")]);

    sort_folder(&fixture.options(), &ProgressBar::hidden())
        .await
        .expect("Sorting should succeed");

    fixture.assert_file_exists("archives/my/data.txt");
    fixture.assert_not_exists("archives/my.backup");
    fixture.assert_not_exists("archives/my.backup.zip");
}

#[tokio::test]
async fn test_archive_with_empty_normalized_stem_is_unpacked() {
    let fixture = TestFixture::new();
    fixture.create_zip("ъ.zip", &[("hard.txt", "sign")]);
    fixture.create_zip("good.zip", &[("fine.txt", "ok")]);

    let report = sort_folder(&fixture.options(), &ProgressBar::hidden())
        .await
        .expect("Sorting should succeed");

    assert_eq!(report.unpacked.len(), 2);
    fixture.assert_file_exists("archives/zip/hard.txt");
    fixture.assert_file_exists("archives/good/fine.txt");
    fixture.assert_not_exists("archives/.zip");
    fixture.assert_not_exists("archives/good.zip");
}

#[tokio::test]
async fn test_nested_archive_is_unpacked() {
    let fixture = TestFixture::new();
    fixture.create_subdir("downloads/2024");
    fixture.create_zip(
        "downloads/2024/bundle.zip",
        &[("readme.md", "read me"), ("src/main.c", "int main() {}")],
    );

    sort_folder(&fixture.options(), &ProgressBar::hidden())
        .await
        .expect("Sorting should succeed");

    fixture.assert_file_exists("archives/bundle/readme.md");
    fixture.assert_file_exists("archives/bundle/src/main.c");
    fixture.assert_not_exists("downloads");
}

#[tokio::test]
async fn test_unknown_archive_format_is_fatal() {
    let fixture = TestFixture::new();
    fixture.create_text_file("broken.zip", "this is not a zip file");
    fixture.create_text_file("photo.png", "x");

    let result = sort_folder(&fixture.options(), &ProgressBar::hidden()).await;

    assert!(matches!(
        result,
        Err(OrganizeError::UnknownArchiveFormat { .. })
    ));
    fixture.assert_file_exists("images/photo.png");
    fixture.assert_file_exists("archives/broken.zip");
}

// ============================================================================
// Test Suite 5: Command-line behavior
// ============================================================================

#[test]
fn test_cli_requires_root_argument() {
    Command::cargo_bin("sortdir")
        .expect("binary exists")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_reports_invalid_root() {
    let fixture = TestFixture::new();

    Command::cargo_bin("sortdir")
        .expect("binary exists")
        .arg(fixture.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid root folder"));
}

#[test]
fn test_cli_json_report() {
    let fixture = TestFixture::new();
    fixture.create_text_file("photo.jpg", "x");
    fixture.create_text_file("sub/notes.txt", "y");

    let output = Command::cargo_bin("sortdir")
        .expect("binary exists")
        .arg(fixture.path())
        .args(["--jobs", "2", "--json"])
        .output()
        .expect("Failed to run sortdir");

    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(report["moved"].as_array().map(Vec::len), Some(2));
    assert_eq!(report["failed"].as_array().map(Vec::len), Some(0));
    assert!(report["timestamp"].is_string());
    fixture.assert_file_exists("images/photo.jpg");
    fixture.assert_file_exists("documents/notes.txt");
}

#[test]
fn test_cli_prints_summary() {
    let fixture = TestFixture::new();
    fixture.create_text_file("song.wav", "x");

    Command::cargo_bin("sortdir")
        .expect("binary exists")
        .arg(fixture.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("SUMMARY"))
        .stdout(predicate::str::contains("audio"));
}
