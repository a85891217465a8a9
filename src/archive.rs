//! Archive unpacking for the `archives` category folder.
//!
//! Each archive is expanded into a sibling folder named after the part of
//! its file name before the first dot, then deleted. The format is sniffed
//! from the file content, not the extension.

use crate::file_organizer::{OrganizeError, OrganizeResult};
use flate2::read::GzDecoder;
use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Number of leading bytes read to detect a format. Covers the tar magic at
/// offset 257.
const SNIFF_LEN: u64 = 512;

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
    /// A gzip stream that does not wrap a tar archive.
    Gz,
}

impl ArchiveFormat {
    /// Detects the format of the archive at `path` from its content.
    ///
    /// Returns `Ok(None)` when the content matches no supported format.
    pub fn detect(path: &Path) -> OrganizeResult<Option<Self>> {
        let head = read_head(File::open(path).map_err(|e| io_error(path, e))?)
            .map_err(|e| io_error(path, e))?;

        if infer::archive::is_zip(&head) {
            return Ok(Some(Self::Zip));
        }
        if infer::archive::is_tar(&head) {
            return Ok(Some(Self::Tar));
        }
        if infer::archive::is_gz(&head) {
            let decoder = GzDecoder::new(File::open(path).map_err(|e| io_error(path, e))?);
            let inner = read_head(decoder).map_err(|e| extraction_error(path, e))?;
            return Ok(Some(if infer::archive::is_tar(&inner) {
                Self::TarGz
            } else {
                Self::Gz
            }));
        }
        Ok(None)
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArchiveFormat::Zip => "zip",
            ArchiveFormat::Tar => "tar",
            ArchiveFormat::TarGz => "tar.gz",
            ArchiveFormat::Gz => "gz",
        };
        f.write_str(name)
    }
}

/// One archive that was expanded and removed.
#[derive(Debug, Clone, Serialize)]
pub struct UnpackedArchive {
    pub archive: PathBuf,
    pub destination: PathBuf,
    pub format: ArchiveFormat,
}

/// Derives the unpack folder name from an archive file name.
///
/// Leading dots are skipped, then everything from the next dot on is
/// dropped, so `my.backup.zip` unpacks into `my` and `.zip` into `zip`.
/// The result never equals `file_name`, so the folder cannot collide with
/// the archive itself.
///
/// # Examples
///
/// ```
/// use sortdir::archive::archive_folder_name;
///
/// assert_eq!(archive_folder_name("archive.zip"), "archive");
/// assert_eq!(archive_folder_name("my.backup.zip"), "my");
/// assert_eq!(archive_folder_name(".hidden.tar"), "hidden");
/// assert_eq!(archive_folder_name("plain"), "plain_unpacked");
/// ```
pub fn archive_folder_name(file_name: &str) -> String {
    match file_name.trim_start_matches('.').split('.').next() {
        Some(prefix) if prefix == file_name => format!("{prefix}_unpacked"),
        Some(prefix) if !prefix.is_empty() => prefix.to_string(),
        _ => "unpacked".to_string(),
    }
}

/// Unpacks every archive file in `archives_dir`.
///
/// A missing folder means nothing was sorted into it and is not an error.
/// Subdirectories are skipped. The first archive with an unknown format or
/// a failed extraction aborts the loop; archives handled before it stay
/// unpacked.
pub fn unpack_archives(archives_dir: &Path) -> OrganizeResult<Vec<UnpackedArchive>> {
    if !archives_dir.is_dir() {
        return Ok(Vec::new());
    }

    let read_err = |source| OrganizeError::ReadDirFailed {
        path: archives_dir.to_path_buf(),
        source,
    };
    let mut archives = Vec::new();
    for entry in fs::read_dir(archives_dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        if entry.file_type().map_err(read_err)?.is_file() {
            archives.push(entry.path());
        }
    }
    archives.sort();

    let mut unpacked = Vec::with_capacity(archives.len());
    for archive in archives {
        unpacked.push(unpack_archive(&archive, archives_dir)?);
    }
    Ok(unpacked)
}

/// Unpacks a single archive into `parent/<folder name>` and deletes it.
pub fn unpack_archive(archive: &Path, parent: &Path) -> OrganizeResult<UnpackedArchive> {
    let file_name = archive
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let destination = parent.join(archive_folder_name(&file_name));

    let format = ArchiveFormat::detect(archive)?.ok_or_else(|| {
        OrganizeError::UnknownArchiveFormat {
            path: archive.to_path_buf(),
        }
    })?;

    if !destination.exists() {
        fs::create_dir(&destination).map_err(|source| OrganizeError::DirectoryCreationFailed {
            path: destination.clone(),
            source,
        })?;
    }

    match format {
        ArchiveFormat::Zip => extract_zip(archive, &destination)?,
        ArchiveFormat::Tar => {
            let file = File::open(archive).map_err(|e| io_error(archive, e))?;
            tar::Archive::new(file)
                .unpack(&destination)
                .map_err(|e| extraction_error(archive, e))?;
        }
        ArchiveFormat::TarGz => {
            let file = File::open(archive).map_err(|e| io_error(archive, e))?;
            tar::Archive::new(GzDecoder::new(file))
                .unpack(&destination)
                .map_err(|e| extraction_error(archive, e))?;
        }
        ArchiveFormat::Gz => extract_gz(archive, &file_name, &destination)?,
    }

    fs::remove_file(archive).map_err(|e| io_error(archive, e))?;

    Ok(UnpackedArchive {
        archive: archive.to_path_buf(),
        destination,
        format,
    })
}

fn extract_zip(archive: &Path, destination: &Path) -> OrganizeResult<()> {
    let file = File::open(archive).map_err(|e| io_error(archive, e))?;
    let mut reader = zip::ZipArchive::new(file).map_err(|e| extraction_error(archive, e))?;
    reader
        .extract(destination)
        .map_err(|e| extraction_error(archive, e))
}

/// Writes the decompressed stream as the archive name minus its `.gz`.
fn extract_gz(archive: &Path, file_name: &str, destination: &Path) -> OrganizeResult<()> {
    let member = match file_name.strip_suffix(".gz") {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => file_name,
    };
    let target = destination.join(member);

    let file = File::open(archive).map_err(|e| io_error(archive, e))?;
    let mut decoder = GzDecoder::new(file);
    let mut out = File::create(&target).map_err(|e| io_error(&target, e))?;
    io::copy(&mut decoder, &mut out).map_err(|e| extraction_error(archive, e))?;
    Ok(())
}

fn read_head(reader: impl Read) -> io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    reader.take(SNIFF_LEN).read_to_end(&mut head)?;
    Ok(head)
}

fn io_error(path: &Path, source: io::Error) -> OrganizeError {
    OrganizeError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn extraction_error(path: &Path, reason: impl fmt::Display) -> OrganizeError {
    OrganizeError::ArchiveExtractionFailed {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
